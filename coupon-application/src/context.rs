/// 应用层上下文（Application Context）
///
/// 承载一次应用层调用（命令/查询）所需的横切信息：
/// - 关联追踪 `correlation_id`：贯穿调用方日志与发布事件的日志；
/// - 执行者 `actor_id`：入口层解析出的调用主体，仅用于审计日志。
///
/// 典型用法：
/// ```rust
/// use coupon_application::context::AppContext;
///
/// let ctx = AppContext::new().with_actor("gateway");
/// assert!(ctx.correlation_id.is_some());
/// assert_eq!(ctx.actor_id.as_deref(), Some("gateway"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct AppContext {
    /// 关联 ID（可选）：为空时日志中不携带
    pub correlation_id: Option<String>,
    /// 执行者（可选）
    pub actor_id: Option<String>,
}

impl AppContext {
    /// 生成带随机关联 ID 的上下文
    pub fn new() -> Self {
        Self {
            correlation_id: Some(uuid::Uuid::new_v4().to_string()),
            actor_id: None,
        }
    }

    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }
}
