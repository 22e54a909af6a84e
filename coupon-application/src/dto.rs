use serde::Serialize;

/// 数据传输对象（DTO）
///
/// - 作为应用层的输出载体，面向接口/外部系统序列化友好；
/// - 与领域模型解耦，避免将领域对象直接暴露到接口层。
pub trait Dto: Serialize + Send + Sync + 'static {}

/// 发放核对报表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IssuanceReport {
    /// 已落库的券数
    pub issued: i64,
    /// 已登记的持久化失败数
    pub failed: i64,
}

impl Dto for IssuanceReport {}
