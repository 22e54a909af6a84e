//! 事件处理器（EventHandler）
//!
//! 定义消费某个 topic 记录的处理逻辑与元信息（名称、订阅 topic）。
//! 返回 `Ok` 表示该记录可以提交位点；返回 `Err` 表示处理器遇到无法就地恢复的错误，
//! 引擎将停止对应的工作者且不提交位点。
//!
use super::log::LogRecord;
use crate::error::DomainResult as Result;
use async_trait::async_trait;

#[async_trait]
pub trait EventHandler: Send + Sync {
    /// 处理器名称（用于日志与审计）
    fn handler_name(&self) -> &str;
    /// 订阅的 topic
    fn topic(&self) -> &str;
    /// 处理一条记录
    async fn handle(&self, record: &LogRecord) -> Result<()>;
}
