//! 事件子系统（eventing）
//!
//! 发放链路的异步部分：
//! - `EventLog`：分区、只追加、可复制的持久日志协议，消费组按分区提交位点；
//! - `EventPublisher`：把获准的请求追加到日志，拿到确认即返回调用方；
//! - `EventHandler`：对日志记录的消费处理；
//! - `IssuanceConsumer`：持久化发放单元，失败时交给 `FailureRecorder`；
//! - `ConsumerEngine`：按分区调度的消费工作池，至少一次投递。
//!
//! 协议不绑定具体传输实现；`InMemoryEventLog` 与 `ConsumerEngine` 位于 `eventing` 特性之后。
//!
pub mod consumer;
#[cfg(feature = "eventing")]
pub mod engine;
pub mod handler;
pub mod log;
#[cfg(feature = "eventing")]
pub mod log_inmemory;
pub mod publisher;
pub mod recorder;

pub use consumer::{ConsumeOutcome, IssuanceConsumer};
#[cfg(feature = "eventing")]
pub use engine::{ConsumerConfig, ConsumerEngine, EngineHandle};
pub use handler::EventHandler;
pub use log::{EventLog, LogRecord, RecordAck, partition_for};
#[cfg(feature = "eventing")]
pub use log_inmemory::InMemoryEventLog;
pub use publisher::{DEFAULT_TOPIC, EventPublisher};
pub use recorder::{FailureRecorder, RepositoryFailureRecorder};
