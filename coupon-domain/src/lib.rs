//! 优惠券发放领域核心（coupon-domain）
//!
//! 在大量并发申请者之间发放严格限量的资源（优惠券），保证：
//! - 全局发放总量不超过配额（`allocation`：协调存储上的原子计数闸门）；
//! - 每个申请者至多发放一次（`dedup`：协调存储上的原子集合守卫）；
//! - 请求延迟与持久化解耦（`eventing`：发布 → 异步落库 → 失败登记）。
//!
//! 本 crate 只定义协议与组件，外部协调服务、事件日志与关系存储均通过 trait 注入：
//! `CoordinationStore`、`EventLog`、`CouponRepository`、`FailedEventRepository`。
//! 内存实现用于测试与本地运行；Postgres 仓储位于 `infra-sqlx` 特性之后。
//!
//! 典型用法：
//! 1. 构造 `DedupGuard`、`AllocationGate` 与 `EventPublisher`，在调用方路径上依次调用；
//! 2. 用 `IssuanceConsumer` 与 `ConsumerEngine` 启动消费工作池；
//! 3. 消费端持久化失败由 `FailureRecorder` 登记，供外部补偿。
//!
pub mod allocation;
pub mod coordination;
pub mod coupon;
pub mod dedup;
pub mod error;
pub mod eventing;
pub mod persist;
pub mod state;

pub use allocation::{AllocationGate, Reservation};
pub use coupon::{Coupon, FailedEvent, IssuanceRequest, OwnerId};
pub use dedup::DedupGuard;
pub use error::{DomainError, DomainResult};
pub use state::IssuanceState;
