//! 持久化协议（persist）
//!
//! 定义发放结果与失败登记两类仓储的窄接口：
//! - `CouponRepository`：`create` 创建发放单元（可能失败），`count` 仅供外部核对；
//! - `FailedEventRepository`：登记持久化失败，供补偿任务读取。
//!
//! 内存实现用于测试与本地运行；Postgres 实现位于 `infra-sqlx` 特性之后。
//!
mod coupon_repository;
mod failed_event_repository;
mod inmemory;
#[cfg(feature = "infra-sqlx")]
pub mod pg;

pub use coupon_repository::CouponRepository;
pub use failed_event_repository::FailedEventRepository;
pub use inmemory::{InMemoryCouponRepository, InMemoryFailedEventRepository};
