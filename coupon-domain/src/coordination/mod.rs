//! 协调存储（coordination）
//!
//! 发放链路上所有跨请求的协调都委托给外部协调服务的原子原语：
//! - `increment`：对固定键的计数器做原子自增并返回自增后的值；
//! - `add_to_set`：对固定键的集合做原子“不存在则加入”，返回是否为本次新加入。
//!
//! 两个原语都必须是单次不可分割的远端操作，调用方不得先读后写。
//!
mod inmemory;
#[cfg(feature = "infra-redis")]
pub mod redis;

pub use inmemory::InMemoryCoordinationStore;
#[cfg(feature = "infra-redis")]
pub use self::redis::RedisCoordinationStore;

use crate::error::DomainResult as Result;
use async_trait::async_trait;

/// 外部原子协调服务（如 Redis 的 INCR / SADD）
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// 原子自增，返回自增后的值
    async fn increment(&self, key: &str) -> Result<i64>;

    /// 原子加入集合，`true` 表示本次调用新加入了该成员
    async fn add_to_set(&self, key: &str, member: &str) -> Result<bool>;
}
