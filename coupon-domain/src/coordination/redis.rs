//! Redis 协调存储（需开启 `infra-redis` 特性）
//!
//! `increment` 对应 `INCR`，`add_to_set` 对应 `SADD`，两者都是服务端单条原子命令，
//! 多个调用方进程共享同一实例即可共享计数器与去重集合。
//! 连接或命令错误统一映射为 `StoreUnavailable`，由调用方按拒绝处理。

use super::CoordinationStore;
use crate::error::{DomainError, DomainResult as Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

#[derive(Clone)]
pub struct RedisCoordinationStore {
    connection: MultiplexedConnection,
}

impl RedisCoordinationStore {
    /// 连接 `redis://host:port[/db]`
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(unavailable)?;
        tracing::info!(url, "connected to redis coordination store");
        Ok(Self { connection })
    }
}

fn unavailable(err: redis::RedisError) -> DomainError {
    DomainError::store_unavailable(err.to_string())
}

#[async_trait]
impl CoordinationStore for RedisCoordinationStore {
    async fn increment(&self, key: &str) -> Result<i64> {
        let mut conn = self.connection.clone();
        let value: i64 = redis::cmd("INCR")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(value)
    }

    async fn add_to_set(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.connection.clone();
        let added: i64 = redis::cmd("SADD")
            .arg(key)
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(added == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_url_is_store_unavailable() {
        let err = RedisCoordinationStore::connect("not a url")
            .await
            .err()
            .expect("malformed url must fail");
        assert!(matches!(err, DomainError::StoreUnavailable { .. }));
    }

    #[tokio::test]
    async fn refused_connection_is_store_unavailable() {
        // 端口 1 上没有 redis 服务
        let err = RedisCoordinationStore::connect("redis://127.0.0.1:1/")
            .await
            .err()
            .expect("connection must be refused");
        assert!(matches!(err, DomainError::StoreUnavailable { .. }));
    }
}
