//! 内存版协调存储（InMemoryCoordinationStore）
//!
//! 基于 `DashMap` 的分片锁实现原子原语：`entry` 持有分片写锁完成读改写，
//! 并发调用在同一键上被串行化。典型用途：测试环境、示例与本地开发。

use super::CoordinationStore;
use crate::error::DomainResult as Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct InMemoryCoordinationStore {
    counters: DashMap<String, i64>,
    sets: DashMap<String, HashSet<String>>,
}

impl InMemoryCoordinationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取计数器当前值（仅用于核对，不参与准入判断）
    pub fn counter(&self, key: &str) -> i64 {
        self.counters.get(key).map(|v| *v).unwrap_or(0)
    }

    pub fn set_len(&self, key: &str) -> usize {
        self.sets.get(key).map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl CoordinationStore for InMemoryCoordinationStore {
    async fn increment(&self, key: &str) -> Result<i64> {
        let mut value = self.counters.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn add_to_set(&self, key: &str, member: &str) -> Result<bool> {
        let added = self
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(added)
    }
}
