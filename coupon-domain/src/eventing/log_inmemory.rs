//! 内存版事件日志（InMemoryEventLog）
//!
//! 每个分区是一个只追加的 `Vec<LogRecord>`，高水位通过 `tokio::sync::watch` 通知订阅者：
//! - `append`：按 key 选择分区并追加，返回位点确认；
//! - `subscribe`：从消费组已提交位点开始返回 `'static` 记录流，追平后等待新记录；
//! - `commit`：位点只前进不后退。
//!
//! 典型用途：测试环境、示例与本地开发。进程退出即丢失，不具备真正的持久性。

use super::log::{EventLog, LogRecord, RecordAck, partition_for};
use crate::error::{DomainError, DomainResult as Result};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use futures_core::stream::BoxStream;
use futures_util::stream;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;

struct Partition {
    records: RwLock<Vec<LogRecord>>,
    high_watermark: watch::Sender<u64>,
    committed: DashMap<String, u64>,
}

impl Partition {
    fn new() -> Self {
        let (high_watermark, _rx) = watch::channel(0);
        Self {
            records: RwLock::new(Vec::new()),
            high_watermark,
            committed: DashMap::new(),
        }
    }

    fn get(&self, offset: u64) -> Option<LogRecord> {
        let records = self.records.read().ok()?;
        records.get(offset as usize).cloned()
    }

    fn len(&self) -> u64 {
        *self.high_watermark.borrow()
    }

    fn committed(&self, group_id: &str) -> u64 {
        self.committed.get(group_id).map(|o| *o).unwrap_or(0)
    }
}

struct Topic {
    partitions: Vec<Arc<Partition>>,
}

/// 简单的内存分区日志实现
pub struct InMemoryEventLog {
    partitions: u32,
    topics: DashMap<String, Arc<Topic>>,
}

impl InMemoryEventLog {
    /// 创建内存日志，`partitions` 为每个 topic 的分区数（至少为 1）
    pub fn new(partitions: u32) -> Self {
        Self {
            partitions: partitions.max(1),
            topics: DashMap::new(),
        }
    }

    fn topic(&self, name: &str) -> Arc<Topic> {
        self.topics
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(Topic {
                    partitions: (0..self.partitions)
                        .map(|_| Arc::new(Partition::new()))
                        .collect(),
                })
            })
            .clone()
    }

    fn partition(&self, topic: &str, partition: u32) -> Result<Arc<Partition>> {
        self.topic(topic)
            .partitions
            .get(partition as usize)
            .cloned()
            .ok_or_else(|| {
                DomainError::event_log(format!(
                    "unknown partition {partition} for topic {topic} (partitions={})",
                    self.partitions
                ))
            })
    }

    /// 按分区、位点顺序返回 topic 的全部记录（仅用于核对）
    pub fn records(&self, topic: &str) -> Vec<LogRecord> {
        let Some(t) = self.topics.get(topic).map(|t| t.clone()) else {
            return Vec::new();
        };
        t.partitions
            .iter()
            .flat_map(|p| p.records.read().map(|r| r.clone()).unwrap_or_default())
            .collect()
    }

    /// 消费组在 topic 上尚未提交的记录数
    pub fn lag(&self, topic: &str, group_id: &str) -> u64 {
        let Some(t) = self.topics.get(topic).map(|t| t.clone()) else {
            return 0;
        };
        t.partitions
            .iter()
            .map(|p| p.len().saturating_sub(p.committed(group_id)))
            .sum()
    }

    pub fn committed(&self, topic: &str, group_id: &str, partition: u32) -> u64 {
        self.topics
            .get(topic)
            .and_then(|t| t.partitions.get(partition as usize).cloned())
            .map(|p| p.committed(group_id))
            .unwrap_or(0)
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    fn partitions(&self) -> u32 {
        self.partitions
    }

    async fn append(&self, topic: &str, key: &str, payload: Value) -> Result<RecordAck> {
        let index = partition_for(key, self.partitions);
        let partition = self.partition(topic, index)?;

        let mut records = partition
            .records
            .write()
            .map_err(|e| DomainError::event_log(e.to_string()))?;
        let offset = records.len() as u64;
        let record = LogRecord::builder()
            .record_id(uuid::Uuid::new_v4().to_string())
            .topic(topic.to_string())
            .partition(index)
            .offset(offset)
            .key(key.to_string())
            .payload(payload)
            .appended_at(Utc::now())
            .build();
        let ack = record.ack();
        records.push(record);
        // 持有写锁时推进高水位，保证水位与记录一致且单调
        partition.high_watermark.send_modify(|hw| *hw = offset + 1);

        Ok(ack)
    }

    async fn subscribe(
        &self,
        topic: &str,
        group_id: &str,
        partition: u32,
    ) -> Result<BoxStream<'static, Result<LogRecord>>> {
        let part = self.partition(topic, partition)?;
        let start = part.committed(group_id);
        let rx = part.high_watermark.subscribe();

        let records = stream::unfold((part, rx, start), |(part, mut rx, offset)| async move {
            if rx.wait_for(|hw| *hw > offset).await.is_err() {
                return None;
            }
            let item = part.get(offset).ok_or_else(|| {
                DomainError::event_log(format!("record at offset {offset} vanished"))
            });
            Some((item, (part, rx, offset + 1)))
        });

        Ok(Box::pin(records))
    }

    async fn commit(
        &self,
        topic: &str,
        group_id: &str,
        partition: u32,
        next_offset: u64,
    ) -> Result<()> {
        let part = self.partition(topic, partition)?;
        part.committed
            .entry(group_id.to_string())
            .and_modify(|o| *o = (*o).max(next_offset))
            .or_insert(next_offset);
        Ok(())
    }
}
