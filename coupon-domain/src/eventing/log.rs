//! 事件日志（EventLog）协议
//!
//! 语义参照 Kafka：每个 topic 固定若干分区，同一 key 总是落到同一分区，
//! 分区内有序；消费组在每个分区上维护已提交位点，重新订阅时从已提交位点继续，
//! 因此未提交的记录会被重投（至少一次）。
//!
use crate::error::DomainResult as Result;
use async_trait::async_trait;
use bon::Builder;
use chrono::{DateTime, Utc};
use futures_core::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
pub struct LogRecord {
    /// 记录唯一标识
    record_id: String,
    topic: String,
    partition: u32,
    /// 分区内位点，从 0 开始
    offset: u64,
    /// 分区键（申请者身份）
    key: String,
    payload: Value,
    appended_at: DateTime<Utc>,
}

impl LogRecord {
    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn partition(&self) -> u32 {
        self.partition
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn appended_at(&self) -> DateTime<Utc> {
        self.appended_at
    }

    pub fn ack(&self) -> RecordAck {
        RecordAck {
            topic: self.topic.clone(),
            partition: self.partition,
            offset: self.offset,
        }
    }
}

/// 日志对一次追加的持久化确认
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordAck {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
}

/// 分区选择：`crc32(key) % partitions`
///
/// CRC32 与进程和编译器版本无关，因此同一 key 在同一分区数下跨进程、跨构建都落到同一分区。
pub fn partition_for(key: &str, partitions: u32) -> u32 {
    crc32fast::hash(key.as_bytes()) % partitions.max(1)
}

/// 分区、只追加的持久日志
#[async_trait]
pub trait EventLog: Send + Sync {
    /// 每个 topic 的分区数
    fn partitions(&self) -> u32;

    /// 追加一条记录；返回即代表日志已确认持久化
    async fn append(&self, topic: &str, key: &str, payload: Value) -> Result<RecordAck>;

    /// 以消费组身份订阅某个分区，从该组已提交位点开始，返回 'static 生命周期的记录流
    async fn subscribe(
        &self,
        topic: &str,
        group_id: &str,
        partition: u32,
    ) -> Result<BoxStream<'static, Result<LogRecord>>>;

    /// 提交位点：`next_offset` 为下一条待消费记录的位点
    async fn commit(&self, topic: &str, group_id: &str, partition: u32, next_offset: u64)
    -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_always_maps_to_same_partition() {
        for key in ["0", "1", "42", "999"] {
            let p = partition_for(key, 8);
            assert!(p < 8);
            assert_eq!(partition_for(key, 8), p);
        }
    }

    #[test]
    fn partition_mapping_is_pinned_to_crc32() {
        // crc32("42") = 841265288, crc32("1") = 2212294583
        assert_eq!(partition_for("42", 4), 0);
        assert_eq!(partition_for("1", 4), 3);
        assert_eq!(partition_for("1", 8), 7);
        assert_eq!(partition_for("17", 4), 2);
    }

    #[test]
    fn zero_partitions_collapse_to_partition_zero() {
        assert_eq!(partition_for("7", 0), 0);
        assert_eq!(partition_for("7", 1), 0);
    }

    #[test]
    fn keys_spread_over_partitions() {
        let used: std::collections::HashSet<u32> =
            (0..1000).map(|i| partition_for(&i.to_string(), 4)).collect();
        assert_eq!(used.len(), 4);
    }
}
