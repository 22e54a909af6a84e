//! 发放事件发布器（EventPublisher）
//!
//! 把获准的请求以申请者身份为分区键追加到日志，拿到日志的持久化确认即返回，
//! 不等待下游消费与落库；这是调用方延迟与持久化解耦的地方。
//!
use super::log::{EventLog, RecordAck};
use crate::coupon::{IssuanceRequest, OwnerId};
use crate::error::{DomainError, DomainResult as Result};
use std::sync::Arc;

/// 默认发放 topic
pub const DEFAULT_TOPIC: &str = "coupon_create";

#[derive(Clone)]
pub struct EventPublisher {
    log: Arc<dyn EventLog>,
    topic: String,
}

impl EventPublisher {
    pub fn new(log: Arc<dyn EventLog>, topic: impl Into<String>) -> Self {
        Self {
            log,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// 发布失败统一映射为 `PublishFailure`，不在此处重试
    pub async fn publish(&self, owner_id: OwnerId) -> Result<RecordAck> {
        let key = owner_id.to_string();
        let payload = IssuanceRequest::new(owner_id).to_payload()?;

        match self.log.append(&self.topic, &key, payload).await {
            Ok(ack) => {
                tracing::debug!(
                    topic = %ack.topic,
                    partition = ack.partition,
                    offset = ack.offset,
                    %owner_id,
                    "issuance event appended"
                );
                Ok(ack)
            }
            Err(err) => {
                tracing::warn!(topic = %self.topic, %owner_id, error = %err, "publish failed");
                Err(DomainError::PublishFailure {
                    topic: self.topic.clone(),
                    key,
                    reason: err.to_string(),
                })
            }
        }
    }
}

#[cfg(all(test, feature = "eventing"))]
mod tests {
    use super::*;
    use crate::eventing::InMemoryEventLog;
    use crate::eventing::log::{LogRecord, partition_for};
    use async_trait::async_trait;
    use futures_core::stream::BoxStream;
    use serde_json::Value;

    #[tokio::test]
    async fn publish_appends_owner_keyed_record() {
        let log = Arc::new(InMemoryEventLog::new(3));
        let publisher = EventPublisher::new(log.clone(), DEFAULT_TOPIC);

        let ack = publisher.publish(OwnerId::new(17)).await.unwrap();
        assert_eq!(ack.topic, DEFAULT_TOPIC);
        assert_eq!(ack.partition, partition_for("17", 3));
        assert_eq!(ack.offset, 0);

        let records = log.records(DEFAULT_TOPIC);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key(), "17");
        assert_eq!(
            IssuanceRequest::from_payload(records[0].payload()).unwrap(),
            IssuanceRequest::new(OwnerId::new(17))
        );
    }

    struct BrokenLog;

    #[async_trait]
    impl EventLog for BrokenLog {
        fn partitions(&self) -> u32 {
            1
        }
        async fn append(&self, _topic: &str, _key: &str, _payload: Value) -> Result<RecordAck> {
            Err(DomainError::event_log("broker unreachable"))
        }
        async fn subscribe(
            &self,
            _topic: &str,
            _group_id: &str,
            _partition: u32,
        ) -> Result<BoxStream<'static, Result<LogRecord>>> {
            Err(DomainError::event_log("broker unreachable"))
        }
        async fn commit(&self, _: &str, _: &str, _: u32, _: u64) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn broker_errors_become_publish_failure() {
        let publisher = EventPublisher::new(Arc::new(BrokenLog), DEFAULT_TOPIC);
        let err = publisher.publish(OwnerId::new(1)).await.unwrap_err();
        match err {
            DomainError::PublishFailure { topic, key, reason } => {
                assert_eq!(topic, DEFAULT_TOPIC);
                assert_eq!(key, "1");
                assert!(reason.contains("broker unreachable"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
