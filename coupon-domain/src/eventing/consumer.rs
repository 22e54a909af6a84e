//! 发放消费者（IssuanceConsumer）
//!
//! 对每条投递到的记录：为 `owner_id` 持久化一张券。
//! - 成功：`Issued`；
//! - 唯一约束命中（重投后的重复落库）：`AlreadyIssued`，视为已完成；
//! - 其他持久化失败：交给 `FailureRecorder` 登记后仍视为已处理（`FailedRecorded`），
//!   单条失败不阻塞分区内后续记录，也不在核心内重试；
//! - 登记本身失败：向上返回携带原始持久化错误的 `RecorderFailure`，由引擎终止该工作者。
//!
use super::handler::EventHandler;
use super::log::LogRecord;
use super::publisher::DEFAULT_TOPIC;
use super::recorder::FailureRecorder;
use crate::coupon::{Coupon, FailedEvent, IssuanceRequest, OwnerId};
use crate::error::{DomainError, DomainResult as Result};
use crate::persist::CouponRepository;
use crate::state::IssuanceState;
use async_trait::async_trait;
use std::sync::Arc;

/// 单条记录的消费结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    Issued(Coupon),
    AlreadyIssued(OwnerId),
    FailedRecorded(FailedEvent),
    /// 负载无法解析，记录被跳过
    Skipped { reason: String },
}

impl ConsumeOutcome {
    pub fn state(&self) -> Option<IssuanceState> {
        match self {
            Self::Issued(_) | Self::AlreadyIssued(_) => Some(IssuanceState::Issued),
            Self::FailedRecorded(_) => Some(IssuanceState::FailedRecorded),
            Self::Skipped { .. } => None,
        }
    }
}

#[derive(Clone)]
pub struct IssuanceConsumer {
    coupons: Arc<dyn CouponRepository>,
    recorder: Arc<dyn FailureRecorder>,
    topic: String,
}

impl IssuanceConsumer {
    pub fn new(coupons: Arc<dyn CouponRepository>, recorder: Arc<dyn FailureRecorder>) -> Self {
        Self {
            coupons,
            recorder,
            topic: DEFAULT_TOPIC.to_string(),
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub async fn on_record(&self, record: &LogRecord) -> Result<ConsumeOutcome> {
        let request = match IssuanceRequest::from_payload(record.payload()) {
            Ok(request) => request,
            Err(err) => {
                tracing::error!(
                    partition = record.partition(),
                    offset = record.offset(),
                    key = record.key(),
                    error = %err,
                    "undecodable issuance record skipped"
                );
                return Ok(ConsumeOutcome::Skipped {
                    reason: err.to_string(),
                });
            }
        };
        let owner_id = request.owner_id;

        match self.coupons.create(owner_id).await {
            Ok(coupon) => {
                tracing::debug!(%owner_id, coupon_id = coupon.id(), "coupon issued");
                Ok(ConsumeOutcome::Issued(coupon))
            }
            Err(DomainError::AlreadyIssued { .. }) => {
                tracing::info!(
                    %owner_id,
                    partition = record.partition(),
                    offset = record.offset(),
                    "redelivered record for already issued owner"
                );
                Ok(ConsumeOutcome::AlreadyIssued(owner_id))
            }
            Err(err) => {
                tracing::error!(%owner_id, error = %err, "error occurred while issuing coupon");
                let cause = err.to_string();
                let failed = self
                    .recorder
                    .record(owner_id, &cause)
                    .await
                    .map_err(|e| match e {
                        DomainError::RecorderFailure { .. } => e,
                        other => DomainError::RecorderFailure {
                            owner_id,
                            reason: other.to_string(),
                            cause: cause.clone(),
                        },
                    })?;
                Ok(ConsumeOutcome::FailedRecorded(failed))
            }
        }
    }
}

#[async_trait]
impl EventHandler for IssuanceConsumer {
    fn handler_name(&self) -> &str {
        "issuance-consumer"
    }

    fn topic(&self) -> &str {
        &self.topic
    }

    async fn handle(&self, record: &LogRecord) -> Result<()> {
        self.on_record(record).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventing::recorder::RepositoryFailureRecorder;
    use crate::persist::{
        FailedEventRepository, InMemoryCouponRepository, InMemoryFailedEventRepository,
    };
    use chrono::Utc;

    /// 对指定 owner 持久化失败的仓储
    struct FailingFor {
        inner: InMemoryCouponRepository,
        owner: OwnerId,
    }

    #[async_trait]
    impl CouponRepository for FailingFor {
        async fn create(&self, owner_id: OwnerId) -> Result<Coupon> {
            if owner_id == self.owner {
                return Err(DomainError::persist(owner_id, "deadlock detected"));
            }
            self.inner.create(owner_id).await
        }
        async fn count(&self) -> Result<i64> {
            self.inner.count().await
        }
    }

    /// 返回非 `RecorderFailure` 错误的登记器
    struct BrokenRecorder;

    #[async_trait]
    impl FailureRecorder for BrokenRecorder {
        async fn record(&self, _owner_id: OwnerId, _cause: &str) -> Result<FailedEvent> {
            Err(DomainError::Database {
                reason: "disk full".into(),
            })
        }
    }

    fn record_for(owner: i64, offset: u64) -> LogRecord {
        LogRecord::builder()
            .record_id(format!("r-{offset}"))
            .topic(DEFAULT_TOPIC.to_string())
            .partition(0)
            .offset(offset)
            .key(owner.to_string())
            .payload(
                IssuanceRequest::new(OwnerId::new(owner))
                    .to_payload()
                    .expect("payload"),
            )
            .appended_at(Utc::now())
            .build()
    }

    fn consumer_with(
        coupons: Arc<dyn CouponRepository>,
    ) -> (IssuanceConsumer, Arc<InMemoryFailedEventRepository>) {
        let failures = Arc::new(InMemoryFailedEventRepository::new());
        let recorder = Arc::new(RepositoryFailureRecorder::new(failures.clone()));
        (IssuanceConsumer::new(coupons, recorder), failures)
    }

    #[tokio::test]
    async fn successful_persist_issues_coupon() {
        let coupons = Arc::new(InMemoryCouponRepository::new());
        let (consumer, failures) = consumer_with(coupons.clone());

        let outcome = consumer.on_record(&record_for(1, 0)).await.unwrap();
        assert!(matches!(outcome, ConsumeOutcome::Issued(ref c) if c.owner_id() == OwnerId::new(1)));
        assert_eq!(outcome.state(), Some(IssuanceState::Issued));
        assert_eq!(coupons.count().await.unwrap(), 1);
        assert_eq!(failures.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn redelivery_does_not_issue_twice() {
        let coupons = Arc::new(InMemoryCouponRepository::new());
        let (consumer, failures) = consumer_with(coupons.clone());

        consumer.on_record(&record_for(1, 0)).await.unwrap();
        let again = consumer.on_record(&record_for(1, 0)).await.unwrap();
        assert_eq!(again, ConsumeOutcome::AlreadyIssued(OwnerId::new(1)));
        assert_eq!(coupons.count().await.unwrap(), 1);
        assert_eq!(failures.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn persist_failure_is_recorded_and_swallowed() {
        let coupons = Arc::new(FailingFor {
            inner: InMemoryCouponRepository::new(),
            owner: OwnerId::new(2),
        });
        let (consumer, failures) = consumer_with(coupons.clone());

        let outcome = consumer.on_record(&record_for(2, 0)).await.unwrap();
        assert_eq!(outcome.state(), Some(IssuanceState::FailedRecorded));
        let recorded = failures.list().await.unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].owner_id(), OwnerId::new(2));

        // 后续记录照常处理
        let next = consumer.on_record(&record_for(3, 1)).await.unwrap();
        assert_eq!(next.state(), Some(IssuanceState::Issued));
        assert_eq!(coupons.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn recorder_failure_is_escalated() {
        let coupons = Arc::new(FailingFor {
            inner: InMemoryCouponRepository::new(),
            owner: OwnerId::new(4),
        });
        let consumer = IssuanceConsumer::new(coupons, Arc::new(BrokenRecorder));

        let err = consumer.handle(&record_for(4, 0)).await.unwrap_err();
        match err {
            DomainError::RecorderFailure {
                owner_id,
                reason,
                cause,
            } => {
                assert_eq!(owner_id, OwnerId::new(4));
                assert!(reason.contains("disk full"));
                assert!(cause.contains("deadlock detected"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn undecodable_payload_is_skipped() {
        let coupons = Arc::new(InMemoryCouponRepository::new());
        let (consumer, failures) = consumer_with(coupons.clone());
        let bad = LogRecord::builder()
            .record_id("bad".to_string())
            .topic(DEFAULT_TOPIC.to_string())
            .partition(0)
            .offset(0)
            .key("x".to_string())
            .payload(serde_json::json!("not a request"))
            .appended_at(Utc::now())
            .build();

        let outcome = consumer.on_record(&bad).await.unwrap();
        assert!(matches!(outcome, ConsumeOutcome::Skipped { .. }));
        assert_eq!(outcome.state(), None);
        assert_eq!(coupons.count().await.unwrap(), 0);
        assert_eq!(failures.count().await.unwrap(), 0);
    }

    #[test]
    fn consumer_subscribes_to_configured_topic() {
        let coupons = Arc::new(InMemoryCouponRepository::new());
        let (consumer, _) = consumer_with(coupons);
        assert_eq!(consumer.topic(), DEFAULT_TOPIC);
        assert_eq!(consumer.with_topic("other").topic(), "other");
    }
}
