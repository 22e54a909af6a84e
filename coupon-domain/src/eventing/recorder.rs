//! 失败登记器（FailureRecorder）
//!
//! 消费端持久化失败时的最后一道防线：把失败持久登记为 `FailedEvent`，
//! 供外部补偿任务重放。登记本身失败时升级为 `RecorderFailure`，不得静默丢弃。
//!
use crate::coupon::{FailedEvent, OwnerId};
use crate::error::{DomainError, DomainResult as Result};
use crate::persist::FailedEventRepository;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait FailureRecorder: Send + Sync {
    /// 登记一次持久化失败；`cause` 为原始持久化错误，登记失败时须随错误一并上抛
    async fn record(&self, owner_id: OwnerId, cause: &str) -> Result<FailedEvent>;
}

/// 基于 `FailedEventRepository` 的登记器
#[derive(Clone)]
pub struct RepositoryFailureRecorder {
    repository: Arc<dyn FailedEventRepository>,
}

impl RepositoryFailureRecorder {
    pub fn new(repository: Arc<dyn FailedEventRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl FailureRecorder for RepositoryFailureRecorder {
    async fn record(&self, owner_id: OwnerId, cause: &str) -> Result<FailedEvent> {
        match self.repository.create(owner_id).await {
            Ok(event) => {
                tracing::info!(
                    %owner_id,
                    failed_event_id = event.id(),
                    cause,
                    "issuance failure recorded"
                );
                Ok(event)
            }
            Err(err) => {
                tracing::error!(%owner_id, error = %err, cause, "failed to record issuance failure");
                Err(DomainError::RecorderFailure {
                    owner_id,
                    reason: err.to_string(),
                    cause: cause.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::InMemoryFailedEventRepository;

    struct ReadOnlyRepository;

    #[async_trait]
    impl FailedEventRepository for ReadOnlyRepository {
        async fn create(&self, _owner_id: OwnerId) -> Result<FailedEvent> {
            Err(DomainError::Database {
                reason: "read-only transaction".into(),
            })
        }
        async fn count(&self) -> Result<i64> {
            Ok(0)
        }
        async fn list(&self) -> Result<Vec<FailedEvent>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn record_appends_failed_event() {
        let repo = Arc::new(InMemoryFailedEventRepository::new());
        let recorder = RepositoryFailureRecorder::new(repo.clone());

        let event = recorder.record(OwnerId::new(12), "timeout").await.unwrap();
        assert_eq!(event.owner_id(), OwnerId::new(12));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn repository_error_escalates_as_recorder_failure() {
        let recorder = RepositoryFailureRecorder::new(Arc::new(ReadOnlyRepository));
        let err = recorder
            .record(OwnerId::new(12), "deadlock detected")
            .await
            .unwrap_err();
        match err {
            DomainError::RecorderFailure {
                owner_id,
                reason,
                cause,
            } => {
                assert_eq!(owner_id, OwnerId::new(12));
                assert!(reason.contains("read-only transaction"));
                assert_eq!(cause, "deadlock detected");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
