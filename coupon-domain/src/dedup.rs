//! 去重守卫（DedupGuard）
//!
//! 包装协调存储中的单个集合，用一次原子“不存在则加入”判定某身份是否首次申请。
//! 成员一旦加入便永久存在，本核心没有移除路径。
//!
use crate::coordination::CoordinationStore;
use crate::coupon::OwnerId;
use crate::error::{DomainError, DomainResult as Result};
use std::sync::Arc;

/// 默认去重集合键
pub const DEFAULT_DEDUP_KEY: &str = "applied_user";

#[derive(Clone)]
pub struct DedupGuard {
    store: Arc<dyn CoordinationStore>,
    key: String,
}

impl DedupGuard {
    pub fn new(store: Arc<dyn CoordinationStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// 仅当本次调用把 `owner_id` 加入集合时返回 `true`
    pub async fn try_claim(&self, owner_id: OwnerId) -> Result<bool> {
        let member = owner_id.to_string();
        let claimed = self
            .store
            .add_to_set(&self.key, &member)
            .await
            .map_err(|e| match e {
                DomainError::StoreUnavailable { .. } => e,
                other => DomainError::store_unavailable(other.to_string()),
            })?;

        if !claimed {
            tracing::debug!(key = %self.key, %owner_id, "duplicate claim");
        }
        Ok(claimed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordination::InMemoryCoordinationStore;
    use async_trait::async_trait;

    #[tokio::test]
    async fn repeated_claims_return_false_after_the_first() {
        let store = Arc::new(InMemoryCoordinationStore::new());
        let guard = DedupGuard::new(store.clone(), DEFAULT_DEDUP_KEY);
        let owner = OwnerId::new(7);

        assert!(guard.try_claim(owner).await.unwrap());
        for _ in 0..10 {
            assert!(!guard.try_claim(owner).await.unwrap());
        }
        assert_eq!(store.set_len(DEFAULT_DEDUP_KEY), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_claims_for_one_owner_admit_exactly_one() {
        let store = Arc::new(InMemoryCoordinationStore::new());
        let guard = DedupGuard::new(store, DEFAULT_DEDUP_KEY);
        let mut tasks = Vec::new();
        for _ in 0..64 {
            let guard = guard.clone();
            tasks.push(tokio::spawn(async move {
                guard.try_claim(OwnerId::new(1)).await.unwrap()
            }));
        }
        let mut winners = 0;
        for t in tasks {
            if t.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    struct DownStore;

    #[async_trait]
    impl CoordinationStore for DownStore {
        async fn increment(&self, _key: &str) -> Result<i64> {
            Err(DomainError::store_unavailable("timeout"))
        }
        async fn add_to_set(&self, _key: &str, _member: &str) -> Result<bool> {
            Err(DomainError::Database {
                reason: "timeout".into(),
            })
        }
    }

    #[tokio::test]
    async fn unreachable_store_fails_the_claim() {
        let guard = DedupGuard::new(Arc::new(DownStore), DEFAULT_DEDUP_KEY);
        let err = guard.try_claim(OwnerId::new(1)).await.unwrap_err();
        assert!(matches!(err, DomainError::StoreUnavailable { .. }));
    }
}
