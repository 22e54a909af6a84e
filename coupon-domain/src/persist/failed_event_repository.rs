use crate::coupon::{FailedEvent, OwnerId};
use crate::error::DomainResult as Result;
use async_trait::async_trait;
use std::sync::Arc;

/// 失败登记仓储：只追加，供外部补偿任务读取
#[async_trait]
pub trait FailedEventRepository: Send + Sync {
    async fn create(&self, owner_id: OwnerId) -> Result<FailedEvent>;

    async fn count(&self) -> Result<i64>;

    async fn list(&self) -> Result<Vec<FailedEvent>>;
}

#[async_trait]
impl<T> FailedEventRepository for Arc<T>
where
    T: FailedEventRepository + ?Sized,
{
    async fn create(&self, owner_id: OwnerId) -> Result<FailedEvent> {
        (**self).create(owner_id).await
    }

    async fn count(&self) -> Result<i64> {
        (**self).count().await
    }

    async fn list(&self) -> Result<Vec<FailedEvent>> {
        (**self).list().await
    }
}
