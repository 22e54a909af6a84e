use crate::coupon::{Coupon, OwnerId};
use crate::error::DomainResult as Result;
use async_trait::async_trait;
use std::sync::Arc;

/// 发放单元仓储
///
/// 实现必须保证同一 `owner_id` 至多存在一张券：重复创建返回
/// `DomainError::AlreadyIssued`，以弥补至少一次投递下的重投缺口。
#[async_trait]
pub trait CouponRepository: Send + Sync {
    async fn create(&self, owner_id: OwnerId) -> Result<Coupon>;

    async fn count(&self) -> Result<i64>;
}

#[async_trait]
impl<T> CouponRepository for Arc<T>
where
    T: CouponRepository + ?Sized,
{
    async fn create(&self, owner_id: OwnerId) -> Result<Coupon> {
        (**self).create(owner_id).await
    }

    async fn count(&self) -> Result<i64> {
        (**self).count().await
    }
}
