use crate::dto::IssuanceReport;
use crate::query::GetIssuanceReport;
use crate::{context::AppContext, error::AppError, query::Query};
use async_trait::async_trait;
use coupon_domain::persist::{CouponRepository, FailedEventRepository};
use std::sync::Arc;

#[async_trait]
pub trait QueryHandler<Q>: Send + Sync
where
    Q: Query,
{
    async fn handle(&self, ctx: &AppContext, q: Q) -> Result<Q::Dto, AppError>;
}

/// 读取两张表的计数
pub struct IssuanceReportHandler {
    coupons: Arc<dyn CouponRepository>,
    failures: Arc<dyn FailedEventRepository>,
}

impl IssuanceReportHandler {
    pub fn new(
        coupons: Arc<dyn CouponRepository>,
        failures: Arc<dyn FailedEventRepository>,
    ) -> Self {
        Self { coupons, failures }
    }
}

#[async_trait]
impl QueryHandler<GetIssuanceReport> for IssuanceReportHandler {
    async fn handle(
        &self,
        _ctx: &AppContext,
        _q: GetIssuanceReport,
    ) -> Result<IssuanceReport, AppError> {
        Ok(IssuanceReport {
            issued: self.coupons.count().await?,
            failed: self.failures.count().await?,
        })
    }
}
