use coupon_domain::error::DomainError;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("domain: {0}")]
    Domain(#[from] DomainError),

    #[error("config: {0}")]
    Config(String),
}

impl AppError {
    /// 协调存储不可用（请求在发布前被拒绝）
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::Domain(DomainError::StoreUnavailable { .. }))
    }

    /// 发布失败（已占用一个配额名额）
    pub fn is_publish_failure(&self) -> bool {
        matches!(self, Self::Domain(DomainError::PublishFailure { .. }))
    }
}
