//! 领域层统一错误定义
//!
//! 按发放链路的四类失败划分（协调存储、发布、持久化、失败登记），
//! 另保留序列化、日志与状态校验等最小必要集合，便于各实现层统一转换为 `DomainError`。
//!
use crate::coupon::OwnerId;
use thiserror::Error;

/// 统一错误类型（发放核心最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 协调存储（计数器/去重集合）---
    #[error("coordination store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    // --- 事件日志 ---
    #[error("publish failed: topic={topic}, key={key}, reason={reason}")]
    PublishFailure {
        topic: String,
        key: String,
        reason: String,
    },
    #[error("event log error: {reason}")]
    EventLog { reason: String },

    // --- 持久化 ---
    #[error("persist failed: owner={owner_id}, reason={reason}")]
    PersistFailure { owner_id: OwnerId, reason: String },
    #[error("coupon already issued: owner={owner_id}")]
    AlreadyIssued { owner_id: OwnerId },
    /// `cause` 为触发登记的原始持久化错误
    #[error("failure recorder error: owner={owner_id}, reason={reason}, cause={cause}")]
    RecorderFailure {
        owner_id: OwnerId,
        reason: String,
        cause: String,
    },
    #[error("database error: {reason}")]
    Database { reason: String },

    // --- 序列化/状态 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("invalid state transition: from={from}, to={to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },
}

impl DomainError {
    pub fn store_unavailable(reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            reason: reason.into(),
        }
    }

    pub fn event_log(reason: impl Into<String>) -> Self {
        Self::EventLog {
            reason: reason.into(),
        }
    }

    pub fn persist(owner_id: OwnerId, reason: impl Into<String>) -> Self {
        Self::PersistFailure {
            owner_id,
            reason: reason.into(),
        }
    }
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;

// ---- Cross-crate conversions for infrastructure convenience ----
// 允许在基础设施层直接使用 `?` 将 sqlx 错误转换为 DomainError

#[cfg(feature = "infra-sqlx")]
impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::Database {
            reason: err.to_string(),
        }
    }
}

impl From<std::num::ParseIntError> for DomainError {
    fn from(err: std::num::ParseIntError) -> Self {
        DomainError::InvalidValue {
            reason: err.to_string(),
        }
    }
}
