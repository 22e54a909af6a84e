//! 发放模型（Coupon / FailedEvent / IssuanceRequest）
//!
//! - `OwnerId`：申请者身份，既是去重集合成员，也是日志分区键；
//! - `Coupon`：成功持久化后的发放单元，只由消费端创建，创建后不可变；
//! - `FailedEvent`：持久化失败的登记记录，供外部补偿任务使用；
//! - `IssuanceRequest`：在途请求，仅作为日志记录的负载存在。
//!
use crate::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 申请者身份
///
/// # 示例
///
/// ```
/// use coupon_domain::coupon::OwnerId;
///
/// let owner = OwnerId::new(42);
/// assert_eq!(owner.value(), 42);
/// assert_eq!(owner.to_string(), "42");
/// assert_eq!("42".parse::<OwnerId>().unwrap(), owner);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(i64);

impl OwnerId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for OwnerId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OwnerId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse::<i64>()?))
    }
}

/// 已发放的优惠券
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// 持久化时由存储生成
    id: i64,
    owner_id: OwnerId,
    issued_at: DateTime<Utc>,
}

impl Coupon {
    pub fn new(id: i64, owner_id: OwnerId, issued_at: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id,
            issued_at,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

/// 持久化失败登记
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedEvent {
    id: i64,
    owner_id: OwnerId,
    failed_at: DateTime<Utc>,
}

impl FailedEvent {
    pub fn new(id: i64, owner_id: OwnerId, failed_at: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id,
            failed_at,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    pub fn failed_at(&self) -> DateTime<Utc> {
        self.failed_at
    }
}

/// 在途的发放请求（日志负载）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceRequest {
    pub owner_id: OwnerId,
}

impl IssuanceRequest {
    pub fn new(owner_id: OwnerId) -> Self {
        Self { owner_id }
    }

    pub fn to_payload(&self) -> Result<serde_json::Value, DomainError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, DomainError> {
        Ok(serde_json::from_value(payload.clone())?)
    }
}
