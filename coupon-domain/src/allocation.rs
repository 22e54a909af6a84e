//! 配额闸门（AllocationGate）
//!
//! 包装协调存储中的单个计数器：每次调用都无条件自增一次，
//! 返回值 `<= quota` 的调用方获准发放，`> quota` 的被拒绝。
//!
//! 计数器记录的是“取号数”而非“发放数”，配额耗尽后会永久超过 quota；
//! 这是避免“先查后增”竞态的代价，必须保留。
//!
use crate::coordination::CoordinationStore;
use crate::error::{DomainError, DomainResult as Result};
use std::sync::Arc;

/// 默认计数器键
pub const DEFAULT_COUNTER_KEY: &str = "coupon_count";

/// 一次取号的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    ticket: i64,
    quota: i64,
}

impl Reservation {
    pub fn new(ticket: i64, quota: i64) -> Self {
        Self { ticket, quota }
    }

    /// 自增后的计数值
    pub fn ticket(&self) -> i64 {
        self.ticket
    }

    pub fn quota(&self) -> i64 {
        self.quota
    }

    pub fn is_admitted(&self) -> bool {
        self.ticket <= self.quota
    }

    /// 超出配额的取号数（未超出时为 0）
    pub fn overshoot(&self) -> i64 {
        (self.ticket - self.quota).max(0)
    }
}

#[derive(Clone)]
pub struct AllocationGate {
    store: Arc<dyn CoordinationStore>,
    key: String,
    quota: i64,
}

impl AllocationGate {
    pub fn new(store: Arc<dyn CoordinationStore>, key: impl Into<String>, quota: i64) -> Self {
        Self {
            store,
            key: key.into(),
            quota,
        }
    }

    /// 原子取号；存储失败统一映射为 `StoreUnavailable`，不做回滚
    pub async fn reserve(&self) -> Result<Reservation> {
        let ticket = self.store.increment(&self.key).await.map_err(|e| match e {
            DomainError::StoreUnavailable { .. } => e,
            other => DomainError::store_unavailable(other.to_string()),
        })?;

        let reservation = Reservation::new(ticket, self.quota);
        if !reservation.is_admitted() {
            tracing::debug!(
                key = %self.key,
                ticket,
                quota = self.quota,
                overshoot = reservation.overshoot(),
                "quota exhausted"
            );
        }
        Ok(reservation)
    }
}
