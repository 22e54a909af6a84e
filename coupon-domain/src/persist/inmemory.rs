//! 内存版仓储
//!
//! `InMemoryCouponRepository` 以 `owner_id` 为唯一键，模拟数据库唯一约束；
//! 两者的 id 均由自增序列生成，模拟 IDENTITY 列。

use super::{CouponRepository, FailedEventRepository};
use crate::coupon::{Coupon, FailedEvent, OwnerId};
use crate::error::{DomainError, DomainResult as Result};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Debug, Default)]
pub struct InMemoryCouponRepository {
    coupons: DashMap<OwnerId, Coupon>,
    sequence: AtomicI64,
}

impl InMemoryCouponRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, owner_id: OwnerId) -> Option<Coupon> {
        self.coupons.get(&owner_id).map(|c| c.clone())
    }
}

#[async_trait]
impl CouponRepository for InMemoryCouponRepository {
    async fn create(&self, owner_id: OwnerId) -> Result<Coupon> {
        match self.coupons.entry(owner_id) {
            Entry::Occupied(_) => Err(DomainError::AlreadyIssued { owner_id }),
            Entry::Vacant(slot) => {
                let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
                let coupon = Coupon::new(id, owner_id, Utc::now());
                slot.insert(coupon.clone());
                Ok(coupon)
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.coupons.len() as i64)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryFailedEventRepository {
    events: Mutex<Vec<FailedEvent>>,
}

impl InMemoryFailedEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FailedEventRepository for InMemoryFailedEventRepository {
    async fn create(&self, owner_id: OwnerId) -> Result<FailedEvent> {
        let mut events = self
            .events
            .lock()
            .map_err(|e| DomainError::Database {
                reason: e.to_string(),
            })?;
        let event = FailedEvent::new(events.len() as i64 + 1, owner_id, Utc::now());
        events.push(event.clone());
        Ok(event)
    }

    async fn count(&self) -> Result<i64> {
        let events = self.events.lock().map_err(|e| DomainError::Database {
            reason: e.to_string(),
        })?;
        Ok(events.len() as i64)
    }

    async fn list(&self) -> Result<Vec<FailedEvent>> {
        let events = self.events.lock().map_err(|e| DomainError::Database {
            reason: e.to_string(),
        })?;
        Ok(events.clone())
    }
}
