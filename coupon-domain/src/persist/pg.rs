//! Postgres 仓储实现（需开启 `infra-sqlx` 特性）
//!
//! `coupon.owner_id` 上的唯一约束承担消费端的幂等校验：
//! 冲突时 `INSERT ... ON CONFLICT DO NOTHING` 不返回行，映射为 `AlreadyIssued`。

use super::{CouponRepository, FailedEventRepository};
use crate::coupon::{Coupon, FailedEvent, OwnerId};
use crate::error::{DomainError, DomainResult as Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS coupon (
    id         BIGSERIAL PRIMARY KEY,
    owner_id   BIGINT      NOT NULL UNIQUE,
    issued_at  TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS failed_event (
    id         BIGSERIAL PRIMARY KEY,
    owner_id   BIGINT      NOT NULL,
    failed_at  TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;

/// 建表（幂等）
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

#[derive(Clone)]
pub struct PgCouponRepository {
    pool: PgPool,
}

impl PgCouponRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CouponRepository for PgCouponRepository {
    async fn create(&self, owner_id: OwnerId) -> Result<Coupon> {
        let row: Option<(i64, i64, DateTime<Utc>)> = sqlx::query_as(
            "INSERT INTO coupon (owner_id) VALUES ($1) \
             ON CONFLICT (owner_id) DO NOTHING \
             RETURNING id, owner_id, issued_at",
        )
        .bind(owner_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::persist(owner_id, e.to_string()))?;

        let (id, owner, issued_at) = row.ok_or(DomainError::AlreadyIssued { owner_id })?;
        Ok(Coupon::new(id, OwnerId::new(owner), issued_at))
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM coupon")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[derive(Clone)]
pub struct PgFailedEventRepository {
    pool: PgPool,
}

impl PgFailedEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FailedEventRepository for PgFailedEventRepository {
    async fn create(&self, owner_id: OwnerId) -> Result<FailedEvent> {
        let (id, owner, failed_at): (i64, i64, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO failed_event (owner_id) VALUES ($1) RETURNING id, owner_id, failed_at",
        )
        .bind(owner_id.value())
        .fetch_one(&self.pool)
        .await?;
        Ok(FailedEvent::new(id, OwnerId::new(owner), failed_at))
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM failed_event")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list(&self) -> Result<Vec<FailedEvent>> {
        let rows: Vec<(i64, i64, DateTime<Utc>)> =
            sqlx::query_as("SELECT id, owner_id, failed_at FROM failed_event ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(id, owner, failed_at)| FailedEvent::new(id, OwnerId::new(owner), failed_at))
            .collect())
    }
}
