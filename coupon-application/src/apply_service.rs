//! 申请服务（ApplyService）
//!
//! 调用方同步路径：`DedupGuard::try_claim` → `AllocationGate::reserve` → `EventPublisher::publish`。
//! 三步各自独立提交、不持有跨步骤的锁，也没有跨步骤事务：
//! - 已占用身份但取号被拒、已取号但发布失败，都按终止处理，不回滚也不重试；
//! - 协调存储不可用时一律拒绝（fail closed），宁可少发也不重复发；
//! - 发布成功即返回，消费端的结果不对调用方同步可见。
//!
use crate::command::ApplyCoupon;
use crate::command_handler::CommandHandler;
use crate::context::AppContext;
use crate::error::AppError;
use async_trait::async_trait;
use coupon_domain::allocation::AllocationGate;
use coupon_domain::coupon::OwnerId;
use coupon_domain::dedup::DedupGuard;
use coupon_domain::eventing::{EventPublisher, RecordAck};
use coupon_domain::state::IssuanceState;
use tracing::Instrument;

/// 调用方可见的申请结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReceipt {
    pub owner_id: OwnerId,
    /// `Enqueued`、`RejectedDuplicate` 或 `RejectedQuota`
    pub state: IssuanceState,
    /// 取号值；在去重阶段被拒时为空
    pub ticket: Option<i64>,
    /// 日志确认；仅 `Enqueued` 时存在
    pub ack: Option<RecordAck>,
}

impl ApplyReceipt {
    pub fn is_enqueued(&self) -> bool {
        self.state == IssuanceState::Enqueued
    }
}

#[derive(Clone)]
pub struct ApplyService {
    dedup: DedupGuard,
    gate: AllocationGate,
    publisher: EventPublisher,
}

impl ApplyService {
    pub fn new(dedup: DedupGuard, gate: AllocationGate, publisher: EventPublisher) -> Self {
        Self {
            dedup,
            gate,
            publisher,
        }
    }

    #[tracing::instrument(name = "apply_coupon", skip_all, fields(owner_id = %owner_id))]
    pub async fn apply(&self, owner_id: OwnerId) -> Result<ApplyReceipt, AppError> {
        let state = IssuanceState::Pending;

        let claimed = self.dedup.try_claim(owner_id).await.inspect_err(|err| {
            tracing::warn!(error = %err, "dedup store unavailable; request denied");
        })?;
        if !claimed {
            return Ok(ApplyReceipt {
                owner_id,
                state: state.advance(IssuanceState::RejectedDuplicate)?,
                ticket: None,
                ack: None,
            });
        }
        let state = state.advance(IssuanceState::Claimed)?;

        let reservation = self.gate.reserve().await.inspect_err(|err| {
            tracing::warn!(error = %err, "allocation store unavailable; request denied");
        })?;
        if !reservation.is_admitted() {
            return Ok(ApplyReceipt {
                owner_id,
                state: state.advance(IssuanceState::RejectedQuota)?,
                ticket: Some(reservation.ticket()),
                ack: None,
            });
        }
        let state = state.advance(IssuanceState::Reserved)?;

        match self.publisher.publish(owner_id).await {
            Ok(ack) => {
                let state = state.advance(IssuanceState::Enqueued)?;
                tracing::debug!(ticket = reservation.ticket(), "request enqueued");
                Ok(ApplyReceipt {
                    owner_id,
                    state,
                    ticket: Some(reservation.ticket()),
                    ack: Some(ack),
                })
            }
            Err(err) => {
                let state = state.advance(IssuanceState::PublishFailed)?;
                tracing::warn!(
                    %state,
                    ticket = reservation.ticket(),
                    error = %err,
                    "reserved slot burned by publish failure"
                );
                Err(err.into())
            }
        }
    }
}

#[async_trait]
impl CommandHandler<ApplyCoupon> for ApplyService {
    type Output = ApplyReceipt;

    async fn handle(&self, ctx: &AppContext, cmd: ApplyCoupon) -> Result<ApplyReceipt, AppError> {
        let span = tracing::info_span!(
            "command",
            command = <ApplyCoupon as crate::command::Command>::NAME,
            correlation_id = ctx.correlation_id.as_deref().unwrap_or_default(),
            actor_id = ctx.actor_id.as_deref().unwrap_or_default(),
        );
        self.apply(cmd.owner_id).instrument(span).await
    }
}
