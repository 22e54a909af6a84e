//! 单次请求的发放状态机（IssuanceState）
//!
//! ```text
//! Pending ─▶ Claimed ─▶ Reserved ─▶ Enqueued ─▶ Issued
//!    │          │           │           └────▶ FailedRecorded
//!    │          │           └────▶ PublishFailed
//!    │          └────▶ RejectedQuota
//!    └────▶ RejectedDuplicate
//! ```
//!
//! 每一步独立提交，没有跨步骤事务；终止状态不可再迁移。
//!
use crate::error::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssuanceState {
    Pending,
    Claimed,
    Reserved,
    Enqueued,
    RejectedDuplicate,
    RejectedQuota,
    PublishFailed,
    Issued,
    FailedRecorded,
}

impl IssuanceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Claimed => "claimed",
            Self::Reserved => "reserved",
            Self::Enqueued => "enqueued",
            Self::RejectedDuplicate => "rejected_duplicate",
            Self::RejectedQuota => "rejected_quota",
            Self::PublishFailed => "publish_failed",
            Self::Issued => "issued",
            Self::FailedRecorded => "failed_recorded",
        }
    }

    /// 终止状态
    ///
    /// `Enqueued` 对调用方而言是最终结果，但对整条链路并非终止：后续由消费端推进。
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::RejectedDuplicate
                | Self::RejectedQuota
                | Self::PublishFailed
                | Self::Issued
                | Self::FailedRecorded
        )
    }

    pub fn can_advance_to(&self, next: IssuanceState) -> bool {
        use IssuanceState::*;
        matches!(
            (self, next),
            (Pending, Claimed | RejectedDuplicate)
                | (Claimed, Reserved | RejectedQuota)
                | (Reserved, Enqueued | PublishFailed)
                | (Enqueued, Issued | FailedRecorded)
        )
    }

    /// 推进到下一状态；非法迁移返回 `InvalidTransition`
    pub fn advance(self, next: IssuanceState) -> DomainResult<IssuanceState> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

impl std::fmt::Display for IssuanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::IssuanceState::*;
    use super::*;

    #[test]
    fn happy_path_walks_to_issued() {
        let s = Pending
            .advance(Claimed)
            .and_then(|s| s.advance(Reserved))
            .and_then(|s| s.advance(Enqueued))
            .and_then(|s| s.advance(Issued))
            .unwrap();
        assert_eq!(s, Issued);
        assert!(s.is_terminal());
    }

    #[test]
    fn terminal_states_never_move() {
        let all = [
            Pending,
            Claimed,
            Reserved,
            Enqueued,
            RejectedDuplicate,
            RejectedQuota,
            PublishFailed,
            Issued,
            FailedRecorded,
        ];
        for from in all.iter().filter(|s| s.is_terminal()) {
            for to in all {
                assert!(!from.can_advance_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn skipping_a_step_is_rejected() {
        let err = Pending.advance(Reserved).unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidTransition {
                from: "pending",
                to: "reserved"
            }
        ));
        assert!(Claimed.advance(Claimed).is_err());
        assert!(Enqueued.advance(Reserved).is_err());
    }

    #[test]
    fn enqueued_is_not_terminal() {
        assert!(!Enqueued.is_terminal());
        assert!(!Pending.is_terminal());
    }
}
