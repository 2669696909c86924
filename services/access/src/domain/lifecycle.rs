//! Access code state machine.
//!
//! One exhaustive table decides what a validation attempt does for every
//! `(status, code_type)` pair. Expiry is checked before any transition: an
//! Active code past its `expires_at` is already expired for decision
//! purposes, whether or not the stored status has caught up.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::{AccessCode, CodeStatus, CodeType, DenyReason, StatusChange};

/// What the validation resolver should do with a looked-up code.
#[derive(Debug)]
pub enum Decision {
    /// Attempt the conditional write from `expected = Active`.
    Transition(StatusChange),
    /// Deny `expired` and opportunistically cache `status = Expired`
    /// (best-effort; a failed write changes nothing about the denial).
    ExpireLazily,
    Deny(DenyReason),
}

pub fn on_validate(code: &AccessCode, validator_id: Uuid, now: DateTime<Utc>) -> Decision {
    match (code.status, code.code_type) {
        (CodeStatus::Used, _) => Decision::Deny(DenyReason::AlreadyUsed),
        (CodeStatus::Revoked, _) => Decision::Deny(DenyReason::Revoked),
        (CodeStatus::Expired, _) => Decision::Deny(DenyReason::Expired),
        (CodeStatus::Inactive, _) => Decision::Deny(DenyReason::Inactive),
        (CodeStatus::Active, _) if code.is_expired(now) => Decision::ExpireLazily,
        (CodeStatus::Active, CodeType::SingleUse) => Decision::Transition(StatusChange::MarkUsed {
            verified_by: validator_id,
            at: now,
        }),
        (CodeStatus::Active, CodeType::LongLived) => {
            Decision::Transition(StatusChange::RecordVerifier {
                verified_by: validator_id,
            })
        }
    }
}

/// Denial after a lost conditional write: map the re-read code to the
/// conservative outcome. A re-read that would grant again means the race
/// winner's write is not yet visible to us; denying `already_used` is the
/// safe answer (never a duplicate grant).
pub fn denial_after_conflict(code: &AccessCode, now: DateTime<Utc>) -> DenyReason {
    match code.status {
        CodeStatus::Used => DenyReason::AlreadyUsed,
        CodeStatus::Revoked => DenyReason::Revoked,
        CodeStatus::Expired => DenyReason::Expired,
        CodeStatus::Inactive => DenyReason::Inactive,
        CodeStatus::Active if code.is_expired(now) => DenyReason::Expired,
        CodeStatus::Active => DenyReason::AlreadyUsed,
    }
}
