use chrono::Utc;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::domain::lifecycle::{self, Decision};
use crate::domain::repository::AccessCodeRepository;
use crate::domain::types::{
    AccessCode, CodeStatus, DenyReason, OutboxEvent, StatusChange, ValidationOutcome,
};
use crate::error::AccessServiceError;

/// Gate validation resolver.
///
/// Correctness guarantee: two concurrent validations of the same single-use
/// code never both grant. The grant is a conditional write from
/// `expected = Active`; a lost write triggers exactly one re-read, and a
/// second loss denies `already_used` (the conservative outcome).
pub struct ValidateAccessCodeUseCase<R: AccessCodeRepository> {
    pub repo: R,
}

impl<R: AccessCodeRepository> ValidateAccessCodeUseCase<R> {
    pub async fn execute(
        &self,
        estate_id: Uuid,
        validator_id: Uuid,
        code_str: &str,
    ) -> Result<ValidationOutcome, AccessServiceError> {
        let Some(mut code) = self.repo.find_by_code(estate_id, code_str).await? else {
            return Ok(ValidationOutcome::Denied {
                reason: DenyReason::NotFound,
            });
        };

        let mut retries_left = 1u8;
        loop {
            let now = Utc::now();
            match lifecycle::on_validate(&code, validator_id, now) {
                Decision::Deny(reason) => return Ok(ValidationOutcome::Denied { reason }),

                Decision::ExpireLazily => {
                    // Cache the derived fact; a failed write only delays the
                    // sweeper, never the denial.
                    if let Err(e) = self
                        .repo
                        .transition(estate_id, code.id, CodeStatus::Active, &StatusChange::MarkExpired)
                        .await
                    {
                        warn!(error = %e, access_code_id = %code.id, "lazy expiry write failed");
                    }
                    return Ok(ValidationOutcome::Denied {
                        reason: DenyReason::Expired,
                    });
                }

                Decision::Transition(change) => {
                    let event = validated_event(&code, validator_id, now);
                    let won = self
                        .repo
                        .transition_with_outbox(
                            estate_id,
                            code.id,
                            CodeStatus::Active,
                            &change,
                            &event,
                        )
                        .await?;

                    if won {
                        code.apply(&change);
                        return Ok(ValidationOutcome::Granted { code });
                    }

                    // Lost the race. One bounded re-read, then conservative.
                    if retries_left == 0 {
                        return Ok(ValidationOutcome::Denied {
                            reason: DenyReason::AlreadyUsed,
                        });
                    }
                    retries_left -= 1;
                    code = match self.repo.find_by_code(estate_id, code_str).await? {
                        Some(fresh) if fresh.status != CodeStatus::Active => {
                            return Ok(ValidationOutcome::Denied {
                                reason: lifecycle::denial_after_conflict(&fresh, Utc::now()),
                            });
                        }
                        Some(fresh) => fresh,
                        // Purged mid-flight by retention housekeeping.
                        None => {
                            return Ok(ValidationOutcome::Denied {
                                reason: DenyReason::NotFound,
                            });
                        }
                    };
                }
            }
        }
    }
}

fn validated_event(code: &AccessCode, validator_id: Uuid, now: chrono::DateTime<Utc>) -> OutboxEvent {
    let event_id = Uuid::new_v4();
    OutboxEvent {
        id: event_id,
        kind: "access_code_validated".to_owned(),
        payload: json!({
            "access_code_id": code.id,
            "estate_id": code.estate_id,
            "event_type": "access_code_validated",
            "validated_by": validator_id,
            "validated_at": now,
        }),
        // Keyed on the event id: long-lived codes are validated repeatedly
        // (even within the same instant), so each verification must be its
        // own event. Relay retries of one event still dedupe on the key.
        idempotency_key: format!("access_code_validated:{event_id}"),
    }
}
