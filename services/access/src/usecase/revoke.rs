use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::domain::repository::AccessCodeRepository;
use crate::domain::types::{AccessCode, CodeStatus, StatusChange};
use crate::error::AccessServiceError;

pub struct RevokeAccessCodeInput {
    pub code_id: Uuid,
    pub actor_id: Uuid,
    pub actor_is_admin: bool,
}

/// Resident-initiated revocation. Uses the same conditional-write discipline
/// as the gate: revoking a code the instant it is used cannot silently undo
/// the just-granted outcome. Whichever write commits second loses.
pub struct RevokeAccessCodeUseCase<R: AccessCodeRepository> {
    pub repo: R,
}

impl<R: AccessCodeRepository> RevokeAccessCodeUseCase<R> {
    pub async fn execute(
        &self,
        estate_id: Uuid,
        input: RevokeAccessCodeInput,
    ) -> Result<AccessCode, AccessServiceError> {
        let mut code = self
            .repo
            .find_by_id(estate_id, input.code_id)
            .await?
            .ok_or(AccessServiceError::NotFound)?;

        // Only the issuing resident (or an estate admin) may revoke.
        if code.issued_by != input.actor_id && !input.actor_is_admin {
            return Err(AccessServiceError::Forbidden);
        }

        if code.status != CodeStatus::Active {
            return Err(AccessServiceError::AlreadyTerminal);
        }

        let now = Utc::now();
        if code.is_expired(now) {
            // Already expired in derived terms; materialize that instead of
            // moving a dead code to Revoked.
            if let Err(e) = self
                .repo
                .transition(estate_id, code.id, CodeStatus::Active, &StatusChange::MarkExpired)
                .await
            {
                warn!(error = %e, access_code_id = %code.id, "lazy expiry write failed");
            }
            return Err(AccessServiceError::AlreadyTerminal);
        }

        let change = StatusChange::Revoke { at: now };
        let won = self
            .repo
            .transition(estate_id, code.id, CodeStatus::Active, &change)
            .await?;
        if !won {
            // A validation or the sweeper got there first; the code is
            // terminal either way.
            return Err(AccessServiceError::AlreadyTerminal);
        }

        code.apply(&change);
        Ok(code)
    }
}
