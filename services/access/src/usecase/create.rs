use chrono::{Duration, Utc};
use rand::RngExt;
use serde_json::json;
use uuid::Uuid;

use crate::domain::repository::{AccessCodeRepository, PolicyPort};
use crate::domain::types::{
    AccessCode, CODE_LEN, CodeStatus, CodeType, MAX_CODE_ATTEMPTS, OutboxEvent,
};
use crate::error::AccessServiceError;

/// Charset for generating codes: uppercase alphanumeric minus the visually
/// confusable 0/O, 1/I/L. Codes are read over intercoms and typed on
/// keypads.
const CHARSET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

pub struct CreateAccessCodeInput {
    pub code_type: CodeType,
    pub duration_minutes: i64,
    pub visitor_name: Option<String>,
    pub visitor_phone: Option<String>,
    pub purpose: Option<String>,
    pub notes: Option<String>,
}

pub struct CreateAccessCodeUseCase<R, P>
where
    R: AccessCodeRepository,
    P: PolicyPort,
{
    pub repo: R,
    pub policies: P,
}

impl<R, P> CreateAccessCodeUseCase<R, P>
where
    R: AccessCodeRepository,
    P: PolicyPort,
{
    pub async fn execute(
        &self,
        estate_id: Uuid,
        issuer_id: Uuid,
        input: CreateAccessCodeInput,
    ) -> Result<AccessCode, AccessServiceError> {
        // 1. Requested duration must fall within the estate's policy bounds.
        //    `try_minutes` bounds the raw client value first: a magnitude
        //    chrono cannot represent is out of any policy's bounds too.
        let duration = Duration::try_minutes(input.duration_minutes)
            .ok_or(AccessServiceError::InvalidDuration)?;
        let policy = self.policies.policy_for(estate_id).await?;
        if !policy.allows(duration, input.code_type) {
            return Err(AccessServiceError::InvalidDuration);
        }

        // 2. Generate and insert; the per-estate unique index is the
        //    authority on collisions, so retry with a fresh code until it
        //    accepts one.
        for _ in 0..MAX_CODE_ATTEMPTS {
            let now = Utc::now();
            let code = AccessCode {
                id: Uuid::new_v4(),
                estate_id,
                issued_by: issuer_id,
                code: generate_code(),
                code_type: input.code_type,
                status: CodeStatus::Active,
                visitor_name: input.visitor_name.clone(),
                visitor_phone: input.visitor_phone.clone(),
                purpose: input.purpose.clone(),
                notes: input.notes.clone(),
                verified_by: None,
                expires_at: now + duration,
                used_at: None,
                revoked_at: None,
                created_at: now,
            };

            let event = OutboxEvent {
                id: Uuid::new_v4(),
                kind: "access_code_created".to_owned(),
                payload: json!({
                    "access_code_id": code.id,
                    "estate_id": estate_id,
                    "event_type": "access_code_created",
                }),
                idempotency_key: format!("access_code_created:{}", code.id),
            };

            match self.repo.create_with_outbox(&code, &event).await {
                Ok(()) => return Ok(code),
                Err(AccessServiceError::DuplicateCode) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(AccessServiceError::CodeSpaceExhausted)
    }
}
