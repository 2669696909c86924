use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gatekeeper_core::identity::Identity;
use gatekeeper_core::pagination::PageRequest;

use crate::domain::repository::AccessCodeRepository;
use crate::domain::types::{AccessCode, CodeType, ValidationOutcome};
use crate::error::AccessServiceError;
use crate::state::AppState;
use crate::usecase::create::{CreateAccessCodeInput, CreateAccessCodeUseCase};
use crate::usecase::revoke::{RevokeAccessCodeInput, RevokeAccessCodeUseCase};
use crate::usecase::validate::ValidateAccessCodeUseCase;

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct AccessCodeResponse {
    pub id: Uuid,
    pub code: String,
    pub code_type: &'static str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visitor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visitor_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<Uuid>,
    #[serde(serialize_with = "gatekeeper_core::serde::to_rfc3339_ms")]
    pub expires_at: chrono::DateTime<chrono::Utc>,
    #[serde(
        serialize_with = "gatekeeper_core::serde::to_rfc3339_ms_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub used_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(
        serialize_with = "gatekeeper_core::serde::to_rfc3339_ms_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub revoked_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(serialize_with = "gatekeeper_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<AccessCode> for AccessCodeResponse {
    fn from(code: AccessCode) -> Self {
        Self {
            id: code.id,
            code: code.code,
            code_type: code.code_type.as_db(),
            status: code.status.as_db(),
            visitor_name: code.visitor_name,
            visitor_phone: code.visitor_phone,
            purpose: code.purpose,
            notes: code.notes,
            verified_by: code.verified_by,
            expires_at: code.expires_at,
            used_at: code.used_at,
            revoked_at: code.revoked_at,
            created_at: code.created_at,
        }
    }
}

// ── POST /access-codes ───────────────────────────────────────────────────────

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum CodeTypeParam {
    SingleUse,
    LongLived,
}

impl From<CodeTypeParam> for CodeType {
    fn from(param: CodeTypeParam) -> Self {
        match param {
            CodeTypeParam::SingleUse => CodeType::SingleUse,
            CodeTypeParam::LongLived => CodeType::LongLived,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateAccessCodeRequest {
    pub code_type: CodeTypeParam,
    pub duration_minutes: i64,
    pub visitor_name: Option<String>,
    pub visitor_phone: Option<String>,
    pub purpose: Option<String>,
    pub notes: Option<String>,
}

pub async fn create_access_code(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<CreateAccessCodeRequest>,
) -> Result<(StatusCode, Json<AccessCodeResponse>), AccessServiceError> {
    let uc = CreateAccessCodeUseCase {
        repo: state.access_code_repo(),
        policies: state.policy_port(),
    };
    let code = uc
        .execute(
            identity.estate_id,
            identity.user_id,
            CreateAccessCodeInput {
                code_type: body.code_type.into(),
                duration_minutes: body.duration_minutes,
                visitor_name: body.visitor_name,
                visitor_phone: body.visitor_phone,
                purpose: body.purpose,
                notes: body.notes,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(code.into())))
}

// ── POST /access-codes/validate ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ValidateAccessCodeRequest {
    pub code: String,
}

#[derive(Serialize)]
pub struct ValidationResponse {
    pub granted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_code: Option<AccessCodeResponse>,
}

pub async fn validate_access_code(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<ValidateAccessCodeRequest>,
) -> Result<Json<ValidationResponse>, AccessServiceError> {
    if !identity.is_security() {
        return Err(AccessServiceError::Forbidden);
    }
    let uc = ValidateAccessCodeUseCase {
        repo: state.access_code_repo(),
    };
    let outcome = uc
        .execute(identity.estate_id, identity.user_id, &body.code)
        .await?;
    let response = match outcome {
        ValidationOutcome::Granted { code } => ValidationResponse {
            granted: true,
            reason: None,
            access_code: Some(code.into()),
        },
        ValidationOutcome::Denied { reason } => ValidationResponse {
            granted: false,
            reason: Some(reason.as_str()),
            access_code: None,
        },
    };
    Ok(Json(response))
}

// ── GET /access-codes ────────────────────────────────────────────────────────

pub async fn list_access_codes(
    identity: Identity,
    State(state): State<AppState>,
    axum::extract::RawQuery(raw_query): axum::extract::RawQuery,
) -> Result<Json<Vec<AccessCodeResponse>>, AccessServiceError> {
    let page: PageRequest = raw_query
        .as_deref()
        .and_then(|q| serde_qs::from_str(q).ok())
        .unwrap_or_default();
    let codes = state
        .access_code_repo()
        .list_by_issuer(identity.estate_id, identity.user_id, page)
        .await?;
    Ok(Json(codes.into_iter().map(Into::into).collect()))
}

// ── GET /access-codes/{id} ───────────────────────────────────────────────────

pub async fn get_access_code(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccessCodeResponse>, AccessServiceError> {
    let code = state
        .access_code_repo()
        .find_by_id(identity.estate_id, id)
        .await?
        .ok_or(AccessServiceError::NotFound)?;
    // Residents see only their own codes; security and admins see any.
    if code.issued_by != identity.user_id && !identity.is_security() {
        return Err(AccessServiceError::NotFound);
    }
    Ok(Json(code.into()))
}

// ── DELETE /access-codes/{id} ────────────────────────────────────────────────

pub async fn revoke_access_code(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccessCodeResponse>, AccessServiceError> {
    let uc = RevokeAccessCodeUseCase {
        repo: state.access_code_repo(),
    };
    let code = uc
        .execute(
            identity.estate_id,
            RevokeAccessCodeInput {
                code_id: id,
                actor_id: identity.user_id,
                actor_is_admin: identity.is_admin(),
            },
        )
        .await?;
    Ok(Json(code.into()))
}
