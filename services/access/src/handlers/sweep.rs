use axum::{Json, extract::State};
use chrono::Duration;
use serde::Serialize;

use gatekeeper_core::identity::Identity;

use crate::error::AccessServiceError;
use crate::state::AppState;
use crate::usecase::sweep::SweepExpiredUseCase;

#[derive(Serialize)]
pub struct SweepResponse {
    pub swept: u64,
    pub purged: u64,
}

/// Operational entrypoint for an on-demand sweep pass (the background loop
/// runs the same use case on its own interval).
pub async fn run_sweep(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<SweepResponse>, AccessServiceError> {
    if !identity.is_admin() {
        return Err(AccessServiceError::Forbidden);
    }
    let uc = SweepExpiredUseCase {
        repo: state.access_code_repo(),
        retention: Duration::days(state.retention_days),
    };
    let outcome = uc.execute().await?;
    Ok(Json(SweepResponse {
        swept: outcome.expired,
        purged: outcome.purged,
    }))
}
