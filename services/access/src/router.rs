use axum::{
    Router,
    routing::{delete, get, post},
};

use gatekeeper_core::health::{healthz, readyz};
use gatekeeper_core::middleware::request_id_layer;

use crate::handlers::{
    access_code::{
        create_access_code, get_access_code, list_access_codes, revoke_access_code,
        validate_access_code,
    },
    sweep::run_sweep,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Access codes
        .route("/access-codes", post(create_access_code))
        .route("/access-codes", get(list_access_codes))
        .route("/access-codes/validate", post(validate_access_code))
        .route("/access-codes/{id}", get(get_access_code))
        .route("/access-codes/{id}", delete(revoke_access_code))
        // Operational
        .route("/internal/sweep", post(run_sweep))
        .layer(request_id_layer())
        .with_state(state)
}
