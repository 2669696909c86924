use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Access service domain error variants.
///
/// Validation denials (`already_used`, `expired`, ...) are not errors; they
/// travel inside the 200 validation outcome so a gate device always parses
/// one response shape. `DuplicateCode` is an internal signal consumed by the
/// creation retry loop and should never reach a client.
#[derive(Debug, thiserror::Error)]
pub enum AccessServiceError {
    #[error("access code not found")]
    NotFound,
    #[error("access code already in a terminal state")]
    AlreadyTerminal,
    #[error("requested duration outside estate policy bounds")]
    InvalidDuration,
    #[error("duplicate code for estate")]
    DuplicateCode,
    #[error("could not allocate a unique code")]
    CodeSpaceExhausted,
    #[error("forbidden")]
    Forbidden,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AccessServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyTerminal => "ALREADY_TERMINAL",
            Self::InvalidDuration => "INVALID_DURATION",
            Self::DuplicateCode => "DUPLICATE_CODE",
            Self::CodeSpaceExhausted => "CODE_SPACE_EXHAUSTED",
            Self::Forbidden => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for AccessServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AlreadyTerminal | Self::DuplicateCode => StatusCode::CONFLICT,
            Self::InvalidDuration => StatusCode::BAD_REQUEST,
            Self::CodeSpaceExhausted => StatusCode::SERVICE_UNAVAILABLE,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Log 500s only; the request-id layer already records method/uri/status
        // for all requests. 4xx are expected client errors; logging them here
        // would be noise. Internal errors need the anyhow chain logged so the
        // root cause is traceable.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
