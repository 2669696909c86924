//! Gateway-injected identity headers extractor.

use axum::extract::FromRequestParts;
use http::StatusCode;
use http::request::Parts;
use uuid::Uuid;

/// Role levels assigned by the gateway. Higher values imply broader access.
pub mod role {
    pub const RESIDENT: u8 = 0;
    pub const SECURITY: u8 = 1;
    pub const ADMIN: u8 = 2;
}

/// Caller identity injected by the gateway via `x-gatekeeper-user-id`,
/// `x-gatekeeper-user-role` and `x-gatekeeper-estate-id` headers.
///
/// The estate id is the tenant context resolved by the gateway for the
/// authenticated actor; it is trusted completely and never inferred from
/// request payloads. Returns 401 if any header is absent or unparseable.
/// Role enforcement (403) is done by handlers after extraction.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub user_role: u8,
    pub estate_id: Uuid,
}

impl Identity {
    pub fn is_security(&self) -> bool {
        self.user_role >= role::SECURITY
    }

    pub fn is_admin(&self) -> bool {
        self.user_role >= role::ADMIN
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    // axum-core 0.5 defines this as `fn -> impl Future + Send` (not `async fn`).
    // In Rust 1.82+ precise capturing, `async fn` captures lifetimes differently,
    // causing E0195. Fix: extract values synchronously, return a 'static async move block.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let user_id = parts
            .headers
            .get("x-gatekeeper-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<Uuid>().ok());

        let user_role = parts
            .headers
            .get("x-gatekeeper-user-role")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u8>().ok());

        let estate_id = parts
            .headers
            .get("x-gatekeeper-estate-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<Uuid>().ok());

        async move {
            let user_id = user_id.ok_or(StatusCode::UNAUTHORIZED)?;
            let user_role = user_role.ok_or(StatusCode::UNAUTHORIZED)?;
            let estate_id = estate_id.ok_or(StatusCode::UNAUTHORIZED)?;
            Ok(Self {
                user_id,
                user_role,
                estate_id,
            })
        }
    }
}
