use sea_orm::DatabaseConnection;

use crate::infra::db::{DbAccessCodeRepository, DbPolicyPort};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub retention_days: i64,
}

impl AppState {
    pub fn access_code_repo(&self) -> DbAccessCodeRepository {
        DbAccessCodeRepository {
            db: self.db.clone(),
        }
    }

    pub fn policy_port(&self) -> DbPolicyPort {
        DbPolicyPort {
            db: self.db.clone(),
        }
    }
}
