use chrono::{Duration, Utc};
use tracing::info;

use crate::domain::repository::AccessCodeRepository;
use crate::error::AccessServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Active codes whose wall-clock expiry had passed, now marked Expired.
    pub expired: u64,
    /// Long-resolved codes removed by the retention purge.
    pub purged: u64,
}

/// Periodic reconciliation of derived expiry into persisted status, plus
/// storage reclamation of long-resolved rows. The one cross-tenant
/// component; it never rewrites a row's `estate_id`. Idempotent: a second
/// pass with no intervening expiries updates nothing.
pub struct SweepExpiredUseCase<R: AccessCodeRepository> {
    pub repo: R,
    pub retention: Duration,
}

impl<R: AccessCodeRepository> SweepExpiredUseCase<R> {
    pub async fn execute(&self) -> Result<SweepOutcome, AccessServiceError> {
        let now = Utc::now();
        let expired = self.repo.sweep_expired(now).await?;
        let purged = self.repo.purge_resolved(now - self.retention).await?;
        if expired > 0 || purged > 0 {
            info!(expired, purged, "sweep pass complete");
        }
        Ok(SweepOutcome { expired, purged })
    }
}
