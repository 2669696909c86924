#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use gatekeeper_core::pagination::PageRequest;

use crate::domain::types::{AccessCode, CodeStatus, DurationPolicy, OutboxEvent, StatusChange};
use crate::error::AccessServiceError;

/// Repository for visitor access codes.
///
/// Every read and mutation except the sweep pair is scoped to one estate;
/// a code belonging to a different estate is indistinguishable from absent.
/// `transition`/`transition_with_outbox` are the compare-and-transition
/// primitive the validation resolver depends on: the write applies only if
/// the row's status still equals `expected` at commit time, and `false`
/// means another writer won the race.
pub trait AccessCodeRepository: Send + Sync {
    /// Insert a new code and an outbox event atomically (same transaction).
    /// Fails with `DuplicateCode` if the per-estate unique constraint on the
    /// code string is violated; the caller retries with a fresh code.
    async fn create_with_outbox(
        &self,
        code: &AccessCode,
        event: &OutboxEvent,
    ) -> Result<(), AccessServiceError>;

    async fn find_by_code(
        &self,
        estate_id: Uuid,
        code: &str,
    ) -> Result<Option<AccessCode>, AccessServiceError>;

    async fn find_by_id(
        &self,
        estate_id: Uuid,
        id: Uuid,
    ) -> Result<Option<AccessCode>, AccessServiceError>;

    /// A resident's own codes, newest first.
    async fn list_by_issuer(
        &self,
        estate_id: Uuid,
        issuer: Uuid,
        page: PageRequest,
    ) -> Result<Vec<AccessCode>, AccessServiceError>;

    /// Conditionally apply `change` where status still equals `expected`.
    /// Returns `true` if this call won the write.
    async fn transition(
        &self,
        estate_id: Uuid,
        id: Uuid,
        expected: CodeStatus,
        change: &StatusChange,
    ) -> Result<bool, AccessServiceError>;

    /// Same as `transition`, inserting `event` in the same transaction when
    /// the conditional write wins. A lost race inserts nothing.
    async fn transition_with_outbox(
        &self,
        estate_id: Uuid,
        id: Uuid,
        expected: CodeStatus,
        change: &StatusChange,
        event: &OutboxEvent,
    ) -> Result<bool, AccessServiceError>;

    /// Cross-tenant: mark every Active code past its expiry as Expired.
    /// Returns the number of rows updated; idempotent.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, AccessServiceError>;

    /// Cross-tenant housekeeping: delete terminal codes whose expiry is
    /// older than `cutoff`. Returns the number of rows deleted.
    async fn purge_resolved(&self, cutoff: DateTime<Utc>) -> Result<u64, AccessServiceError>;
}

/// Port for estate-level code creation policy.
pub trait PolicyPort: Send + Sync {
    /// Policy for an estate; estates without explicit configuration get the
    /// service defaults.
    async fn policy_for(&self, estate_id: Uuid) -> Result<DurationPolicy, AccessServiceError>;
}
