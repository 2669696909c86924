use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Single-use codes grant entry exactly once; long-lived codes grant
/// repeatedly until expiry or revocation. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeType {
    SingleUse,
    LongLived,
}

impl CodeType {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::SingleUse => "single_use",
            Self::LongLived => "long_lived",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "single_use" => Some(Self::SingleUse),
            "long_lived" => Some(Self::LongLived),
            _ => None,
        }
    }
}

/// Persisted code status. `Inactive` is the catch-all for stored values the
/// service does not recognize (legacy imports, schema drift): such codes are
/// denied at the gate, never swept, and never revocable. It is read-only;
/// the service never writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeStatus {
    Active,
    Used,
    Expired,
    Revoked,
    Inactive,
}

impl CodeStatus {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Used => "used",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
            Self::Inactive => "inactive",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "used" => Self::Used,
            "expired" => Self::Expired,
            "revoked" => Self::Revoked,
            _ => Self::Inactive,
        }
    }
}

/// Visitor access code. `estate_id` is the tenant boundary: every lookup and
/// mutation is scoped to it, and it never changes after creation.
#[derive(Debug, Clone)]
pub struct AccessCode {
    pub id: Uuid,
    pub estate_id: Uuid,
    pub issued_by: Uuid,
    pub code: String,
    pub code_type: CodeType,
    pub status: CodeStatus,
    pub visitor_name: Option<String>,
    pub visitor_phone: Option<String>,
    pub purpose: Option<String>,
    pub notes: Option<String>,
    pub verified_by: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AccessCode {
    /// Expiry is a derived fact; persisted `Expired` status is only a lazily
    /// written cache of it.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Mirror a winning conditional write onto this in-memory copy.
    pub fn apply(&mut self, change: &StatusChange) {
        match change {
            StatusChange::MarkUsed { verified_by, at } => {
                self.status = CodeStatus::Used;
                self.used_at = Some(*at);
                self.verified_by = Some(*verified_by);
            }
            StatusChange::RecordVerifier { verified_by } => {
                self.verified_by = Some(*verified_by);
            }
            StatusChange::MarkExpired => {
                self.status = CodeStatus::Expired;
            }
            StatusChange::Revoke { at } => {
                self.status = CodeStatus::Revoked;
                self.revoked_at = Some(*at);
            }
        }
    }
}

/// The write half of a compare-and-transition: what to set when the expected
/// status still holds at commit time.
#[derive(Debug, Clone)]
pub enum StatusChange {
    MarkUsed {
        verified_by: Uuid,
        at: DateTime<Utc>,
    },
    /// Active → Active re-verification of a long-lived code: records the
    /// verifier without a status change.
    RecordVerifier {
        verified_by: Uuid,
    },
    MarkExpired,
    Revoke {
        at: DateTime<Utc>,
    },
}

impl StatusChange {
    pub fn new_status(&self) -> CodeStatus {
        match self {
            Self::MarkUsed { .. } => CodeStatus::Used,
            Self::RecordVerifier { .. } => CodeStatus::Active,
            Self::MarkExpired => CodeStatus::Expired,
            Self::Revoke { .. } => CodeStatus::Revoked,
        }
    }
}

/// Why a validation attempt was denied. A cross-estate or unknown code is
/// always `NotFound`, never a status-specific reason that would reveal the
/// code exists elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotFound,
    AlreadyUsed,
    Expired,
    Revoked,
    Inactive,
}

impl DenyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AlreadyUsed => "already_used",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
            Self::Inactive => "inactive",
        }
    }
}

/// Result of a gate validation. Denials are outcomes, not errors.
#[derive(Debug)]
pub enum ValidationOutcome {
    Granted { code: AccessCode },
    Denied { reason: DenyReason },
}

/// Estate-level creation policy: duration bounds and whether long-lived
/// codes are allowed at all.
#[derive(Debug, Clone)]
pub struct DurationPolicy {
    pub min_duration: Duration,
    pub max_duration: Duration,
    pub single_use_only: bool,
}

impl Default for DurationPolicy {
    fn default() -> Self {
        Self {
            min_duration: Duration::minutes(15),
            max_duration: Duration::days(7),
            single_use_only: false,
        }
    }
}

impl DurationPolicy {
    pub fn allows(&self, duration: Duration, code_type: CodeType) -> bool {
        if self.single_use_only && code_type == CodeType::LongLived {
            return false;
        }
        duration >= self.min_duration && duration <= self.max_duration
    }
}

/// Outbox event for async delivery (e.g. visitor arrival push).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub idempotency_key: String,
}

/// Access code length in characters.
pub const CODE_LEN: usize = 6;

/// Attempts at generating a unique code before giving up. With a 31-character
/// alphabet at length 6 a collision streak this long is practically
/// unreachable.
pub const MAX_CODE_ATTEMPTS: u32 = 5;
