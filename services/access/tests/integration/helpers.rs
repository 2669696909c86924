use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use gatekeeper_access::domain::repository::{AccessCodeRepository, PolicyPort};
use gatekeeper_access::domain::types::{
    AccessCode, CodeStatus, CodeType, DurationPolicy, OutboxEvent, StatusChange,
};
use gatekeeper_access::error::AccessServiceError;
use gatekeeper_core::pagination::PageRequest;

// ── MockAccessCodeRepo ───────────────────────────────────────────────────────

/// In-memory repository. All status transitions happen under one mutex, so
/// the compare-and-transition contract holds across concurrently spawned
/// tasks exactly as a conditional UPDATE would.
#[derive(Clone)]
pub struct MockAccessCodeRepo {
    pub codes: Arc<Mutex<Vec<AccessCode>>>,
    pub events: Arc<Mutex<Vec<OutboxEvent>>>,
    /// Number of upcoming `create_with_outbox` calls that report a duplicate.
    pub duplicates_remaining: Arc<Mutex<u32>>,
}

impl MockAccessCodeRepo {
    pub fn new(codes: Vec<AccessCode>) -> Self {
        Self {
            codes: Arc::new(Mutex::new(codes)),
            events: Arc::new(Mutex::new(vec![])),
            duplicates_remaining: Arc::new(Mutex::new(0)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn with_duplicates(duplicates: u32) -> Self {
        let repo = Self::empty();
        *repo.duplicates_remaining.lock().unwrap() = duplicates;
        repo
    }

    pub fn codes_handle(&self) -> Arc<Mutex<Vec<AccessCode>>> {
        Arc::clone(&self.codes)
    }

    pub fn events_handle(&self) -> Arc<Mutex<Vec<OutboxEvent>>> {
        Arc::clone(&self.events)
    }

    pub fn stored(&self, id: Uuid) -> AccessCode {
        self.codes
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .expect("code not in mock store")
    }

    fn apply_if_expected(
        &self,
        estate_id: Uuid,
        id: Uuid,
        expected: CodeStatus,
        change: &StatusChange,
        event: Option<&OutboxEvent>,
    ) -> Result<bool, AccessServiceError> {
        let mut codes = self.codes.lock().unwrap();
        let Some(code) = codes
            .iter_mut()
            .find(|c| c.estate_id == estate_id && c.id == id)
        else {
            return Ok(false);
        };
        if code.status != expected {
            return Ok(false);
        }
        if let Some(event) = event {
            // Unique key enforced like the real table would; a violation
            // rolls the whole transaction back, status change included.
            let mut events = self.events.lock().unwrap();
            if events
                .iter()
                .any(|e| e.idempotency_key == event.idempotency_key)
            {
                return Err(AccessServiceError::Internal(anyhow::anyhow!(
                    "duplicate idempotency key"
                )));
            }
            code.apply(change);
            events.push(event.clone());
        } else {
            code.apply(change);
        }
        Ok(true)
    }
}

impl AccessCodeRepository for MockAccessCodeRepo {
    async fn create_with_outbox(
        &self,
        code: &AccessCode,
        event: &OutboxEvent,
    ) -> Result<(), AccessServiceError> {
        {
            let mut duplicates = self.duplicates_remaining.lock().unwrap();
            if *duplicates > 0 {
                *duplicates -= 1;
                return Err(AccessServiceError::DuplicateCode);
            }
        }
        let mut codes = self.codes.lock().unwrap();
        if codes
            .iter()
            .any(|c| c.estate_id == code.estate_id && c.code == code.code)
        {
            return Err(AccessServiceError::DuplicateCode);
        }
        let mut events = self.events.lock().unwrap();
        if events
            .iter()
            .any(|e| e.idempotency_key == event.idempotency_key)
        {
            return Err(AccessServiceError::Internal(anyhow::anyhow!(
                "duplicate idempotency key"
            )));
        }
        codes.push(code.clone());
        events.push(event.clone());
        Ok(())
    }

    async fn find_by_code(
        &self,
        estate_id: Uuid,
        code: &str,
    ) -> Result<Option<AccessCode>, AccessServiceError> {
        Ok(self
            .codes
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.estate_id == estate_id && c.code == code)
            .cloned())
    }

    async fn find_by_id(
        &self,
        estate_id: Uuid,
        id: Uuid,
    ) -> Result<Option<AccessCode>, AccessServiceError> {
        Ok(self
            .codes
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.estate_id == estate_id && c.id == id)
            .cloned())
    }

    async fn list_by_issuer(
        &self,
        estate_id: Uuid,
        issuer: Uuid,
        _page: PageRequest,
    ) -> Result<Vec<AccessCode>, AccessServiceError> {
        Ok(self
            .codes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.estate_id == estate_id && c.issued_by == issuer)
            .cloned()
            .collect())
    }

    async fn transition(
        &self,
        estate_id: Uuid,
        id: Uuid,
        expected: CodeStatus,
        change: &StatusChange,
    ) -> Result<bool, AccessServiceError> {
        self.apply_if_expected(estate_id, id, expected, change, None)
    }

    async fn transition_with_outbox(
        &self,
        estate_id: Uuid,
        id: Uuid,
        expected: CodeStatus,
        change: &StatusChange,
        event: &OutboxEvent,
    ) -> Result<bool, AccessServiceError> {
        self.apply_if_expected(estate_id, id, expected, change, Some(event))
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, AccessServiceError> {
        let mut codes = self.codes.lock().unwrap();
        let mut updated = 0;
        for code in codes.iter_mut() {
            if code.status == CodeStatus::Active && code.is_expired(now) {
                code.status = CodeStatus::Expired;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn purge_resolved(&self, cutoff: DateTime<Utc>) -> Result<u64, AccessServiceError> {
        let mut codes = self.codes.lock().unwrap();
        let before = codes.len();
        codes.retain(|c| {
            !(matches!(
                c.status,
                CodeStatus::Used | CodeStatus::Expired | CodeStatus::Revoked
            ) && c.expires_at < cutoff)
        });
        Ok((before - codes.len()) as u64)
    }
}

// ── MockPolicyPort ───────────────────────────────────────────────────────────

pub struct MockPolicyPort {
    pub policy: DurationPolicy,
}

impl MockPolicyPort {
    pub fn defaults() -> Self {
        Self {
            policy: DurationPolicy::default(),
        }
    }
}

impl PolicyPort for MockPolicyPort {
    async fn policy_for(&self, _estate_id: Uuid) -> Result<DurationPolicy, AccessServiceError> {
        Ok(self.policy.clone())
    }
}

// ── Test fixture helpers ─────────────────────────────────────────────────────

pub fn estate_a() -> Uuid {
    Uuid::parse_str("00000000-0000-0000-0000-00000000000a").unwrap()
}

pub fn estate_b() -> Uuid {
    Uuid::parse_str("00000000-0000-0000-0000-00000000000b").unwrap()
}

pub fn active_code(estate_id: Uuid, code_type: CodeType, expires_in: Duration) -> AccessCode {
    let now = Utc::now();
    AccessCode {
        id: Uuid::new_v4(),
        estate_id,
        issued_by: Uuid::new_v4(),
        code: "ABC234".to_owned(),
        code_type,
        status: CodeStatus::Active,
        visitor_name: Some("Ada Visitor".to_owned()),
        visitor_phone: Some("+15550100".to_owned()),
        purpose: Some("delivery".to_owned()),
        notes: None,
        verified_by: None,
        expires_at: now + expires_in,
        used_at: None,
        revoked_at: None,
        created_at: now,
    }
}
