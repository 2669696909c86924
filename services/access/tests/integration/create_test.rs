use chrono::Duration;
use uuid::Uuid;

use gatekeeper_access::domain::types::{CODE_LEN, CodeStatus, CodeType, DurationPolicy};
use gatekeeper_access::error::AccessServiceError;
use gatekeeper_access::usecase::create::{CreateAccessCodeInput, CreateAccessCodeUseCase};

use crate::helpers::{MockAccessCodeRepo, MockPolicyPort, estate_a};

fn input(code_type: CodeType, duration_minutes: i64) -> CreateAccessCodeInput {
    CreateAccessCodeInput {
        code_type,
        duration_minutes,
        visitor_name: Some("Ada Visitor".to_owned()),
        visitor_phone: None,
        purpose: Some("delivery".to_owned()),
        notes: None,
    }
}

#[tokio::test]
async fn should_create_active_code_with_expiry_from_duration() {
    let repo = MockAccessCodeRepo::empty();
    let codes = repo.codes_handle();
    let events = repo.events_handle();
    let issuer = Uuid::new_v4();

    let uc = CreateAccessCodeUseCase {
        repo,
        policies: MockPolicyPort::defaults(),
    };
    let code = uc
        .execute(
            estate_a(),
            issuer,
            input(CodeType::SingleUse, 60),
        )
        .await
        .unwrap();

    assert_eq!(code.status, CodeStatus::Active);
    assert_eq!(code.estate_id, estate_a());
    assert_eq!(code.issued_by, issuer);
    assert_eq!(code.code.len(), CODE_LEN);
    assert_eq!(code.expires_at, code.created_at + Duration::minutes(60));
    assert!(code.used_at.is_none());
    assert!(code.verified_by.is_none());

    let stored = codes.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, code.id);

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, "access_code_created");
    assert_eq!(
        events[0].idempotency_key,
        format!("access_code_created:{}", code.id)
    );
}

#[tokio::test]
async fn should_reject_duration_below_policy_minimum() {
    let uc = CreateAccessCodeUseCase {
        repo: MockAccessCodeRepo::empty(),
        policies: MockPolicyPort::defaults(),
    };
    let result = uc
        .execute(
            estate_a(),
            Uuid::new_v4(),
            input(CodeType::SingleUse, 1),
        )
        .await;
    assert!(
        matches!(result, Err(AccessServiceError::InvalidDuration)),
        "expected InvalidDuration, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_duration_above_policy_maximum() {
    let uc = CreateAccessCodeUseCase {
        repo: MockAccessCodeRepo::empty(),
        policies: MockPolicyPort::defaults(),
    };
    let result = uc
        .execute(
            estate_a(),
            Uuid::new_v4(),
            input(CodeType::SingleUse, 30 * 24 * 60),
        )
        .await;
    assert!(
        matches!(result, Err(AccessServiceError::InvalidDuration)),
        "expected InvalidDuration, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_duration_beyond_chrono_range_without_panicking() {
    // A well-formed request body may carry any i64; magnitudes chrono cannot
    // represent must come back as InvalidDuration, not unwind the task.
    let uc = CreateAccessCodeUseCase {
        repo: MockAccessCodeRepo::empty(),
        policies: MockPolicyPort::defaults(),
    };
    for minutes in [i64::MAX, i64::MIN] {
        let result = uc
            .execute(
                estate_a(),
                Uuid::new_v4(),
                input(CodeType::SingleUse, minutes),
            )
            .await;
        assert!(
            matches!(result, Err(AccessServiceError::InvalidDuration)),
            "expected InvalidDuration for {minutes}, got {result:?}"
        );
    }
}

#[tokio::test]
async fn should_reject_long_lived_when_policy_requires_single_use() {
    let uc = CreateAccessCodeUseCase {
        repo: MockAccessCodeRepo::empty(),
        policies: MockPolicyPort {
            policy: DurationPolicy {
                single_use_only: true,
                ..Default::default()
            },
        },
    };
    let result = uc
        .execute(
            estate_a(),
            Uuid::new_v4(),
            input(CodeType::LongLived, 60),
        )
        .await;
    assert!(
        matches!(result, Err(AccessServiceError::InvalidDuration)),
        "expected InvalidDuration, got {result:?}"
    );
}

#[tokio::test]
async fn should_retry_generation_when_code_collides() {
    let repo = MockAccessCodeRepo::with_duplicates(2);
    let codes = repo.codes_handle();

    let uc = CreateAccessCodeUseCase {
        repo,
        policies: MockPolicyPort::defaults(),
    };
    let code = uc
        .execute(
            estate_a(),
            Uuid::new_v4(),
            input(CodeType::SingleUse, 60),
        )
        .await
        .unwrap();

    assert_eq!(code.status, CodeStatus::Active);
    assert_eq!(codes.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_surface_code_space_exhausted_after_bounded_retries() {
    // Every insert reports a collision; the creation loop must give up
    // rather than spin.
    let repo = MockAccessCodeRepo::with_duplicates(u32::MAX);

    let uc = CreateAccessCodeUseCase {
        repo,
        policies: MockPolicyPort::defaults(),
    };
    let result = uc
        .execute(
            estate_a(),
            Uuid::new_v4(),
            input(CodeType::SingleUse, 60),
        )
        .await;
    assert!(
        matches!(result, Err(AccessServiceError::CodeSpaceExhausted)),
        "expected CodeSpaceExhausted, got {result:?}"
    );
}
