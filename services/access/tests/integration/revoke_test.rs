use chrono::Duration;
use uuid::Uuid;

use gatekeeper_access::domain::types::{CodeStatus, CodeType, DenyReason, ValidationOutcome};
use gatekeeper_access::error::AccessServiceError;
use gatekeeper_access::usecase::revoke::{RevokeAccessCodeInput, RevokeAccessCodeUseCase};
use gatekeeper_access::usecase::validate::ValidateAccessCodeUseCase;

use crate::helpers::{MockAccessCodeRepo, active_code, estate_a, estate_b};

fn input_for(code_id: Uuid, actor_id: Uuid) -> RevokeAccessCodeInput {
    RevokeAccessCodeInput {
        code_id,
        actor_id,
        actor_is_admin: false,
    }
}

#[tokio::test]
async fn should_revoke_active_code_as_issuer() {
    let code = active_code(estate_a(), CodeType::SingleUse, Duration::hours(1));
    let code_id = code.id;
    let issuer = code.issued_by;
    let repo = MockAccessCodeRepo::new(vec![code]);

    let uc = RevokeAccessCodeUseCase { repo: repo.clone() };
    let revoked = uc
        .execute(estate_a(), input_for(code_id, issuer))
        .await
        .unwrap();

    assert_eq!(revoked.status, CodeStatus::Revoked);
    assert!(revoked.revoked_at.is_some());
    assert_eq!(repo.stored(code_id).status, CodeStatus::Revoked);
}

#[tokio::test]
async fn should_not_find_code_from_another_estate() {
    let code = active_code(estate_b(), CodeType::SingleUse, Duration::hours(1));
    let code_id = code.id;
    let issuer = code.issued_by;
    let repo = MockAccessCodeRepo::new(vec![code]);

    let uc = RevokeAccessCodeUseCase { repo };
    let result = uc.execute(estate_a(), input_for(code_id, issuer)).await;
    assert!(
        matches!(result, Err(AccessServiceError::NotFound)),
        "expected NotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_forbid_revocation_by_non_issuer() {
    let code = active_code(estate_a(), CodeType::SingleUse, Duration::hours(1));
    let code_id = code.id;
    let repo = MockAccessCodeRepo::new(vec![code]);

    let uc = RevokeAccessCodeUseCase { repo: repo.clone() };
    let result = uc
        .execute(estate_a(), input_for(code_id, Uuid::new_v4()))
        .await;
    assert!(
        matches!(result, Err(AccessServiceError::Forbidden)),
        "expected Forbidden, got {result:?}"
    );
    assert_eq!(repo.stored(code_id).status, CodeStatus::Active);
}

#[tokio::test]
async fn should_allow_admin_to_revoke_another_residents_code() {
    let code = active_code(estate_a(), CodeType::SingleUse, Duration::hours(1));
    let code_id = code.id;
    let repo = MockAccessCodeRepo::new(vec![code]);

    let uc = RevokeAccessCodeUseCase { repo: repo.clone() };
    let revoked = uc
        .execute(
            estate_a(),
            RevokeAccessCodeInput {
                code_id,
                actor_id: Uuid::new_v4(),
                actor_is_admin: true,
            },
        )
        .await
        .unwrap();

    assert_eq!(revoked.status, CodeStatus::Revoked);
}

#[tokio::test]
async fn should_reject_revoking_used_code() {
    let mut code = active_code(estate_a(), CodeType::SingleUse, Duration::hours(1));
    code.status = CodeStatus::Used;
    let code_id = code.id;
    let issuer = code.issued_by;
    let repo = MockAccessCodeRepo::new(vec![code]);

    let uc = RevokeAccessCodeUseCase { repo };
    let result = uc.execute(estate_a(), input_for(code_id, issuer)).await;
    assert!(
        matches!(result, Err(AccessServiceError::AlreadyTerminal)),
        "expected AlreadyTerminal, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_revoking_derived_expired_code_and_materialize_expiry() {
    // Stored Active but past its window: revocation must not rewrite history,
    // and the derived expiry gets cached on the way out.
    let code = active_code(estate_a(), CodeType::SingleUse, Duration::minutes(-5));
    let code_id = code.id;
    let issuer = code.issued_by;
    let repo = MockAccessCodeRepo::new(vec![code]);

    let uc = RevokeAccessCodeUseCase { repo: repo.clone() };
    let result = uc.execute(estate_a(), input_for(code_id, issuer)).await;
    assert!(
        matches!(result, Err(AccessServiceError::AlreadyTerminal)),
        "expected AlreadyTerminal, got {result:?}"
    );
    assert_eq!(repo.stored(code_id).status, CodeStatus::Expired);
}

#[tokio::test]
async fn should_deny_validation_after_revocation() {
    let code = active_code(estate_a(), CodeType::SingleUse, Duration::hours(1));
    let code_id = code.id;
    let issuer = code.issued_by;
    let repo = MockAccessCodeRepo::new(vec![code]);

    RevokeAccessCodeUseCase { repo: repo.clone() }
        .execute(estate_a(), input_for(code_id, issuer))
        .await
        .unwrap();

    let outcome = ValidateAccessCodeUseCase { repo }
        .execute(estate_a(), Uuid::new_v4(), "ABC234")
        .await
        .unwrap();
    match outcome {
        ValidationOutcome::Denied { reason } => assert_eq!(reason, DenyReason::Revoked),
        ValidationOutcome::Granted { .. } => panic!("revoked code must not grant"),
    }
}
