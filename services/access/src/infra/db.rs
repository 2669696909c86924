use anyhow::Context as _;
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
    TransactionError, TransactionTrait,
};
use uuid::Uuid;

use gatekeeper_access_schema::{access_codes, estate_policies, outbox_events};
use gatekeeper_core::pagination::PageRequest;

use crate::domain::repository::{AccessCodeRepository, PolicyPort};
use crate::domain::types::{
    AccessCode, CodeStatus, CodeType, DurationPolicy, OutboxEvent, StatusChange,
};
use crate::error::AccessServiceError;

// ── AccessCode repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAccessCodeRepository {
    pub db: DatabaseConnection,
}

impl AccessCodeRepository for DbAccessCodeRepository {
    async fn create_with_outbox(
        &self,
        code: &AccessCode,
        event: &OutboxEvent,
    ) -> Result<(), AccessServiceError> {
        let result = self
            .db
            .transaction::<_, (), DbErr>(|txn| {
                let code = code.clone();
                let event = event.clone();
                Box::pin(async move {
                    insert_access_code(txn, &code).await?;
                    insert_outbox_event(txn, &event).await?;
                    Ok(())
                })
            })
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(TransactionError::Transaction(e)) if is_unique_violation(&e) => {
                Err(AccessServiceError::DuplicateCode)
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context("create access code with outbox")
                .into()),
        }
    }

    async fn find_by_code(
        &self,
        estate_id: Uuid,
        code: &str,
    ) -> Result<Option<AccessCode>, AccessServiceError> {
        let model = access_codes::Entity::find()
            .filter(access_codes::Column::EstateId.eq(estate_id))
            .filter(access_codes::Column::Code.eq(code))
            .one(&self.db)
            .await
            .context("find access code by code")?;
        Ok(model.map(access_code_from_model))
    }

    async fn find_by_id(
        &self,
        estate_id: Uuid,
        id: Uuid,
    ) -> Result<Option<AccessCode>, AccessServiceError> {
        let model = access_codes::Entity::find()
            .filter(access_codes::Column::EstateId.eq(estate_id))
            .filter(access_codes::Column::Id.eq(id))
            .one(&self.db)
            .await
            .context("find access code by id")?;
        Ok(model.map(access_code_from_model))
    }

    async fn list_by_issuer(
        &self,
        estate_id: Uuid,
        issuer: Uuid,
        page: PageRequest,
    ) -> Result<Vec<AccessCode>, AccessServiceError> {
        let PageRequest { per_page, page } = page.clamped();
        let models = access_codes::Entity::find()
            .filter(access_codes::Column::EstateId.eq(estate_id))
            .filter(access_codes::Column::IssuedBy.eq(issuer))
            .order_by_desc(access_codes::Column::CreatedAt)
            .offset(((page - 1) * per_page) as u64)
            .limit(per_page as u64)
            .all(&self.db)
            .await
            .context("list access codes by issuer")?;
        Ok(models.into_iter().map(access_code_from_model).collect())
    }

    async fn transition(
        &self,
        estate_id: Uuid,
        id: Uuid,
        expected: CodeStatus,
        change: &StatusChange,
    ) -> Result<bool, AccessServiceError> {
        let rows = conditional_transition(&self.db, estate_id, id, expected, change)
            .await
            .context("transition access code")?;
        Ok(rows == 1)
    }

    async fn transition_with_outbox(
        &self,
        estate_id: Uuid,
        id: Uuid,
        expected: CodeStatus,
        change: &StatusChange,
        event: &OutboxEvent,
    ) -> Result<bool, AccessServiceError> {
        let won = self
            .db
            .transaction::<_, bool, DbErr>(|txn| {
                let change = change.clone();
                let event = event.clone();
                Box::pin(async move {
                    let rows = conditional_transition(txn, estate_id, id, expected, &change).await?;
                    if rows == 0 {
                        // Another writer won; nothing to record.
                        return Ok(false);
                    }
                    insert_outbox_event(txn, &event).await?;
                    Ok(true)
                })
            })
            .await
            .context("transition access code with outbox")?;
        Ok(won)
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, AccessServiceError> {
        let result = access_codes::Entity::update_many()
            .filter(access_codes::Column::Status.eq(CodeStatus::Active.as_db()))
            .filter(access_codes::Column::ExpiresAt.lte(now))
            .col_expr(
                access_codes::Column::Status,
                Expr::value(CodeStatus::Expired.as_db()),
            )
            .exec(&self.db)
            .await
            .context("sweep expired access codes")?;
        Ok(result.rows_affected)
    }

    async fn purge_resolved(&self, cutoff: DateTime<Utc>) -> Result<u64, AccessServiceError> {
        let result = access_codes::Entity::delete_many()
            .filter(access_codes::Column::Status.is_in([
                CodeStatus::Used.as_db(),
                CodeStatus::Expired.as_db(),
                CodeStatus::Revoked.as_db(),
            ]))
            .filter(access_codes::Column::ExpiresAt.lt(cutoff))
            .exec(&self.db)
            .await
            .context("purge resolved access codes")?;
        Ok(result.rows_affected)
    }
}

/// The compare-and-transition primitive: a conditional UPDATE filtered on the
/// expected status, with the affected-row count deciding who won the race.
/// Works on both connections and open transactions.
async fn conditional_transition<C>(
    conn: &C,
    estate_id: Uuid,
    id: Uuid,
    expected: CodeStatus,
    change: &StatusChange,
) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let mut update = access_codes::Entity::update_many()
        .filter(access_codes::Column::EstateId.eq(estate_id))
        .filter(access_codes::Column::Id.eq(id))
        .filter(access_codes::Column::Status.eq(expected.as_db()))
        .col_expr(
            access_codes::Column::Status,
            Expr::value(change.new_status().as_db()),
        );
    match change {
        StatusChange::MarkUsed { verified_by, at } => {
            update = update
                .col_expr(access_codes::Column::UsedAt, Expr::value(*at))
                .col_expr(access_codes::Column::VerifiedBy, Expr::value(*verified_by));
        }
        StatusChange::RecordVerifier { verified_by } => {
            update = update.col_expr(access_codes::Column::VerifiedBy, Expr::value(*verified_by));
        }
        StatusChange::MarkExpired => {}
        StatusChange::Revoke { at } => {
            update = update.col_expr(access_codes::Column::RevokedAt, Expr::value(*at));
        }
    }
    let result = update.exec(conn).await?;
    Ok(result.rows_affected)
}

fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

async fn insert_access_code(
    txn: &DatabaseTransaction,
    code: &AccessCode,
) -> Result<(), DbErr> {
    access_codes::ActiveModel {
        id: Set(code.id),
        estate_id: Set(code.estate_id),
        issued_by: Set(code.issued_by),
        code: Set(code.code.clone()),
        code_type: Set(code.code_type.as_db().to_owned()),
        status: Set(code.status.as_db().to_owned()),
        visitor_name: Set(code.visitor_name.clone()),
        visitor_phone: Set(code.visitor_phone.clone()),
        purpose: Set(code.purpose.clone()),
        notes: Set(code.notes.clone()),
        verified_by: Set(code.verified_by),
        expires_at: Set(code.expires_at),
        used_at: Set(code.used_at),
        revoked_at: Set(code.revoked_at),
        created_at: Set(code.created_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn insert_outbox_event(
    txn: &DatabaseTransaction,
    event: &OutboxEvent,
) -> Result<(), DbErr> {
    let now = Utc::now();
    outbox_events::ActiveModel {
        id: Set(event.id),
        kind: Set(event.kind.clone()),
        payload: Set(event.payload.clone()),
        idempotency_key: Set(event.idempotency_key.clone()),
        attempts: Set(0),
        last_error: Set(None),
        created_at: Set(now),
        next_attempt_at: Set(now),
        processed_at: Set(None),
        failed_at: Set(None),
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn access_code_from_model(model: access_codes::Model) -> AccessCode {
    AccessCode {
        id: model.id,
        estate_id: model.estate_id,
        issued_by: model.issued_by,
        code: model.code,
        // An unrecognized type grants at most once.
        code_type: CodeType::from_db(&model.code_type).unwrap_or(CodeType::SingleUse),
        status: CodeStatus::from_db(&model.status),
        visitor_name: model.visitor_name,
        visitor_phone: model.visitor_phone,
        purpose: model.purpose,
        notes: model.notes,
        verified_by: model.verified_by,
        expires_at: model.expires_at,
        used_at: model.used_at,
        revoked_at: model.revoked_at,
        created_at: model.created_at,
    }
}

// ── Policy port ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbPolicyPort {
    pub db: DatabaseConnection,
}

impl PolicyPort for DbPolicyPort {
    async fn policy_for(&self, estate_id: Uuid) -> Result<DurationPolicy, AccessServiceError> {
        let model = estate_policies::Entity::find_by_id(estate_id)
            .one(&self.db)
            .await
            .context("find estate policy")?;
        Ok(model
            .map(|m| DurationPolicy {
                min_duration: Duration::seconds(m.min_duration_secs),
                max_duration: Duration::seconds(m.max_duration_secs),
                single_use_only: m.single_use_only,
            })
            .unwrap_or_default())
    }
}
