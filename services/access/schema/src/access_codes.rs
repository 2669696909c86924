use sea_orm::entity::prelude::*;

/// Visitor access code issued by a resident, validated at the estate gate.
/// `code` is unique per estate; `status` and `code_type` are stored as
/// strings and parsed into domain enums at the infra boundary.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "access_codes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub estate_id: Uuid,
    pub issued_by: Uuid,
    pub code: String,
    pub code_type: String,
    pub status: String,
    pub visitor_name: Option<String>,
    pub visitor_phone: Option<String>,
    pub purpose: Option<String>,
    pub notes: Option<String>,
    pub verified_by: Option<Uuid>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub used_at: Option<chrono::DateTime<chrono::Utc>>,
    pub revoked_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
