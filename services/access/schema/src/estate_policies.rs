use sea_orm::entity::prelude::*;

/// Per-estate access code policy: duration bounds and whether issued codes
/// must be single-use. Estates without a row fall back to service defaults.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "estate_policies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub estate_id: Uuid,
    pub min_duration_secs: i64,
    pub max_duration_secs: i64,
    pub single_use_only: bool,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
