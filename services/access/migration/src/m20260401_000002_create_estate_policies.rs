use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EstatePolicies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EstatePolicies::EstateId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EstatePolicies::MinDurationSecs)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EstatePolicies::MaxDurationSecs)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EstatePolicies::SingleUseOnly)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(EstatePolicies::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EstatePolicies::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum EstatePolicies {
    Table,
    EstateId,
    MinDurationSecs,
    MaxDurationSecs,
    SingleUseOnly,
    UpdatedAt,
}
