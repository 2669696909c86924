use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccessCodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccessCodes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccessCodes::EstateId).uuid().not_null())
                    .col(ColumnDef::new(AccessCodes::IssuedBy).uuid().not_null())
                    .col(ColumnDef::new(AccessCodes::Code).string().not_null())
                    .col(ColumnDef::new(AccessCodes::CodeType).string().not_null())
                    .col(ColumnDef::new(AccessCodes::Status).string().not_null())
                    .col(ColumnDef::new(AccessCodes::VisitorName).string())
                    .col(ColumnDef::new(AccessCodes::VisitorPhone).string())
                    .col(ColumnDef::new(AccessCodes::Purpose).string())
                    .col(ColumnDef::new(AccessCodes::Notes).string())
                    .col(ColumnDef::new(AccessCodes::VerifiedBy).uuid())
                    .col(
                        ColumnDef::new(AccessCodes::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccessCodes::UsedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(AccessCodes::RevokedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(AccessCodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Per-estate uniqueness of the human-entered code string. Creation
        // retries with a fresh code on violation.
        manager
            .create_index(
                Index::create()
                    .table(AccessCodes::Table)
                    .col(AccessCodes::EstateId)
                    .col(AccessCodes::Code)
                    .unique()
                    .name("idx_access_codes_estate_id_code")
                    .to_owned(),
            )
            .await?;

        // Sweeper scan: active codes past their expiry.
        manager
            .create_index(
                Index::create()
                    .table(AccessCodes::Table)
                    .col(AccessCodes::Status)
                    .col(AccessCodes::ExpiresAt)
                    .name("idx_access_codes_status_expires_at")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(AccessCodes::Table)
                    .col(AccessCodes::EstateId)
                    .col(AccessCodes::IssuedBy)
                    .name("idx_access_codes_estate_id_issued_by")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccessCodes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AccessCodes {
    Table,
    Id,
    EstateId,
    IssuedBy,
    Code,
    CodeType,
    Status,
    VisitorName,
    VisitorPhone,
    Purpose,
    Notes,
    VerifiedBy,
    ExpiresAt,
    UsedAt,
    RevokedAt,
    CreatedAt,
}
