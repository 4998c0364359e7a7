//! Create kv_entry table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(KvEntry::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(KvEntry::Key)
                            .string_len(256)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(KvEntry::Value).json_binary().not_null())
                    .col(
                        ColumnDef::new(KvEntry::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(KvEntry::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum KvEntry {
    Table,
    Key,
    Value,
    UpdatedAt,
}
