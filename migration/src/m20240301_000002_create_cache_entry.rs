use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CacheEntry::Table)
                    .if_not_exists()
                    .col(string(CacheEntry::Key).primary_key())
                    .col(string(CacheEntry::Version))
                    .col(text(CacheEntry::Value))
                    .col(big_integer(CacheEntry::CachedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(CacheEntry::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum CacheEntry {
    Table,
    Key,
    Version,
    Value,
    CachedAt,
}
