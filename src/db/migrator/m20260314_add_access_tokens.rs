use crate::entities::access_tokens;
use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(AccessTokens)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Index on expires_at for the purge job
        manager
            .create_index(
                Index::create()
                    .name("idx_access_tokens_expires_at")
                    .table(AccessTokens)
                    .col(access_tokens::Column::ExpiresAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccessTokens).to_owned())
            .await
    }
}
