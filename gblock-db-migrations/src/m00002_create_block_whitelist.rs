use sea_orm::Schema;
use sea_orm_migration::prelude::*;

pub mod block_whitelist {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "global_block_whitelist")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i32,
        pub address: String,
        pub target_central_id: Option<i32>,
        pub granted_by: String,
        pub reason: String,
        pub expires_at: Option<DateTime<Utc>>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m00002_create_block_whitelist"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let builder = manager.get_database_backend();
        let schema = Schema::new(builder);

        manager
            .create_table(schema.create_table_from_entity(block_whitelist::Entity))
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(block_whitelist::Entity)
                    .name("idx_global_block_whitelist_address")
                    .col(Alias::new("address"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(block_whitelist::Entity)
                    .name("idx_global_block_whitelist_target_central_id")
                    .col(Alias::new("target_central_id"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(block_whitelist::Entity).to_owned())
            .await
    }
}
