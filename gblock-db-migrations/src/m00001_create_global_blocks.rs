use sea_orm::Schema;
use sea_orm_migration::prelude::*;

pub mod global_block {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "global_blocks")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        #[sea_orm(unique)]
        pub address: String,
        pub target_central_id: Option<i32>,
        pub by_name: String,
        pub by_central_id: Option<i32>,
        pub by_site: String,
        pub reason: String,
        pub created_at: DateTime<Utc>,
        pub expires_at: Option<DateTime<Utc>>,
        pub anon_only: bool,
        pub range_start: String,
        pub range_end: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m00001_create_global_blocks"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let builder = manager.get_database_backend();
        let schema = Schema::new(builder);

        manager
            .create_table(schema.create_table_from_entity(global_block::Entity))
            .await?;

        // Containment lookups compare both bounds
        manager
            .create_index(
                Index::create()
                    .table(global_block::Entity)
                    .name("idx_global_blocks_range")
                    .col(Alias::new("range_start"))
                    .col(Alias::new("range_end"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(global_block::Entity)
                    .name("idx_global_blocks_target_central_id")
                    .col(Alias::new("target_central_id"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(global_block::Entity)
                    .name("idx_global_blocks_expires_at")
                    .col(Alias::new("expires_at"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_global_blocks_expires_at",
            "idx_global_blocks_target_central_id",
            "idx_global_blocks_range",
        ] {
            manager
                .drop_index(
                    Index::drop()
                        .table(global_block::Entity)
                        .name(name)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .drop_table(Table::drop().table(global_block::Entity).to_owned())
            .await
    }
}
