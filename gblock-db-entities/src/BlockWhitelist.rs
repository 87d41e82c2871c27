use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A local opt-out from one global block.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "global_block_whitelist")]
pub struct Model {
    /// Id of the suppressed global block
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
