use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "global_blocks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Normalized target: address, CIDR range or canonical user name
    #[sea_orm(unique)]
    pub address: String,

    /// Set for user blocks only
    pub target_central_id: Option<i32>,

    pub by_name: String,
    pub by_central_id: Option<i32>,
    pub by_site: String,

    pub reason: String,
    pub created_at: DateTime<Utc>,

    /// NULL for blocks that never expire
    pub expires_at: Option<DateTime<Utc>>,

    pub anon_only: bool,

    /// Encoded inclusive bounds, empty for user blocks
    pub range_start: String,
    pub range_end: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
