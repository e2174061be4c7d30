use sea_orm::entity::prelude::*;

/// Append-only. `related_item_id` is a plain back-reference so entries
/// outlive the item they describe.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    pub action: String,

    pub details: String,

    pub ip_address: String,

    pub user_agent: String,

    pub related_item_id: Option<i32>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
