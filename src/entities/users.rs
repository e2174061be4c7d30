use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    /// Trimmed and lowercased
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub phone: Option<String>,

    pub avatar: Option<String>,

    pub billing_street: Option<String>,

    pub billing_city: Option<String>,

    pub billing_state: Option<String>,

    pub billing_zip_code: Option<String>,

    pub billing_country: Option<String>,

    pub is_admin_registered: bool,

    /// Argon2id hash of the one-time admin secret. Written once.
    pub admin_secret_hash: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::items::Entity")]
    Items,
}

impl Related<super::items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
