use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, sea_query::Expr,
};

use crate::db::now_timestamp;
use crate::domain::{ItemId, NotificationKind, UserId};
use crate::entities::notifications;

pub type Notification = notifications::Model;

pub struct NotificationRepository {
    conn: DatabaseConnection,
}

impl NotificationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &self,
        user_id: UserId,
        message: String,
        kind: NotificationKind,
        related_item_id: Option<ItemId>,
    ) -> Result<Notification> {
        let active = notifications::ActiveModel {
            user_id: Set(user_id.value()),
            message: Set(message),
            kind: Set(kind.as_str().to_string()),
            read: Set(false),
            related_item_id: Set(related_item_id.map(|id| id.value())),
            created_at: Set(now_timestamp()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert notification")
    }

    /// Newest first
    pub async fn list_for_user(&self, user_id: UserId, limit: u64) -> Result<Vec<Notification>> {
        notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id.value()))
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_desc(notifications::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list notifications")
    }

    pub async fn unread_count(&self, user_id: UserId) -> Result<u64> {
        notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id.value()))
            .filter(notifications::Column::Read.eq(false))
            .count(&self.conn)
            .await
            .context("Failed to count unread notifications")
    }

    pub async fn mark_read(&self, id: i32, user_id: UserId) -> Result<Option<Notification>> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::Read, Expr::value(true))
            .filter(notifications::Column::Id.eq(id))
            .filter(notifications::Column::UserId.eq(user_id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to mark notification read")?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        notifications::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to reload notification")
    }

    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::Read, Expr::value(true))
            .filter(notifications::Column::UserId.eq(user_id.value()))
            .filter(notifications::Column::Read.eq(false))
            .exec(&self.conn)
            .await
            .context("Failed to mark notifications read")?;

        Ok(result.rows_affected)
    }

    pub async fn delete_for_user(&self, id: i32, user_id: UserId) -> Result<bool> {
        let result = notifications::Entity::delete_many()
            .filter(notifications::Column::Id.eq(id))
            .filter(notifications::Column::UserId.eq(user_id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to delete notification")?;

        Ok(result.rows_affected > 0)
    }
}
