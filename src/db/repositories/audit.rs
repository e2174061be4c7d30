use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::db::now_timestamp;
use crate::domain::{AuditAction, ItemId, UserId};
use crate::entities::audit_logs;

pub type AuditEntry = audit_logs::Model;

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub user_id: UserId,
    pub action: AuditAction,
    pub details: String,
    pub ip_address: String,
    pub user_agent: String,
    pub related_item_id: Option<ItemId>,
}

pub struct AuditRepository {
    conn: DatabaseConnection,
}

impl AuditRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, entry: NewAuditEntry) -> Result<AuditEntry> {
        let active = audit_logs::ActiveModel {
            user_id: Set(entry.user_id.value()),
            action: Set(entry.action.as_str().to_string()),
            details: Set(entry.details),
            ip_address: Set(entry.ip_address),
            user_agent: Set(entry.user_agent),
            related_item_id: Set(entry.related_item_id.map(|id| id.value())),
            created_at: Set(now_timestamp()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert audit entry")
    }

    /// Newest first
    pub async fn recent_for_user(&self, user_id: UserId, limit: u64) -> Result<Vec<AuditEntry>> {
        audit_logs::Entity::find()
            .filter(audit_logs::Column::UserId.eq(user_id.value()))
            .order_by_desc(audit_logs::Column::CreatedAt)
            .order_by_desc(audit_logs::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query audit entries")
    }

    /// Oldest first, from `since` (inclusive)
    pub async fn for_user_since(&self, user_id: UserId, since: &str) -> Result<Vec<AuditEntry>> {
        audit_logs::Entity::find()
            .filter(audit_logs::Column::UserId.eq(user_id.value()))
            .filter(audit_logs::Column::CreatedAt.gte(since))
            .order_by_asc(audit_logs::Column::CreatedAt)
            .order_by_asc(audit_logs::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query audit entries")
    }

    pub async fn count_for_user_since(&self, user_id: UserId, since: &str) -> Result<u64> {
        audit_logs::Entity::find()
            .filter(audit_logs::Column::UserId.eq(user_id.value()))
            .filter(audit_logs::Column::CreatedAt.gte(since))
            .count(&self.conn)
            .await
            .context("Failed to count audit entries")
    }

    pub async fn for_item(&self, user_id: UserId, item_id: ItemId) -> Result<Vec<AuditEntry>> {
        audit_logs::Entity::find()
            .filter(audit_logs::Column::UserId.eq(user_id.value()))
            .filter(audit_logs::Column::RelatedItemId.eq(item_id.value()))
            .order_by_asc(audit_logs::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query audit entries for item")
    }
}
