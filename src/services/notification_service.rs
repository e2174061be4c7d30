//! Inbox of notifications produced alongside audit entries.

use serde::Serialize;

use crate::db::{Notification, Store};
use crate::domain::{ItemId, NotificationKind, UserId};

pub const INBOX_LIMIT: u64 = 50;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: i32,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub read: bool,
    pub related_item_id: Option<ItemId>,
    /// Title of the related item while it still exists
    pub related_item_title: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbox {
    pub notifications: Vec<NotificationView>,
    pub unread_count: u64,
}

#[derive(Clone)]
pub struct NotificationService {
    store: Store,
}

impl NotificationService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn inbox(&self, user_id: UserId) -> anyhow::Result<Inbox> {
        let repo = self.store.notification_repo();
        let rows = repo.list_for_user(user_id, INBOX_LIMIT).await?;
        let unread_count = repo.unread_count(user_id).await?;

        let item_ids: Vec<i32> = rows.iter().filter_map(|n| n.related_item_id).collect();
        let titles = self
            .store
            .item_repo()
            .titles_for_user(user_id, &item_ids)
            .await?;

        let notifications = rows
            .into_iter()
            .map(|n| {
                let related_item_title = n.related_item_id.and_then(|id| titles.get(&id).cloned());
                to_view(n, related_item_title)
            })
            .collect();

        Ok(Inbox {
            notifications,
            unread_count,
        })
    }

    /// `None` when the notification does not belong to `user_id`.
    pub async fn mark_read(&self, user_id: UserId, id: i32) -> anyhow::Result<Option<NotificationView>> {
        let updated = self.store.notification_repo().mark_read(id, user_id).await?;
        Ok(updated.map(|n| to_view(n, None)))
    }

    pub async fn mark_all_read(&self, user_id: UserId) -> anyhow::Result<u64> {
        self.store.notification_repo().mark_all_read(user_id).await
    }

    /// `false` when the notification does not belong to `user_id`.
    pub async fn delete(&self, user_id: UserId, id: i32) -> anyhow::Result<bool> {
        self.store.notification_repo().delete_for_user(id, user_id).await
    }
}

fn to_view(n: Notification, related_item_title: Option<String>) -> NotificationView {
    NotificationView {
        id: n.id,
        message: n.message,
        kind: n.kind.parse().unwrap_or(NotificationKind::Info),
        read: n.read,
        related_item_id: n.related_item_id.map(ItemId::new),
        related_item_title,
        created_at: n.created_at,
    }
}
