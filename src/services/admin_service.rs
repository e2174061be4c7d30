//! Read-only management views over the caller's own records.

use chrono::{Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::db::{AuditEntry, Store, format_timestamp};
use crate::domain::{ItemId, Money, UserId};

pub const AUDIT_LOG_LIMIT: u64 = 100;
pub const ACTIVITY_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_items: u64,
    /// Always 1. Admin scope never reaches other accounts.
    pub total_users: u64,
    pub total_revenue: Money,
    /// Audit entries in the last 24 hours
    pub recent_activity: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogView {
    pub id: i32,
    pub action: String,
    pub details: String,
    pub ip_address: String,
    pub user_agent: String,
    pub related_item_id: Option<ItemId>,
    pub related_item_title: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityBucket {
    /// `YYYY-MM-DD` (UTC)
    pub date: String,
    pub action: String,
    pub count: u64,
}

#[derive(Clone)]
pub struct AdminService {
    store: Store,
}

impl AdminService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn stats(&self, user_id: UserId) -> anyhow::Result<AdminStats> {
        let items = self.store.item_repo();
        let since = format_timestamp(Utc::now() - Duration::hours(24));

        Ok(AdminStats {
            total_items: items.count_for_user(user_id).await?,
            total_users: 1,
            total_revenue: items.revenue_for_user(user_id).await?,
            recent_activity: self
                .store
                .audit_repo()
                .count_for_user_since(user_id, &since)
                .await?,
        })
    }

    /// Newest first, with the related item title when it still exists.
    pub async fn audit_logs(&self, user_id: UserId) -> anyhow::Result<Vec<AuditLogView>> {
        let entries = self
            .store
            .audit_repo()
            .recent_for_user(user_id, AUDIT_LOG_LIMIT)
            .await?;

        let item_ids: Vec<i32> = entries.iter().filter_map(|e| e.related_item_id).collect();
        let titles = self
            .store
            .item_repo()
            .titles_for_user(user_id, &item_ids)
            .await?;

        Ok(entries
            .into_iter()
            .map(|e| AuditLogView {
                related_item_title: e.related_item_id.and_then(|id| titles.get(&id).cloned()),
                id: e.id,
                action: e.action,
                details: e.details,
                ip_address: e.ip_address,
                user_agent: e.user_agent,
                related_item_id: e.related_item_id.map(ItemId::new),
                created_at: e.created_at,
            })
            .collect())
    }

    /// Last 30 days grouped by day and action, oldest day first.
    pub async fn user_activity(&self, user_id: UserId) -> anyhow::Result<Vec<ActivityBucket>> {
        let since = format_timestamp(Utc::now() - Duration::days(ACTIVITY_WINDOW_DAYS));
        let entries = self
            .store
            .audit_repo()
            .for_user_since(user_id, &since)
            .await?;

        Ok(group_activity(&entries))
    }
}

fn group_activity(entries: &[AuditEntry]) -> Vec<ActivityBucket> {
    let mut buckets: BTreeMap<(String, String), u64> = BTreeMap::new();
    for entry in entries {
        let date = entry.created_at.get(..10).unwrap_or(&entry.created_at);
        *buckets
            .entry((date.to_string(), entry.action.clone()))
            .or_default() += 1;
    }

    buckets
        .into_iter()
        .map(|((date, action), count)| ActivityBucket {
            date,
            action,
            count,
        })
        .collect()
}
