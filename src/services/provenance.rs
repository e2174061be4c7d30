//! Audit trail and inbox notifications.
//!
//! Every successful state change is followed by one audit entry and one
//! notification for the acting user. Recording is best effort: a failure here
//! is logged and never turns a completed operation into an error.

use tracing::warn;

use crate::db::{NewAuditEntry, Store};
use crate::domain::{AuditAction, ClientInfo, ItemId, UserId};

/// What happened, with the text for both the audit entry and the inbox.
#[derive(Debug, Clone)]
pub struct ProvenanceEvent {
    pub action: AuditAction,
    pub details: String,
    pub message: String,
    pub related_item: Option<ItemId>,
}

impl ProvenanceEvent {
    #[must_use]
    pub fn new(action: AuditAction, details: impl Into<String>) -> Self {
        let details = details.into();
        Self {
            action,
            message: details.clone(),
            details,
            related_item: None,
        }
    }

    /// Inbox text when it differs from the audit details.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub const fn item(mut self, item: ItemId) -> Self {
        self.related_item = Some(item);
        self
    }
}

#[derive(Clone)]
pub struct ProvenanceLog {
    store: Store,
}

impl ProvenanceLog {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Appends the audit entry, then the notification. Never fails.
    pub async fn record(&self, user_id: UserId, client: &ClientInfo, event: ProvenanceEvent) {
        let kind = event.action.notification_kind();

        let entry = NewAuditEntry {
            user_id,
            action: event.action,
            details: event.details,
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
            related_item_id: event.related_item,
        };

        if let Err(e) = self.store.audit_repo().insert(entry).await {
            warn!(
                user_id = %user_id,
                action = %event.action,
                error = %e,
                "Failed to write audit entry"
            );
            metrics::counter!("provenance_write_failures_total", "kind" => "audit").increment(1);
        }

        if let Err(e) = self
            .store
            .notification_repo()
            .insert(user_id, event.message, kind, event.related_item)
            .await
        {
            warn!(
                user_id = %user_id,
                action = %event.action,
                error = %e,
                "Failed to write notification"
            );
            metrics::counter!("provenance_write_failures_total", "kind" => "notification")
                .increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder() {
        let event = ProvenanceEvent::new(AuditAction::ItemDeleted, "Deleted item: Chair")
            .message("Item \"Chair\" was deleted")
            .item(ItemId::new(4));

        assert_eq!(event.details, "Deleted item: Chair");
        assert_eq!(event.message, "Item \"Chair\" was deleted");
        assert_eq!(event.related_item, Some(ItemId::new(4)));
    }

    #[test]
    fn test_message_defaults_to_details() {
        let event = ProvenanceEvent::new(AuditAction::UserLogin, "User logged in");
        assert_eq!(event.message, "User logged in");
        assert_eq!(event.related_item, None);
    }
}
