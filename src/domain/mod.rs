//! Domain types for invoicing with strong typing.
//!
//! Identifiers follow the newtype pattern so user ids and item ids cannot be
//! swapped at call sites. Status and tag enums carry their wire spelling.

pub mod money;

pub use money::{Money, MoneyError};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn value(&self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self::new(id)
            }
        }
    };
}

entity_id!(
    /// Identifier of an account. Every item, audit entry and notification
    /// belongs to exactly one.
    UserId
);

entity_id!(
    /// Identifier of an invoiceable item.
    ItemId
);

/// Payment state of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Pending,
    Paid,
    Unpaid,
}

impl ItemStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Unpaid => "unpaid",
        }
    }

    /// Human readable label used on invoices and emails.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
            Self::Unpaid => "Unpaid",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "unpaid" => Ok(Self::Unpaid),
            other => Err(format!("Unknown item status: {other}")),
        }
    }
}

/// Severity attached to an inbox notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "success" => Ok(Self::Success),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(format!("Unknown notification type: {other}")),
        }
    }
}

/// Tag recorded on every audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    UserRegistered,
    UserLogin,
    ProfileUpdated,
    PasswordChanged,
    AvatarUpdated,
    AdminRegistered,
    AdminLogin,
    ItemCreated,
    ItemUpdated,
    ItemDeleted,
    AdminItemDeleted,
    InvoiceGenerated,
    EmailSent,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UserRegistered => "USER_REGISTERED",
            Self::UserLogin => "USER_LOGIN",
            Self::ProfileUpdated => "PROFILE_UPDATED",
            Self::PasswordChanged => "PASSWORD_CHANGED",
            Self::AvatarUpdated => "AVATAR_UPDATED",
            Self::AdminRegistered => "ADMIN_REGISTERED",
            Self::AdminLogin => "ADMIN_LOGIN",
            Self::ItemCreated => "ITEM_CREATED",
            Self::ItemUpdated => "ITEM_UPDATED",
            Self::ItemDeleted => "ITEM_DELETED",
            Self::AdminItemDeleted => "ADMIN_ITEM_DELETED",
            Self::InvoiceGenerated => "INVOICE_GENERATED",
            Self::EmailSent => "EMAIL_SENT",
        }
    }

    /// Severity of the inbox notification that accompanies the entry.
    #[must_use]
    pub const fn notification_kind(&self) -> NotificationKind {
        match self {
            Self::UserRegistered
            | Self::ProfileUpdated
            | Self::PasswordChanged
            | Self::AvatarUpdated
            | Self::AdminRegistered
            | Self::ItemCreated
            | Self::ItemUpdated
            | Self::InvoiceGenerated
            | Self::EmailSent => NotificationKind::Success,
            Self::UserLogin | Self::AdminLogin | Self::ItemDeleted => NotificationKind::Info,
            Self::AdminItemDeleted => NotificationKind::Warning,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Postal address printed in the issuer block of an invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

impl BillingAddress {
    /// Drops blank components so they fall back to placeholders downstream.
    #[must_use]
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            street: clean(self.street),
            city: clean(self.city),
            state: clean(self.state),
            zip_code: clean(self.zip_code),
            country: clean(self.country),
        }
    }
}

/// Where a request came from. Recorded on every audit entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
}

/// An authenticated caller plus the client it used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: UserId,
    pub client: ClientInfo,
}

impl RequestContext {
    #[must_use]
    pub const fn new(user_id: UserId, client: ClientInfo) -> Self {
        Self { user_id, client }
    }
}
