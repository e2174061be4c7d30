pub use super::access_tokens::Entity as AccessTokens;
pub use super::audit_logs::Entity as AuditLogs;
pub use super::items::Entity as Items;
pub use super::notifications::Entity as Notifications;
pub use super::users::Entity as Users;
