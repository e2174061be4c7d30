pub mod prelude;

pub mod access_tokens;
pub mod audit_logs;
pub mod items;
pub mod notifications;
pub mod users;
