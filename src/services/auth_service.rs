//! Domain service for accounts, bearer tokens and the admin grant.
//!
//! Handles registration, login, profile changes and the one-time admin secret.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::User;
use crate::domain::{BillingAddress, ClientInfo, RequestContext, UserId};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("Admin already registered for this account")]
    AlreadyRegistered,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub billing_address: Option<BillingAddress>,
}

/// Bearer token plus the account it belongs to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Returned exactly once, on admin registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSecret {
    pub admin_secret: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminGrant {
    pub admin_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] if the email is already taken.
    async fn register(
        &self,
        client: &ClientInfo,
        request: RegisterRequest,
    ) -> Result<AuthSession, AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown email or a
    /// wrong password alike.
    async fn login(
        &self,
        client: &ClientInfo,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError>;

    async fn logout(&self, user_id: UserId, token: &str) -> Result<(), AuthError>;

    /// Resolves a bearer token to its account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] if the token is unknown or expired.
    async fn authenticate(&self, token: &str) -> Result<User, AuthError>;

    /// Checks an elevated grant for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Forbidden`] if the grant is unknown, expired or was
    /// issued to someone else.
    async fn verify_admin_grant(&self, user_id: UserId, grant: &str) -> Result<(), AuthError>;

    async fn me(&self, user_id: UserId) -> Result<User, AuthError>;

    async fn update_profile(
        &self,
        ctx: &RequestContext,
        update: ProfileUpdate,
    ) -> Result<User, AuthError>;

    async fn update_billing_address(
        &self,
        ctx: &RequestContext,
        address: BillingAddress,
    ) -> Result<User, AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is wrong or the
    /// new one is too short or unchanged.
    async fn change_password(
        &self,
        ctx: &RequestContext,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    async fn set_avatar(&self, ctx: &RequestContext, url: String) -> Result<User, AuthError>;

    /// Generates the admin secret. Allowed once per account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AlreadyRegistered`] on every call after the first.
    async fn register_admin(&self, ctx: &RequestContext) -> Result<AdminSecret, AuthError>;

    /// Exchanges the admin secret for a short-lived elevated grant.
    async fn admin_login(&self, ctx: &RequestContext, secret: &str)
    -> Result<AdminGrant, AuthError>;

    async fn admin_logout(&self, user_id: UserId, grant: &str) -> Result<(), AuthError>;
}
