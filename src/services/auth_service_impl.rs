//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::Duration;
use tokio::task;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::repositories::user::{generate_secret, hash_password, verify_password};
use crate::db::{ProfileChanges, Store, TokenScope, User};
use crate::domain::{AuditAction, BillingAddress, ClientInfo, RequestContext, UserId};
use crate::services::auth_service::{
    AdminGrant, AdminSecret, AuthError, AuthService, AuthSession, ProfileUpdate, RegisterRequest,
};
use crate::services::provenance::{ProvenanceEvent, ProvenanceLog};
use crate::services::validation::{is_valid_email, non_blank, normalize_email};

pub struct SeaOrmAuthService {
    store: Store,
    provenance: ProvenanceLog,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, security: SecurityConfig) -> Self {
        Self {
            provenance: ProvenanceLog::new(store.clone()),
            store,
            security,
        }
    }

    /// Argon2 is CPU bound, so hashing runs off the async workers.
    async fn hash(&self, secret: String) -> Result<String, AuthError> {
        let config = self.security.clone();
        let hash = task::spawn_blocking(move || hash_password(&secret, &config))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task panicked: {e}")))??;
        Ok(hash)
    }

    async fn verify(&self, hash: String, candidate: String) -> Result<bool, AuthError> {
        let valid = task::spawn_blocking(move || verify_password(&hash, &candidate))
            .await
            .map_err(|e| {
                AuthError::Internal(format!("Password verification task panicked: {e}"))
            })??;
        Ok(valid)
    }

    fn check_password_length(&self, password: &str) -> Result<(), AuthError> {
        let min = self.security.min_password_length;
        if password.chars().count() < min {
            return Err(AuthError::Validation(format!(
                "Password must be at least {min} characters"
            )));
        }
        Ok(())
    }

    async fn issue_session(&self, user: User) -> Result<AuthSession, AuthError> {
        let issued = self
            .store
            .token_repo()
            .issue(
                user.id,
                TokenScope::Session,
                Duration::hours(self.security.session_ttl_hours),
            )
            .await?;

        Ok(AuthSession {
            token: issued.token,
            expires_at: issued.expires_at,
            user,
        })
    }

    async fn apply_profile(
        &self,
        user_id: UserId,
        changes: ProfileChanges,
    ) -> Result<User, AuthError> {
        self.store
            .user_repo()
            .update_profile(user_id, changes)
            .await?
            .ok_or(AuthError::Unauthorized)
    }
}

fn valid_email(email: &str) -> Result<String, AuthError> {
    let email = normalize_email(email);
    if is_valid_email(&email) {
        Ok(email)
    } else {
        Err(AuthError::Validation(
            "A valid email address is required".to_string(),
        ))
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(
        &self,
        client: &ClientInfo,
        request: RegisterRequest,
    ) -> Result<AuthSession, AuthError> {
        let name = non_blank(Some(request.name))
            .ok_or_else(|| AuthError::Validation("Name is required".to_string()))?;
        let email = valid_email(&request.email)?;
        self.check_password_length(&request.password)?;

        let users = self.store.user_repo();
        if users.get_by_email(&email).await?.is_some() {
            return Err(AuthError::Conflict(
                "User already exists with this email".to_string(),
            ));
        }

        let password_hash = self.hash(request.password).await?;
        let user = match users.create(&name, &email, password_hash).await {
            Ok(user) => user,
            Err(e) => {
                // Lost a race on the unique email index
                if users.get_by_email(&email).await?.is_some() {
                    return Err(AuthError::Conflict(
                        "User already exists with this email".to_string(),
                    ));
                }
                return Err(e.into());
            }
        };

        info!(user_id = %user.id, "User registered");

        self.provenance
            .record(
                user.id,
                client,
                ProvenanceEvent::new(AuditAction::UserRegistered, "User account created")
                    .message("Welcome! Your account has been created successfully."),
            )
            .await;

        self.issue_session(user).await
    }

    async fn login(
        &self,
        client: &ClientInfo,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);

        let Some((user, password_hash)) = self
            .store
            .user_repo()
            .get_credentials_by_email(&email)
            .await?
        else {
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify(password_hash, password.to_string()).await? {
            return Err(AuthError::InvalidCredentials);
        }

        self.provenance
            .record(
                user.id,
                client,
                ProvenanceEvent::new(AuditAction::UserLogin, "User logged in")
                    .message("You have successfully logged in to your account."),
            )
            .await;

        self.issue_session(user).await
    }

    async fn logout(&self, user_id: UserId, token: &str) -> Result<(), AuthError> {
        self.store.token_repo().revoke(token, user_id).await?;
        Ok(())
    }

    async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let user_id = self
            .store
            .token_repo()
            .resolve(token, TokenScope::Session)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        self.store
            .user_repo()
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::Unauthorized)
    }

    async fn verify_admin_grant(&self, user_id: UserId, grant: &str) -> Result<(), AuthError> {
        let owner = self
            .store
            .token_repo()
            .resolve(grant, TokenScope::Admin)
            .await?;

        match owner {
            Some(owner) if owner == user_id => Ok(()),
            _ => Err(AuthError::Forbidden(
                "Invalid or expired admin token".to_string(),
            )),
        }
    }

    async fn me(&self, user_id: UserId) -> Result<User, AuthError> {
        self.store
            .user_repo()
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::Unauthorized)
    }

    async fn update_profile(
        &self,
        ctx: &RequestContext,
        update: ProfileUpdate,
    ) -> Result<User, AuthError> {
        let name = match update.name {
            Some(name) => Some(
                non_blank(Some(name))
                    .ok_or_else(|| AuthError::Validation("Name cannot be empty".to_string()))?,
            ),
            None => None,
        };

        let email = match update.email {
            Some(email) => {
                let email = valid_email(&email)?;
                if let Some(existing) = self.store.user_repo().get_by_email(&email).await?
                    && existing.id != ctx.user_id
                {
                    return Err(AuthError::Conflict("Email already exists".to_string()));
                }
                Some(email)
            }
            None => None,
        };

        let changes = ProfileChanges {
            name,
            email,
            phone: update.phone.map(|p| p.trim().to_string()),
            avatar: update.avatar.map(|a| a.trim().to_string()),
            billing_address: update.billing_address,
        };

        let user = self.apply_profile(ctx.user_id, changes).await?;

        self.provenance
            .record(
                ctx.user_id,
                &ctx.client,
                ProvenanceEvent::new(
                    AuditAction::ProfileUpdated,
                    "User profile information updated",
                )
                .message("Your profile has been updated successfully."),
            )
            .await;

        Ok(user)
    }

    async fn update_billing_address(
        &self,
        ctx: &RequestContext,
        address: BillingAddress,
    ) -> Result<User, AuthError> {
        let user = self
            .apply_profile(
                ctx.user_id,
                ProfileChanges {
                    billing_address: Some(address),
                    ..ProfileChanges::default()
                },
            )
            .await?;

        self.provenance
            .record(
                ctx.user_id,
                &ctx.client,
                ProvenanceEvent::new(AuditAction::ProfileUpdated, "Billing address updated")
                    .message("Your billing address has been updated successfully."),
            )
            .await;

        Ok(user)
    }

    async fn change_password(
        &self,
        ctx: &RequestContext,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.check_password_length(new_password)?;

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let users = self.store.user_repo();
        let hash = users
            .get_password_hash(ctx.user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !self.verify(hash, current_password.to_string()).await? {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let new_hash = self.hash(new_password.to_string()).await?;
        users.set_password_hash(ctx.user_id, new_hash).await?;

        info!(user_id = %ctx.user_id, "Password changed");

        self.provenance
            .record(
                ctx.user_id,
                &ctx.client,
                ProvenanceEvent::new(AuditAction::PasswordChanged, "User password changed")
                    .message("Your password has been changed successfully."),
            )
            .await;

        Ok(())
    }

    async fn set_avatar(&self, ctx: &RequestContext, url: String) -> Result<User, AuthError> {
        let user = self
            .apply_profile(
                ctx.user_id,
                ProfileChanges {
                    avatar: Some(url),
                    ..ProfileChanges::default()
                },
            )
            .await?;

        self.provenance
            .record(
                ctx.user_id,
                &ctx.client,
                ProvenanceEvent::new(AuditAction::AvatarUpdated, "User avatar updated")
                    .message("Your profile picture has been updated successfully."),
            )
            .await;

        Ok(user)
    }

    async fn register_admin(&self, ctx: &RequestContext) -> Result<AdminSecret, AuthError> {
        let user = self.me(ctx.user_id).await?;
        if user.is_admin_registered {
            return Err(AuthError::AlreadyRegistered);
        }

        let secret = generate_secret();
        let secret_hash = self.hash(secret.clone()).await?;

        if !self
            .store
            .user_repo()
            .register_admin_secret(ctx.user_id, secret_hash)
            .await?
        {
            return Err(AuthError::AlreadyRegistered);
        }

        info!(user_id = %ctx.user_id, "Admin access registered");

        self.provenance
            .record(
                ctx.user_id,
                &ctx.client,
                ProvenanceEvent::new(AuditAction::AdminRegistered, "User registered as admin")
                    .message(
                        "You have successfully registered as an admin. Store your admin secret safely.",
                    ),
            )
            .await;

        Ok(AdminSecret {
            admin_secret: secret,
        })
    }

    async fn admin_login(
        &self,
        ctx: &RequestContext,
        secret: &str,
    ) -> Result<AdminGrant, AuthError> {
        let invalid = || AuthError::Forbidden("Invalid admin secret".to_string());

        let hash = self
            .store
            .user_repo()
            .get_admin_secret_hash(ctx.user_id)
            .await?
            .ok_or_else(invalid)?;

        if !self.verify(hash, secret.to_string()).await? {
            return Err(invalid());
        }

        let issued = self
            .store
            .token_repo()
            .issue(
                ctx.user_id,
                TokenScope::Admin,
                Duration::hours(self.security.admin_grant_ttl_hours),
            )
            .await?;

        self.provenance
            .record(
                ctx.user_id,
                &ctx.client,
                ProvenanceEvent::new(AuditAction::AdminLogin, "User logged in as admin")
                    .message("You have successfully logged in as an admin."),
            )
            .await;

        Ok(AdminGrant {
            admin_token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    async fn admin_logout(&self, user_id: UserId, grant: &str) -> Result<(), AuthError> {
        self.store.token_repo().revoke(grant, user_id).await?;
        Ok(())
    }
}
