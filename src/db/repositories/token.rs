use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::db::format_timestamp;
use crate::db::repositories::user::generate_secret;
use crate::domain::UserId;
use crate::entities::access_tokens;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
    /// Ordinary bearer session
    Session,
    /// Elevated admin grant
    Admin,
}

impl TokenScope {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn issue(&self, user_id: UserId, scope: TokenScope, ttl: Duration) -> Result<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + ttl;
        let token = generate_secret();

        let active = access_tokens::ActiveModel {
            token: Set(token.clone()),
            user_id: Set(user_id.value()),
            scope: Set(scope.as_str().to_string()),
            expires_at: Set(format_timestamp(expires_at)),
            created_at: Set(format_timestamp(now)),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert access token")?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Owner of an unexpired token with the given scope.
    pub async fn resolve(&self, token: &str, scope: TokenScope) -> Result<Option<UserId>> {
        let now = format_timestamp(Utc::now());

        let row = access_tokens::Entity::find()
            .filter(access_tokens::Column::Token.eq(token))
            .filter(access_tokens::Column::Scope.eq(scope.as_str()))
            .filter(access_tokens::Column::ExpiresAt.gt(now))
            .one(&self.conn)
            .await
            .context("Failed to query access token")?;

        Ok(row.map(|t| UserId::new(t.user_id)))
    }

    pub async fn revoke(&self, token: &str, user_id: UserId) -> Result<bool> {
        let result = access_tokens::Entity::delete_many()
            .filter(access_tokens::Column::Token.eq(token))
            .filter(access_tokens::Column::UserId.eq(user_id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to revoke access token")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn purge_expired(&self) -> Result<u64> {
        let now = format_timestamp(Utc::now());

        let result = access_tokens::Entity::delete_many()
            .filter(access_tokens::Column::ExpiresAt.lte(now))
            .exec(&self.conn)
            .await
            .context("Failed to purge expired tokens")?;

        Ok(result.rows_affected)
    }
}
