use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    sea_query::Expr,
};
use serde::Serialize;

use crate::config::SecurityConfig;
use crate::db::now_timestamp;
use crate::domain::{BillingAddress, UserId};
use crate::entities::users;

/// User data returned from repository (without password or admin secret hashes)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub billing_address: BillingAddress,
    pub is_admin_registered: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: UserId::new(model.id),
            name: model.name,
            email: model.email,
            phone: model.phone,
            avatar: model.avatar,
            billing_address: BillingAddress {
                street: model.billing_street,
                city: model.billing_city,
                state: model.billing_state,
                zip_code: model.billing_zip_code,
                country: model.billing_country,
            },
            is_admin_registered: model.is_admin_registered,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Profile fields to overwrite. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub billing_address: Option<BillingAddress>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, name: &str, email: &str, password_hash: String) -> Result<User> {
        let now = now_timestamp();

        let active = users::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            phone: Set(None),
            avatar: Set(None),
            billing_street: Set(None),
            billing_city: Set(None),
            billing_state: Set(None),
            billing_zip_code: Set(None),
            billing_country: Set(None),
            is_admin_registered: Set(false),
            admin_secret_hash: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    /// Get user by email together with the password hash (for login)
    pub async fn get_credentials_by_email(&self, email: &str) -> Result<Option<(User, String)>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (User::from(u), password_hash)
        }))
    }

    pub async fn get_password_hash(&self, id: UserId) -> Result<Option<String>> {
        let user = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user for password hash")?;

        Ok(user.map(|u| u.password_hash))
    }

    pub async fn get_admin_secret_hash(&self, id: UserId) -> Result<Option<String>> {
        let user = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user for admin secret")?;

        Ok(user.and_then(|u| u.admin_secret_hash))
    }

    pub async fn count(&self) -> Result<u64> {
        use sea_orm::PaginatorTrait;

        users::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count users")
    }

    pub async fn update_profile(&self, id: UserId, changes: ProfileChanges) -> Result<Option<User>> {
        let Some(user) = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user for profile update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(phone) = changes.phone {
            active.phone = Set(Some(phone).filter(|p| !p.is_empty()));
        }
        if let Some(avatar) = changes.avatar {
            active.avatar = Set(Some(avatar).filter(|a| !a.is_empty()));
        }
        if let Some(address) = changes.billing_address {
            let address = address.normalized();
            active.billing_street = Set(address.street);
            active.billing_city = Set(address.city);
            active.billing_state = Set(address.state);
            active.billing_zip_code = Set(address.zip_code);
            active.billing_country = Set(address.country);
        }
        active.updated_at = Set(now_timestamp());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update user profile")?;

        Ok(Some(User::from(model)))
    }

    pub async fn set_password_hash(&self, id: UserId, password_hash: String) -> Result<()> {
        users::Entity::update_many()
            .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(users::Column::UpdatedAt, Expr::value(now_timestamp()))
            .filter(users::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to update password hash")?;

        Ok(())
    }

    /// Stores the admin secret hash unless one was already registered.
    /// Returns `false` when the user had already registered.
    pub async fn register_admin_secret(&self, id: UserId, secret_hash: String) -> Result<bool> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::IsAdminRegistered, Expr::value(true))
            .col_expr(users::Column::AdminSecretHash, Expr::value(secret_hash))
            .col_expr(users::Column::UpdatedAt, Expr::value(now_timestamp()))
            .filter(users::Column::Id.eq(id.value()))
            .filter(users::Column::IsAdminRegistered.eq(false))
            .exec(&self.conn)
            .await
            .context("Failed to register admin secret")?;

        Ok(result.rows_affected == 1)
    }
}

/// Hash a password or secret using Argon2id with the configured params.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Check a candidate against a stored PHC hash. Parameters come from the hash.
pub fn verify_password(password_hash: &str, candidate: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Generate a random secret (64 character hex string)
#[must_use]
pub fn generate_secret() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter22", &fast_config()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(&hash, "hunter22").unwrap());
        assert!(!verify_password(&hash, "hunter23").unwrap());
    }

    #[test]
    fn test_generate_secret_format() {
        let a = generate_secret();
        let b = generate_secret();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
