//! User repository for database operations

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{NewUser, User};

/// Hash a password or security code with Argon2
fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash secret: {}", e))?
        .to_string();

    Ok(hash)
}

/// Verify a candidate against a stored Argon2 hash
fn verify_secret(hash: &str, candidate: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Failed to parse hash: {}", e))?;

    let argon2 = Argon2::default();
    let result = argon2.verify_password(candidate.as_bytes(), &parsed_hash);

    Ok(result.is_ok())
}

fn row_to_user(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        registration_number: row.get("registration_number"),
        name: row.get("name"),
        password_hash: row.get("password_hash"),
        security_code_hash: row.get("security_code_hash"),
        security_code_hint: row.get("security_code_hint"),
        email: row.get("email"),
        phone: row.get("phone"),
        reset_token: row.get("reset_token"),
        reset_token_expires: row.get("reset_token_expires"),
        created_at: row.get("created_at"),
    }
}

const USER_COLUMNS: &str = "id, registration_number, name, password_hash, security_code_hash, \
     security_code_hint, email, phone, reset_token, reset_token_expires, created_at";

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user, hashing both credentials
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        info!("Creating new user: {}", new_user.registration_number);

        let password_hash = hash_secret(&new_user.password)?;
        let security_code_hash = hash_secret(&new_user.security_code)?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (registration_number, name, password_hash, security_code_hash,
                               security_code_hint, email, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.registration_number)
        .bind(new_user.name.trim())
        .bind(&password_hash)
        .bind(&security_code_hash)
        .bind(new_user.security_code_hint.trim())
        .bind(new_user.email.trim())
        .bind(new_user.phone.trim())
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_user(&row))
    }

    /// Find a user by registration number
    pub async fn find_by_registration(&self, registration_number: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE registration_number = $1"
        ))
        .bind(registration_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row_to_user(&row)))
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row_to_user(&row)))
    }

    /// Verify a user's password
    pub fn verify_password(&self, user: &User, password: &str) -> Result<bool> {
        verify_secret(&user.password_hash, password)
    }

    /// Verify a user's security code
    pub fn verify_security_code(&self, user: &User, security_code: &str) -> Result<bool> {
        verify_secret(&user.security_code_hash, security_code)
    }

    /// Store a single-use password-reset token with its expiry
    pub async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("UPDATE users SET reset_token = $1, reset_token_expires = $2 WHERE id = $3")
            .bind(token)
            .bind(expires)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Consume a reset token: set the new password and clear the token.
    /// Returns false when the token is unknown or expired.
    pub async fn reset_password_with_token(&self, token: &str, new_password: &str) -> Result<bool> {
        let password_hash = hash_secret(new_password)?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $1, reset_token = NULL, reset_token_expires = NULL
            WHERE reset_token = $2 AND reset_token_expires > now()
            "#,
        )
        .bind(&password_hash)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of registered users
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
