use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::manager::{conflict_on_unique, DatabaseError};
use super::models::user::{NewUser, User, UserRow};
use crate::auth::AccountStatus;

pub const DUPLICATE_EMAIL: &str = "User already exists with this email";

/// Account storage consumed by the auth gate and the account endpoints
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    /// Fails with `DatabaseError::Conflict` when the email is taken
    async fn create(&self, new_user: NewUser) -> Result<User, DatabaseError>;

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DatabaseError>;

    /// Mark the email verified and activate the account
    async fn verify_email(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;
}

const USER_COLUMNS: &str = "id, email, password_hash, user_type, status, email_verified, \
                            first_name, last_name, last_login_at, created_at, updated_at";

/// `UserStore` backed by the `users` table
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn create(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        let user = User::from_new(new_user, Utc::now());
        sqlx::query(
            r#"
            INSERT INTO users
                (id, email, password_hash, user_type, status, email_verified,
                 first_name, last_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .bind(user.email_verified)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_EMAIL))?;

        Ok(user)
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET last_login_at = $2, updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn verify_email(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let query = format!(
            "UPDATE users SET email_verified = TRUE, status = $2, updated_at = now() \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .bind(AccountStatus::Active.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }
}
