use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::{AccountStatus, Role};
use crate::database::DatabaseError;

/// Registered account
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(rename = "userType")]
    pub role: Role,
    pub status: AccountStatus,
    pub email_verified: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied at registration
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    /// New accounts start unverified
    pub fn from_new(new_user: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            status: AccountStatus::PendingVerification,
            email_verified: false,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Raw `users` row; role and status are stored as text tags
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub user_type: String,
    pub status: String,
    pub email_verified: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DatabaseError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            role: row.user_type.parse().map_err(|e| DatabaseError::InvalidRow(format!("user {}: {}", row.id, e)))?,
            status: row.status.parse().map_err(|e| DatabaseError::InvalidRow(format!("user {}: {}", row.id, e)))?,
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            email_verified: row.email_verified,
            first_name: row.first_name,
            last_name: row.last_name,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
