use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the database layer and the stores built on it
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid row: {0}")]
    InvalidRow(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Open the connection pool.
///
/// `connection_timeout` bounds how long a request waits for a pooled
/// connection; individual queries carry no timeout of their own.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    let url = config
        .url
        .as_deref()
        .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .connect(url)
        .await?;

    info!("Created database pool (max {} connections)", config.max_connections);
    Ok(pool)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id              UUID PRIMARY KEY,
        email           TEXT NOT NULL UNIQUE,
        password_hash   TEXT NOT NULL,
        user_type       TEXT NOT NULL,
        status          TEXT NOT NULL DEFAULT 'pending_verification',
        email_verified  BOOLEAN NOT NULL DEFAULT FALSE,
        first_name      TEXT,
        last_name       TEXT,
        last_login_at   TIMESTAMPTZ,
        created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pets (
        id              UUID PRIMARY KEY,
        owner_id        UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name            TEXT NOT NULL,
        pet_type        TEXT NOT NULL,
        breed           TEXT,
        gender          TEXT NOT NULL,
        is_lost         BOOLEAN NOT NULL DEFAULT FALSE,
        lost_details    JSONB,
        created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS pets_owner_id_idx ON pets (owner_id, created_at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS medical_records (
        id              UUID PRIMARY KEY,
        owner_id        UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        record_type     TEXT NOT NULL,
        title           TEXT NOT NULL,
        description     TEXT,
        date            TIMESTAMPTZ NOT NULL,
        provider        TEXT,
        facility        TEXT,
        diagnosis       TEXT[] NOT NULL DEFAULT '{}',
        medications     TEXT[] NOT NULL DEFAULT '{}',
        notes           TEXT,
        attachments     TEXT[] NOT NULL DEFAULT '{}',
        is_critical     BOOLEAN NOT NULL DEFAULT FALSE,
        is_shared       BOOLEAN NOT NULL DEFAULT FALSE,
        created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS medical_records_owner_date_idx ON medical_records (owner_id, date DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS appointments (
        id                  UUID PRIMARY KEY,
        owner_id            UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        appointment_type    TEXT NOT NULL,
        status              TEXT NOT NULL DEFAULT 'scheduled',
        provider_name       TEXT NOT NULL,
        provider_specialty  TEXT,
        facility_name       TEXT,
        facility_address    TEXT,
        appointment_date    TIMESTAMPTZ NOT NULL,
        duration            INTEGER NOT NULL DEFAULT 30,
        reason              TEXT,
        notes               TEXT,
        telemedicine_link   TEXT,
        reminder_sent       BOOLEAN NOT NULL DEFAULT FALSE,
        created_at          TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at          TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS appointments_owner_date_idx ON appointments (owner_id, appointment_date)",
];

/// Create tables the service needs if they are missing (development sync)
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema synchronized");
    Ok(())
}

/// Pings the pool to ensure connectivity
pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Escape `%`, `_` and `\\` so user text matches literally inside `ILIKE`
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Map a unique-constraint violation to a conflict with the given message
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> DatabaseError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => DatabaseError::Conflict(message.to_string()),
        _ => DatabaseError::Sqlx(err),
    }
}
