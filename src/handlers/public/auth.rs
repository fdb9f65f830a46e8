// handlers/public/auth.rs - token acquisition (no authentication required)

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::auth::password::{hash_password, verify_password, verify_without_account};
use crate::auth::Role;
use crate::database::models::user::{NewUser, User};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub user_type: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: &'static str,
    pub token: String,
    pub user: User,
}

/// POST /api/v1/auth/register - Create an account and receive a token
///
/// Expected Input:
/// ```json
/// {
///   "email": "owner@example.com",
///   "password": "at least 8 chars",
///   "userType": "pet_owner",
///   "firstName": "Ada",      // optional
///   "lastName": "Lovelace"   // optional
/// }
/// ```
///
/// The account starts `pending_verification`. It may log in, but its token
/// is refused by protected routes until the account becomes active.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<SessionResponse> {
    let Json(payload) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;

    let email = normalize_email(&payload.email);
    let mut field_errors = HashMap::new();
    if !is_plausible_email(&email) {
        field_errors.insert("email".to_string(), "Must be a valid email address".to_string());
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        field_errors.insert(
            "password".to_string(),
            format!("Must be at least {} characters", MIN_PASSWORD_LEN),
        );
    }
    let first_name = trimmed(payload.first_name);
    let last_name = trimmed(payload.last_name);
    if !field_errors.is_empty() {
        return Err(ApiError::validation_error("Invalid registration details", field_errors));
    }

    let password_hash = hash_blocking(payload.password).await?;
    let user = state
        .users
        .create(NewUser {
            email,
            password_hash,
            role: payload.user_type,
            first_name,
            last_name,
        })
        .await?;

    let token = state.tokens.issue(user.id, &user.email, user.role)?;
    tracing::info!("Registered user {} ({}) as {}", user.email, user.id, user.role);

    Ok(ApiResponse::created(SessionResponse {
        message: "User registered successfully",
        token,
        user,
    }))
}

/// POST /api/v1/auth/login - Authenticate and receive a token
///
/// Expected Input:
/// ```json
/// { "email": "owner@example.com", "password": "..." }
/// ```
///
/// Active and unverified accounts may log in; inactive and suspended
/// accounts get 403.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<SessionResponse> {
    let Json(payload) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    let email = normalize_email(&payload.email);

    let invalid = || ApiError::unauthorized("Invalid email or password");

    let Some(mut user) = state.users.find_by_email(&email).await? else {
        tracing::warn!("Login failed for unknown email {}", email);
        verify_unknown_blocking(payload.password).await?;
        return Err(invalid());
    };

    if !verify_blocking(payload.password, user.password_hash.clone()).await? {
        tracing::warn!("Login failed for {}: wrong password", user.id);
        return Err(invalid());
    }

    if !user.status.admits_login() {
        tracing::warn!("Login refused for {}: account {}", user.id, user.status);
        return Err(ApiError::forbidden("Account is suspended or inactive"));
    }

    let now = Utc::now();
    state.users.record_login(user.id, now).await?;
    user.last_login_at = Some(now);

    let token = state.tokens.issue(user.id, &user.email, user.role)?;
    tracing::info!("User {} logged in", user.id);

    Ok(ApiResponse::success(SessionResponse {
        message: "Login successful",
        token,
        user,
    }))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
        None => false,
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// Argon2 is CPU-bound; run it on the blocking pool
async fn hash_blocking(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            ApiError::internal_server_error("Failed to register user")
        })?
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            ApiError::internal_server_error("Failed to register user")
        })
}

async fn verify_blocking(password: String, stored_hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| {
            tracing::error!("Password verification task failed: {}", e);
            ApiError::internal_server_error("Failed to login")
        })
}

async fn verify_unknown_blocking(password: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify_without_account(&password))
        .await
        .map_err(|e| {
            tracing::error!("Password verification task failed: {}", e);
            ApiError::internal_server_error("Failed to login")
        })
}
