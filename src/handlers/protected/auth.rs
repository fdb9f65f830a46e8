// handlers/protected/auth.rs - account endpoints behind the auth gate

use axum::extract::State;
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/v1/auth/me - Stored account of the authenticated user
///
/// Unlike the request identity, this reads the store, so it reflects role or
/// email changes made since the token was issued.
pub async fn me(State(state): State<AppState>, identity: Identity) -> ApiResult<Value> {
    let user = state
        .users
        .find_by_id(identity.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::success(json!({ "user": user })))
}

/// POST /api/v1/auth/verify-email - Mark the email verified and activate
/// the account.
///
/// Codes are not checked yet. Note that the gate only admits active
/// accounts, so an unverified account cannot reach this route with its own
/// token.
pub async fn verify_email(State(state): State<AppState>, identity: Identity) -> ApiResult<Value> {
    state
        .users
        .verify_email(identity.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    tracing::info!("Email verified for {}", identity.id);
    Ok(ApiResponse::success(json!({ "message": "Email verified successfully" })))
}

/// POST /api/v1/auth/logout - Tokens are stateless; the client discards
/// its copy. The route is audited.
pub async fn logout(identity: Identity) -> ApiResult<Value> {
    tracing::info!("User {} logged out", identity.id);
    Ok(ApiResponse::success(json!({ "message": "Logout successful" })))
}
