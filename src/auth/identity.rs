use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use uuid::Uuid;

use super::claims::Claims;
use super::error::AuthError;
use super::role::Role;
use crate::error::ApiError;

/// Verified principal attached to a request by the auth gate.
///
/// Built from the token's claims, not from a fresh store read: a role or
/// email change made after the token was issued shows up only once a new
/// token is issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    #[serde(rename = "userType")]
    pub role: Role,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            email: claims.email,
            role: claims.user_type,
        }
    }
}

/// Handlers take `Identity` as an argument; a route mounted without the gate
/// answers 401 instead of running unauthenticated.
#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or_else(|| AuthError::Unauthenticated.into())
    }
}
