use axum::http::StatusCode;
use thiserror::Error;

use super::role::{describe_roles, Role};

/// Every way the request gate can turn a request away
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Access token required")]
    MissingCredential,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    ExpiredCredential,

    #[error("Invalid or inactive user")]
    UnknownPrincipal,

    #[error("Invalid or inactive user")]
    InactivePrincipal,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Access denied")]
    RoleForbidden { allowed: Vec<Role> },

    /// Server misconfiguration, never a client problem
    #[error("JWT configuration error: {0}")]
    Configuration(String),

    /// The user store could not be reached
    #[error("Authentication error: {0}")]
    Lookup(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential
            | AuthError::InvalidToken
            | AuthError::ExpiredCredential
            | AuthError::UnknownPrincipal
            | AuthError::InactivePrincipal
            | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::RoleForbidden { .. } => StatusCode::FORBIDDEN,
            AuthError::Configuration(_) | AuthError::Lookup(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a client. Server-side details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Configuration(_) => "JWT configuration error".to_string(),
            AuthError::Lookup(_) => "Authentication error".to_string(),
            other => other.to_string(),
        }
    }

    /// Extra diagnostic for the response body
    pub fn detail(&self) -> Option<String> {
        match self {
            AuthError::RoleForbidden { allowed } => {
                Some(format!("This endpoint requires one of: {}", describe_roles(allowed)))
            }
            _ => None,
        }
    }
}
