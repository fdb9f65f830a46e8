use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AuthError;
use super::role::Role;
use crate::config::SecurityConfig;

/// Claim set carried inside every bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub email: String,
    #[serde(rename = "userType")]
    pub user_type: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Fails when `issued_at + ttl` falls outside the representable range
    pub fn new(
        id: Uuid,
        email: impl Into<String>,
        user_type: Role,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, AuthError> {
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Configuration(format!("token lifetime {} overflows the clock", ttl)))?;

        Ok(Self {
            id,
            email: email.into(),
            user_type,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        })
    }
}

/// Signing and verification keys derived from the process-wide secret.
///
/// Built once at startup; a missing secret fails here rather than on the
/// first protected request.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: Option<&str>, ttl: Duration) -> Result<Self, AuthError> {
        let secret = secret
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::Configuration("JWT_SECRET is not set".to_string()))?;

        if ttl <= Duration::zero() {
            return Err(AuthError::Configuration(format!("token lifetime must be positive, got {}", ttl)));
        }
        if Utc::now().checked_add_signed(ttl).is_none() {
            return Err(AuthError::Configuration(format!("token lifetime {} overflows the clock", ttl)));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, AuthError> {
        let ttl = i64::try_from(security.jwt_expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .ok_or_else(|| {
                AuthError::Configuration(format!(
                    "JWT_EXPIRY_HOURS {} is out of range",
                    security.jwt_expiry_hours
                ))
            })?;
        Self::new(security.jwt_secret.as_deref(), ttl)
    }

    pub fn issue(&self, id: Uuid, email: &str, role: Role) -> Result<String, AuthError> {
        self.issue_at(id, email, role, Utc::now())
    }

    pub fn issue_at(&self, id: Uuid, email: &str, role: Role, issued_at: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims::new(id, email, role, issued_at, self.ttl)?;
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Configuration(format!("token signing failed: {}", e)))
    }

    /// Check signature and expiry and return the claim set.
    ///
    /// The signature is checked before expiry, so a forged token is reported
    /// as invalid even when it is also stale.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredCredential,
                _ => AuthError::InvalidToken,
            })
    }
}
