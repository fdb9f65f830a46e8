use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{AuthError, Identity, TokenKeys};
use crate::database::UserStore;
use crate::error::ApiError;

/// Bearer-token gate in front of every protected route.
///
/// Holds only immutable state (keys and a store handle), so one instance is
/// shared by all requests.
pub struct AuthGate {
    keys: Arc<TokenKeys>,
    users: Arc<dyn UserStore>,
}

impl AuthGate {
    pub fn new(keys: Arc<TokenKeys>, users: Arc<dyn UserStore>) -> Self {
        Self { keys, users }
    }

    /// Run every gate stage against the `Authorization` header value and
    /// produce the identity to attach, or the first rejection hit.
    pub async fn authenticate(&self, header: Option<&HeaderValue>) -> Result<Identity, AuthError> {
        let token = extract_bearer(header)?;
        let claims = self.keys.verify(token)?;

        let user = self
            .users
            .find_by_id(claims.id)
            .await
            .map_err(|e| AuthError::Lookup(e.to_string()))?
            .ok_or(AuthError::UnknownPrincipal)?;

        if !user.status.admits_requests() {
            return Err(AuthError::InactivePrincipal);
        }

        // Identity comes from the token, not the row just read
        Ok(Identity::from(claims))
    }
}

/// Extract the token from `Bearer <token>`.
///
/// The token is the segment after the single space that follows the scheme;
/// anything else counts as no credential at all.
pub fn extract_bearer(header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let value = header
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredential)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next()) {
        (Some("Bearer"), Some(token)) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MissingCredential),
    }
}

/// Authentication middleware: attaches an [`Identity`] on success, answers
/// with the rejection otherwise. Nothing is attached on failure.
pub async fn require_auth(
    State(gate): State<Arc<AuthGate>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = match gate.authenticate(request.headers().get(AUTHORIZATION)).await {
        Ok(identity) => identity,
        Err(err) => {
            tracing::warn!(
                "Rejected {} {}: {:?}",
                request.method(),
                request.uri().path(),
                err
            );
            return Err(err.into());
        }
    };

    tracing::debug!("Authenticated {} ({}) as {}", identity.email, identity.id, identity.role);
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AccountStatus, Role};
    use crate::database::models::user::{NewUser, User};
    use crate::database::memory::UnreachableUserStore;
    use crate::database::MemoryUserStore;
    use chrono::{Duration, Utc};

    const SECRET: &str = "gate-test-secret";

    async fn setup(status: AccountStatus, role: Role) -> (AuthGate, Arc<MemoryUserStore>, Arc<TokenKeys>, User) {
        let keys = Arc::new(TokenKeys::new(Some(SECRET), Duration::hours(1)).unwrap());
        let users = Arc::new(MemoryUserStore::new());
        let mut user = User::from_new(
            NewUser {
                email: "u1@example.com".into(),
                password_hash: "unused".into(),
                role,
                first_name: None,
                last_name: None,
            },
            Utc::now(),
        );
        user.status = status;
        users.insert(user.clone()).await;
        (AuthGate::new(keys.clone(), users.clone()), users, keys, user)
    }

    fn bearer(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
    }

    #[test]
    fn extracts_token_after_bearer_marker() {
        let header = HeaderValue::from_static("Bearer abc.def.ghi");
        assert_eq!(extract_bearer(Some(&header)).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn missing_or_malformed_header_is_missing_credential() {
        assert!(matches!(extract_bearer(None), Err(AuthError::MissingCredential)));
        for raw in ["Bearer", "Bearer ", "Basic abc", "bearer abc", "abc"] {
            let header = HeaderValue::from_str(raw).unwrap();
            assert!(
                matches!(extract_bearer(Some(&header)), Err(AuthError::MissingCredential)),
                "{raw:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn active_principal_passes() {
        let (gate, _, keys, user) = setup(AccountStatus::Active, Role::Physician).await;
        let token = keys.issue(user.id, &user.email, user.role).unwrap();

        let identity = gate.authenticate(Some(&bearer(&token))).await.unwrap();
        assert_eq!(identity.id, user.id);
        assert_eq!(identity.role, Role::Physician);
    }

    #[tokio::test]
    async fn identity_keeps_token_role_after_store_change() {
        let (gate, users, keys, user) = setup(AccountStatus::Active, Role::Physician).await;
        let token = keys.issue(user.id, &user.email, user.role).unwrap();
        users.set_role(user.id, Role::Individual).await;

        let identity = gate.authenticate(Some(&bearer(&token))).await.unwrap();
        assert_eq!(identity.role, Role::Physician);
    }

    #[tokio::test]
    async fn suspended_after_issuance_is_rejected() {
        let (gate, users, keys, user) = setup(AccountStatus::Active, Role::Physician).await;
        let token = keys.issue(user.id, &user.email, user.role).unwrap();
        users.set_status(user.id, AccountStatus::Suspended).await;

        let err = gate.authenticate(Some(&bearer(&token))).await.unwrap_err();
        assert!(matches!(err, AuthError::InactivePrincipal));
    }

    #[tokio::test]
    async fn pending_verification_is_rejected() {
        let (gate, _, keys, user) = setup(AccountStatus::PendingVerification, Role::Individual).await;
        let token = keys.issue(user.id, &user.email, user.role).unwrap();

        let err = gate.authenticate(Some(&bearer(&token))).await.unwrap_err();
        assert!(matches!(err, AuthError::InactivePrincipal));
    }

    #[tokio::test]
    async fn unknown_principal_is_rejected() {
        let (gate, users, keys, user) = setup(AccountStatus::Active, Role::Individual).await;
        let token = keys.issue(user.id, &user.email, user.role).unwrap();
        users.remove(user.id).await;

        let err = gate.authenticate(Some(&bearer(&token))).await.unwrap_err();
        assert!(matches!(err, AuthError::UnknownPrincipal));
    }

    #[tokio::test]
    async fn foreign_and_expired_tokens_are_rejected() {
        let (gate, _, keys, user) = setup(AccountStatus::Active, Role::Individual).await;

        let foreign = TokenKeys::new(Some("another-secret"), Duration::hours(1))
            .unwrap()
            .issue(user.id, &user.email, user.role)
            .unwrap();
        let err = gate.authenticate(Some(&bearer(&foreign))).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));

        let stale = keys
            .issue_at(user.id, &user.email, user.role, Utc::now() - Duration::hours(3))
            .unwrap();
        let err = gate.authenticate(Some(&bearer(&stale))).await.unwrap_err();
        assert!(matches!(err, AuthError::ExpiredCredential));
    }

    #[tokio::test]
    async fn store_failure_is_a_lookup_error() {
        let keys = Arc::new(TokenKeys::new(Some(SECRET), Duration::hours(1)).unwrap());
        let gate = AuthGate::new(keys.clone(), Arc::new(UnreachableUserStore));
        let token = keys.issue(uuid::Uuid::new_v4(), "u1@example.com", Role::Veteran).unwrap();

        let err = gate.authenticate(Some(&bearer(&token))).await.unwrap_err();
        assert!(matches!(err, AuthError::Lookup(_)));
    }

    #[tokio::test]
    async fn bad_token_is_rejected_before_the_store_is_asked() {
        let keys = Arc::new(TokenKeys::new(Some(SECRET), Duration::hours(1)).unwrap());
        let gate = AuthGate::new(keys, Arc::new(UnreachableUserStore));

        let err = gate.authenticate(Some(&bearer("not.a.token"))).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }
}
