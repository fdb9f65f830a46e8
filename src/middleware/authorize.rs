use axum::{extract::Request, middleware::Next, response::Response};

use crate::auth::{AuthError, Identity, Role};
use crate::error::ApiError;

/// Admit the identity only if its role is one of `allowed`.
///
/// An empty `allowed` set admits nobody; routes without a restriction simply
/// skip this check.
pub fn authorize(identity: Option<&Identity>, allowed: &[Role]) -> Result<(), AuthError> {
    let identity = identity.ok_or(AuthError::Unauthenticated)?;

    if allowed.contains(&identity.role) {
        Ok(())
    } else {
        Err(AuthError::RoleForbidden {
            allowed: allowed.to_vec(),
        })
    }
}

/// Role-gating middleware; mount it inside [`super::auth::require_auth`].
///
/// ```ignore
/// .route_layer(middleware::from_fn(|req: Request, next: Next| {
///     require_roles(&[Role::PetOwner], req, next)
/// }))
/// ```
pub async fn require_roles(allowed: &'static [Role], request: Request, next: Next) -> Result<Response, ApiError> {
    if let Err(err) = authorize(request.extensions().get::<Identity>(), allowed) {
        tracing::warn!("Role check failed on {}: {:?}", request.uri().path(), err);
        return Err(err.into());
    }

    Ok(next.run(request).await)
}
