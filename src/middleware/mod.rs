pub mod audit;
pub mod auth;
pub mod authorize;
pub mod response;

pub use audit::{audit_action, audited};
pub use auth::{extract_bearer, require_auth, AuthGate};
pub use authorize::{authorize, require_roles};
pub use response::{ApiResponse, ApiResult};
