pub mod claims;
pub mod error;
pub mod identity;
pub mod password;
pub mod role;

pub use claims::{Claims, TokenKeys};
pub use error::AuthError;
pub use identity::Identity;
pub use role::{AccountStatus, Role};
