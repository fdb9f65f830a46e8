use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::sync::OnceLock;

/// Stand-in hash verified when no account matches, so an unknown email costs
/// as much as a wrong password.
static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Hash a password into a PHC string (Argon2id, random salt)
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            tracing::warn!("Unreadable password hash in user store: {}", e);
            false
        }
    }
}

/// Burn one Argon2 verification for a login with no matching account.
/// Always false.
pub fn verify_without_account(password: &str) -> bool {
    let dummy = DUMMY_HASH.get_or_init(|| match hash_password("medtap-no-such-account") {
        Ok(hash) => Some(hash),
        Err(e) => {
            tracing::error!("Failed to build dummy password hash: {}", e);
            None
        }
    });
    if let Some(hash) = dummy {
        verify_password(password, hash);
    }
    false
}
