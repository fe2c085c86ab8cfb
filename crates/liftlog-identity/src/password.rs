//! Salted adaptive password hashing.

use crate::IdentityError;

/// bcrypt work factor. Each digest embeds its own random salt.
pub const BCRYPT_COST: u32 = 10;

/// Hashes `password` with a fresh salt.
///
/// # Errors
///
/// Returns `IdentityError::Hash` if bcrypt fails.
pub fn hash_password(password: &str) -> Result<String, IdentityError> {
    Ok(bcrypt::hash(password, BCRYPT_COST)?)
}

/// Checks `password` against a stored bcrypt `digest`.
///
/// Malformed digests and other verifier failures are logged and reported as
/// a mismatch.
pub fn verify_password(password: &str, digest: &str) -> bool {
    match bcrypt::verify(password, digest) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(error = %e, "password verification failed, treating as mismatch");
            false
        }
    }
}
