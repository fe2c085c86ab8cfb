use liftlog_db::StoreError;
use thiserror::Error;

/// Errors produced by identity operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The underlying store rejected a statement.
    #[error("identity store error: {0}")]
    Store(#[from] StoreError),

    /// bcrypt failed to produce a digest.
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    /// The username or email is already registered.
    #[error("username or email already registered")]
    AlreadyExists,

    /// Unknown login or wrong password. The two are deliberately not
    /// distinguished.
    #[error("invalid username or password")]
    InvalidCredentials,
}

impl IdentityError {
    /// Returns true when the store rejected a write because of a UNIQUE or
    /// CHECK constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::Database(rusqlite::Error::SqliteFailure(err, _)))
                if err.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}
