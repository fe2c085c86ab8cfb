//! Identity, session and credential primitives for the liftlog backend.
//!
//! - [`token`]: opaque hex tokens and the one-session-per-location rule.
//! - [`password`]: bcrypt hashing and fail-closed verification.
//! - [`user`]: registration, credential checks and the admin flag.
//! - [`reset`]: short-lived, single-use password reset tokens.
//!
//! Everything here takes a borrowed `rusqlite::Connection` and goes through
//! the parameterized adapter in `liftlog-db`; nothing holds state between
//! calls.

mod error;
pub mod password;
pub mod reset;
pub mod token;
pub mod user;

pub use error::IdentityError;
pub use password::{hash_password, verify_password, BCRYPT_COST};
pub use reset::{
    purge_expired_reset_tokens, redeem_reset_token, request_password_reset,
    validate_reset_token, ResetGrant,
};
pub use token::{issue_token, refresh_session, resolve_session};
pub use user::{
    authenticate, find_by_login, is_admin, login, register_user, user_details, User,
    UserDetails,
};
