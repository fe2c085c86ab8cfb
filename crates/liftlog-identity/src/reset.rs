//! Password reset tokens.
//!
//! A reset is a two-step exchange that never touches active sessions:
//! [`request_password_reset`] stores a 16-byte token for the account, and
//! [`redeem_reset_token`] trades it for a new password exactly once.
//! Tokens live for [`RESET_TOKEN_TTL_SECS`]; expired rows are purged lazily
//! at the start of every operation instead of by a background sweeper.

use crate::password::hash_password;
use crate::token::issue_token;
use crate::user::find_by_login;
use crate::IdentityError;
use chrono::{DateTime, Utc};
use liftlog_db::{execute, query_one};
use liftlog_types::{RESET_TOKEN_BYTES, RESET_TOKEN_TTL_SECS};
use rusqlite::{params, Connection};

/// A freshly stored reset token and the account it belongs to.
///
/// Carries what the out-of-band notification needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetGrant {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub token: String,
}

/// Deletes every reset token older than the TTL as of `now`.
///
/// Returns the number of rows removed.
///
/// # Errors
///
/// Returns `IdentityError::Store` if the delete fails.
pub fn purge_expired_reset_tokens(
    conn: &Connection,
    now: DateTime<Utc>,
) -> Result<usize, IdentityError> {
    let cutoff = now.timestamp() - RESET_TOKEN_TTL_SECS;
    let purged = execute(conn, "DELETE FROM login_reset WHERE created < ?1", [cutoff])?;
    if purged > 0 {
        tracing::debug!(count = purged, "purged expired reset tokens");
    }
    Ok(purged)
}

/// Issues a reset token for the account identified by `login` (username or
/// email).
///
/// Returns `Ok(None)` when no account matches.
///
/// # Errors
///
/// Returns `IdentityError::Store` if a statement fails.
pub fn request_password_reset(
    conn: &Connection,
    login: &str,
    now: DateTime<Utc>,
) -> Result<Option<ResetGrant>, IdentityError> {
    purge_expired_reset_tokens(conn, now)?;

    let Some(user) = find_by_login(conn, login)? else {
        return Ok(None);
    };

    let token = issue_token(RESET_TOKEN_BYTES);
    execute(
        conn,
        "INSERT INTO login_reset (user_id, token, created) VALUES (?1, ?2, ?3)",
        params![user.id, token, now.timestamp()],
    )?;

    tracing::info!(user_id = user.id, "password reset token issued");
    Ok(Some(ResetGrant {
        user_id: user.id,
        username: user.username,
        email: user.email,
        token,
    }))
}

/// Reports whether `token` names a live reset row.
///
/// # Errors
///
/// Returns `IdentityError::Store` if a statement fails.
pub fn validate_reset_token(
    conn: &Connection,
    token: &str,
    now: DateTime<Utc>,
) -> Result<bool, IdentityError> {
    purge_expired_reset_tokens(conn, now)?;
    Ok(owner_of(conn, token)?.is_some())
}

/// Sets a new password for the owner of `token` and consumes the token.
///
/// Returns `Ok(false)` when the token is unknown or expired.
///
/// # Errors
///
/// Returns `IdentityError::Hash` or `IdentityError::Store`. The password
/// update and the token delete are separate statements.
pub fn redeem_reset_token(
    conn: &Connection,
    token: &str,
    new_password: &str,
    now: DateTime<Utc>,
) -> Result<bool, IdentityError> {
    purge_expired_reset_tokens(conn, now)?;

    let Some(user_id) = owner_of(conn, token)? else {
        return Ok(false);
    };

    let digest = hash_password(new_password)?;
    execute(
        conn,
        "UPDATE user SET password = ?1 WHERE id = ?2",
        params![digest, user_id],
    )?;
    execute(conn, "DELETE FROM login_reset WHERE token = ?1", [token])?;

    tracing::info!(user_id, "password reset redeemed");
    Ok(true)
}

fn owner_of(conn: &Connection, token: &str) -> Result<Option<i64>, IdentityError> {
    let row = query_one(
        conn,
        "SELECT user_id FROM login_reset WHERE token = ?1",
        [token],
    )?;
    Ok(row.and_then(|r| r.get_i64("user_id")))
}
