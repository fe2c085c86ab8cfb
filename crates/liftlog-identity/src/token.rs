//! Opaque tokens and session issuance.

use crate::IdentityError;
use liftlog_db::{execute, query_one};
use liftlog_types::{Location, SESSION_TOKEN_BYTES};
use rand::rngs::OsRng;
use rand::RngCore;
use rusqlite::{params, Connection};

/// Generates `byte_len` bytes from the OS CSPRNG, rendered as lowercase hex.
pub fn issue_token(byte_len: usize) -> String {
    let mut bytes = vec![0u8; byte_len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Replaces the session for `(user_id, location)` with a fresh token.
///
/// The delete and insert are separate statements; a failure between them
/// leaves the pair without a session, which only forces a new login.
///
/// # Errors
///
/// Returns `IdentityError::Store` if either statement fails.
pub fn refresh_session(
    conn: &Connection,
    user_id: i64,
    location: Location,
) -> Result<String, IdentityError> {
    let token = issue_token(SESSION_TOKEN_BYTES);

    execute(
        conn,
        "DELETE FROM login WHERE location = ?1 AND user_id = ?2",
        params![location.as_str(), user_id],
    )?;
    execute(
        conn,
        "INSERT INTO login (location, user_id, token) VALUES (?1, ?2, ?3)",
        params![location.as_str(), user_id, token],
    )?;

    tracing::debug!(user_id, location = %location, "session refreshed");
    Ok(token)
}

/// Resolves a bearer token to its user id.
///
/// An unknown token is `Ok(None)`: the caller is simply unauthenticated.
///
/// # Errors
///
/// Returns `IdentityError::Store` if the lookup fails.
pub fn resolve_session(conn: &Connection, token: &str) -> Result<Option<i64>, IdentityError> {
    let row = query_one(conn, "SELECT user_id FROM login WHERE token = ?1", [token])?;
    Ok(row.and_then(|r| r.get_i64("user_id")))
}
