//! User accounts: registration, credential checks and the admin flag.

use crate::password::{hash_password, verify_password};
use crate::token::refresh_session;
use crate::IdentityError;
use liftlog_db::{execute, query_one, Record};
use liftlog_types::{coerce_flag, Location};
use rusqlite::{params, Connection};
use serde::Serialize;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// The public view of an account returned by `GET /api/user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDetails {
    pub username: String,
    pub email: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

impl User {
    fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            id: record.get_i64("id")?,
            username: record.get_str("username")?.to_string(),
            email: record.get_str("email")?.to_string(),
            password_hash: record.get_str("password")?.to_string(),
            is_admin: record.get("is_admin").is_some_and(coerce_flag),
        })
    }
}

/// Creates an account and returns its id.
///
/// # Errors
///
/// Returns `IdentityError::AlreadyExists` if the username or email is taken
/// (including when a concurrent registration wins the UNIQUE constraint),
/// `IdentityError::Hash` if hashing fails, or `IdentityError::Store`.
pub fn register_user(
    conn: &Connection,
    username: &str,
    email: &str,
    password: &str,
) -> Result<i64, IdentityError> {
    let existing = query_one(
        conn,
        "SELECT id FROM user WHERE username = ?1 OR email = ?2",
        params![username, email],
    )?;
    if existing.is_some() {
        return Err(IdentityError::AlreadyExists);
    }

    let digest = hash_password(password)?;
    execute(
        conn,
        "INSERT INTO user (username, email, password) VALUES (?1, ?2, ?3)",
        params![username, email, digest],
    )
    .map_err(IdentityError::from)
    .map_err(|e| {
        if e.is_constraint_violation() {
            IdentityError::AlreadyExists
        } else {
            e
        }
    })?;

    let id = conn.last_insert_rowid();
    tracing::info!(user_id = id, "user registered");
    Ok(id)
}

/// Looks an account up by username or email.
///
/// # Errors
///
/// Returns `IdentityError::Store` if the lookup fails.
pub fn find_by_login(conn: &Connection, login: &str) -> Result<Option<User>, IdentityError> {
    let row = query_one(
        conn,
        "SELECT id, username, email, password, is_admin FROM user
         WHERE username = ?1 OR email = ?1",
        [login],
    )?;
    Ok(row.as_ref().and_then(User::from_record))
}

/// Checks a login/password pair and returns the user id.
///
/// # Errors
///
/// Returns `IdentityError::InvalidCredentials` for an unknown login or a
/// wrong password, or `IdentityError::Store`.
pub fn authenticate(conn: &Connection, login: &str, password: &str) -> Result<i64, IdentityError> {
    let user = find_by_login(conn, login)?.ok_or(IdentityError::InvalidCredentials)?;
    if !verify_password(password, &user.password_hash) {
        return Err(IdentityError::InvalidCredentials);
    }
    Ok(user.id)
}

/// Authenticates and issues a session token for `location`, replacing any
/// earlier session for the same location.
///
/// # Errors
///
/// See [`authenticate`] and [`refresh_session`].
pub fn login(
    conn: &Connection,
    login: &str,
    password: &str,
    location: Location,
) -> Result<String, IdentityError> {
    let user_id = authenticate(conn, login, password)?;
    refresh_session(conn, user_id, location)
}

/// Returns the public details of an account, if it exists.
///
/// # Errors
///
/// Returns `IdentityError::Store` if the lookup fails.
pub fn user_details(conn: &Connection, user_id: i64) -> Result<Option<UserDetails>, IdentityError> {
    let row = query_one(
        conn,
        "SELECT username, email, is_admin FROM user WHERE id = ?1",
        [user_id],
    )?;
    Ok(row.and_then(|r| {
        Some(UserDetails {
            username: r.get_str("username")?.to_string(),
            email: r.get_str("email")?.to_string(),
            is_admin: r.get("is_admin").is_some_and(coerce_flag),
        })
    }))
}

/// Reads the admin flag for `user_id`. Unknown users are not admins.
///
/// # Errors
///
/// Returns `IdentityError::Store` if the lookup fails.
pub fn is_admin(conn: &Connection, user_id: i64) -> Result<bool, IdentityError> {
    let row = query_one(conn, "SELECT is_admin FROM user WHERE id = ?1", [user_id])?;
    Ok(row
        .as_ref()
        .and_then(|r| r.get("is_admin"))
        .is_some_and(coerce_flag))
}
