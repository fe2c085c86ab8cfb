//! Shared types and constants for the liftlog backend.
//!
//! Every other crate in the workspace pulls cross-cutting definitions from
//! here: the session location classes, token sizes, the reset-token lifetime
//! and the admin paging constants. Keeping them in one leaf crate avoids
//! circular dependencies between the identity, admin and training crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of random bytes in a session token (rendered as 64 hex chars).
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Number of random bytes in a password-reset token (rendered as 32 hex chars).
pub const RESET_TOKEN_BYTES: usize = 16;

/// Lifetime of a password-reset token, in seconds.
pub const RESET_TOKEN_TTL_SECS: i64 = 10 * 60;

/// Rows returned per page by the admin table browser.
pub const ADMIN_PAGE_SIZE: i64 = 10;

/// Table holding the exercise catalog. Admin mutations on it invalidate
/// the in-memory catalog cache.
pub const EXERCISE_TABLE: &str = "exercise";

/// Client location class a session is bound to.
///
/// A user holds at most one live session per location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    /// Browser client.
    Web,
    /// Mobile application.
    Mobile,
}

impl Location {
    /// Returns the string stored in the `login.location` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Mobile => "mobile",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known [`Location`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown location: {0}")]
pub struct ParseLocationError(pub String);

impl FromStr for Location {
    type Err = ParseLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web" => Ok(Self::Web),
            "mobile" => Ok(Self::Mobile),
            other => Err(ParseLocationError(other.to_string())),
        }
    }
}

/// Outcome of a successful admin table mutation.
///
/// `CatalogChanged` is the cache-invalidation signal: the caller must
/// rebuild anything derived from the exercise catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The mutation was applied to a table with no dependent caches.
    Applied,
    /// The mutation touched the exercise catalog.
    CatalogChanged,
}

impl MutationOutcome {
    /// Picks the outcome for a mutation against `table`.
    pub fn for_table(table: &str) -> Self {
        if table == EXERCISE_TABLE {
            Self::CatalogChanged
        } else {
            Self::Applied
        }
    }
}

/// Converts a loosely-typed stored flag into a boolean.
///
/// Integers are true when non-zero, reals when non-zero, text when it is
/// neither empty nor `"0"`/`"false"`. Everything else is false.
pub fn coerce_flag(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !matches!(s.trim(), "" | "0" | "false"),
        serde_json::Value::Null => false,
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => false,
    }
}
