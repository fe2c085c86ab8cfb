//! Per-request authorization gate.
//!
//! The gate resolves the `X-Token` header lazily: nothing touches the
//! database until a handler asks. Both answers are memoized for the rest of
//! the request.
//!
//! ```text
//! Unresolved --user_id()--> Anonymous      (Invalid token)
//!                       \-> Authenticated --require_admin()--> NotAdmin (Unauthorized)
//!                                                         \-> Admin    (schema rebuilt)
//! ```
//!
//! Admin can only be reached through Authenticated, and an anonymous caller
//! hitting an admin route sees the login failure, not a second rejection.

use crate::respond::ApiError;
use crate::{with_conn, AppState};
use axum::{extract::FromRequestParts, http::request::Parts};
use liftlog_admin::SchemaSnapshot;
use liftlog_identity::{is_admin, resolve_session};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Header carrying the session token.
pub const TOKEN_HEADER: &str = "X-Token";

pub struct AuthGate {
    state: Arc<AppState>,
    token: Option<String>,
    user: OnceCell<Option<i64>>,
    admin: OnceCell<bool>,
}

impl AuthGate {
    pub fn new(state: Arc<AppState>, token: Option<String>) -> Self {
        Self {
            state,
            token,
            user: OnceCell::new(),
            admin: OnceCell::new(),
        }
    }

    /// The caller's user id.
    ///
    /// # Errors
    ///
    /// `ApiError::InvalidToken` when the header is absent or matches no
    /// session.
    pub async fn user_id(&self) -> Result<i64, ApiError> {
        let resolved = self
            .user
            .get_or_try_init(|| async {
                let Some(token) = self.token.clone() else {
                    return Ok(None);
                };
                with_conn(&self.state, move |conn| Ok(resolve_session(conn, &token)?)).await
            })
            .await?;
        resolved.ok_or(ApiError::InvalidToken)
    }

    /// Confirms the caller is an administrator and returns a freshly
    /// introspected schema snapshot.
    ///
    /// # Errors
    ///
    /// `ApiError::InvalidToken` if not logged in, `ApiError::Unauthorized`
    /// if logged in without the admin flag.
    pub async fn require_admin(&self) -> Result<Arc<SchemaSnapshot>, ApiError> {
        let user_id = self.user_id().await?;
        let admin = *self
            .admin
            .get_or_try_init(|| {
                with_conn(&self.state, move |conn| Ok(is_admin(conn, user_id)?))
            })
            .await?;
        if !admin {
            tracing::info!(user_id, "non-admin rejected from admin route");
            return Err(ApiError::Unauthorized);
        }

        let schema = Arc::clone(&self.state.schema);
        with_conn(&self.state, move |conn| Ok(schema.rebuild(conn)?)).await
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthGate {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let state = parts
            .extensions
            .get::<Arc<AppState>>()
            .cloned()
            .ok_or_else(|| {
                tracing::error!("application state missing from request extensions");
                ApiError::Internal
            })?;
        let token = parts
            .headers
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        Ok(Self::new(state, token))
    }
}
