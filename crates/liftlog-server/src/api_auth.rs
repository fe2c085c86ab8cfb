//! Account handlers: login, signup and user details.

use crate::gate::AuthGate;
use crate::respond::{ApiError, Responder};
use crate::validate::Fields;
use crate::{with_conn, AppState};
use axum::{body::Bytes, extract::Extension, response::Response};
use liftlog_identity::{login, refresh_session, register_user, user_details};
use liftlog_types::Location;
use serde_json::{json, Value};
use std::sync::Arc;

fn location(fields: &Fields) -> Result<Location, ApiError> {
    fields
        .text("location")?
        .parse()
        .map_err(|_| ApiError::MissingFields)
}

/// Handler for `GET /api/user`.
pub async fn user_details_handler(responder: Responder, gate: AuthGate) -> Response {
    responder.finish(handle_user_details(&gate).await)
}

async fn handle_user_details(gate: &AuthGate) -> Result<Value, ApiError> {
    let user_id = gate.user_id().await?;
    let details = with_conn(gate.state(), move |conn| Ok(user_details(conn, user_id)?))
        .await?
        .ok_or(ApiError::InvalidToken)?;
    serde_json::to_value(details).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize user details");
        ApiError::Internal
    })
}

/// Handler for `POST /api/login`.
///
/// Issues a new token for the requested location, replacing the previous
/// session held there.
pub async fn login_handler(
    responder: Responder,
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Response {
    responder.finish(handle_login(&state, Fields::parse(&body)).await)
}

async fn handle_login(state: &Arc<AppState>, fields: Fields) -> Result<Value, ApiError> {
    fields.require(&["user", "password", "location"])?;
    let user = fields.text("user")?;
    let password = fields.text("password")?;
    let location = location(&fields)?;

    let token = with_conn(state, move |conn| {
        Ok(login(conn, &user, &password, location)?)
    })
    .await?;
    Ok(json!({ "token": token }))
}

/// Handler for `POST /api/signup`.
pub async fn signup_handler(
    responder: Responder,
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Response {
    responder.finish(handle_signup(&state, Fields::parse(&body)).await)
}

async fn handle_signup(state: &Arc<AppState>, fields: Fields) -> Result<Value, ApiError> {
    fields.require(&["username", "email", "password", "location"])?;
    let username = fields.text("username")?;
    let email = fields.text("email")?;
    let password = fields.text("password")?;
    let location = location(&fields)?;

    let token = with_conn(state, move |conn| {
        let user_id = register_user(conn, &username, &email, &password)?;
        tracing::info!(user_id, %username, "account registered");
        Ok(refresh_session(conn, user_id, location)?)
    })
    .await?;
    Ok(json!({ "token": token }))
}
