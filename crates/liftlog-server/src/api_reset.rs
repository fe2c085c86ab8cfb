//! Password reset handlers. None of them need a session.

use crate::respond::{ApiError, Responder};
use crate::validate::Fields;
use crate::{with_conn, AppState};
use axum::{body::Bytes, extract::Extension, response::Response};
use chrono::Utc;
use liftlog_identity::{redeem_reset_token, request_password_reset, validate_reset_token};
use serde_json::Value;
use std::sync::Arc;

/// Handler for `POST /api/reset/generate`.
///
/// Unknown accounts get the same rejection as malformed input.
pub async fn generate_handler(
    responder: Responder,
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Response {
    responder.finish(handle_generate(&state, Fields::parse(&body)).await)
}

async fn handle_generate(state: &Arc<AppState>, fields: Fields) -> Result<Value, ApiError> {
    fields.require(&["user"])?;
    let login = fields.text("user")?;

    let grant = with_conn(state, move |conn| {
        Ok(request_password_reset(conn, &login, Utc::now())?)
    })
    .await?
    .ok_or(ApiError::MissingFields)?;

    // Delivery runs detached; its outcome is only logged.
    let _delivery = state.notifier.notify(grant);
    Ok(Value::Null)
}

/// Handler for `POST /api/reset/validate`.
pub async fn validate_handler(
    responder: Responder,
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Response {
    responder.finish(handle_validate(&state, Fields::parse(&body)).await)
}

async fn handle_validate(state: &Arc<AppState>, fields: Fields) -> Result<Value, ApiError> {
    fields.require(&["token"])?;
    let token = fields.text("token")?;

    let live = with_conn(state, move |conn| {
        Ok(validate_reset_token(conn, &token, Utc::now())?)
    })
    .await?;
    if !live {
        return Err(ApiError::MissingFields);
    }
    Ok(Value::Null)
}

/// Handler for `POST /api/reset`.
pub async fn redeem_handler(
    responder: Responder,
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Response {
    responder.finish(handle_redeem(&state, Fields::parse(&body)).await)
}

async fn handle_redeem(state: &Arc<AppState>, fields: Fields) -> Result<Value, ApiError> {
    fields.require(&["password", "token"])?;
    let password = fields.text("password")?;
    let token = fields.text("token")?;

    let redeemed = with_conn(state, move |conn| {
        Ok(redeem_reset_token(conn, &token, &password, Utc::now())?)
    })
    .await?;
    if !redeemed {
        return Err(ApiError::MissingFields);
    }
    Ok(Value::Null)
}
