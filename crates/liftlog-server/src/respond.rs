//! Response shaping.
//!
//! Every body carries a `success` flag that is true exactly when the status
//! is 200; failures add a `reason`. Handlers never build responses directly:
//! they hand a `Result` to [`Responder::finish`], which consumes the
//! responder, so a request can only ever be answered once.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use liftlog_admin::AdminError;
use liftlog_identity::IdentityError;
use liftlog_training::TrainingError;
use serde_json::{json, Map, Value};
use std::convert::Infallible;
use thiserror::Error;

/// The canonical rejection for absent or malformed body fields.
pub const MISSING_FIELDS_REASON: &str = "Missing or invalid POST field(s)";

/// API error type mapping to HTTP status codes and a `reason`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing or invalid POST field(s)")]
    MissingFields,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    /// The store refused an admin statement.
    #[error("SQL error")]
    StoreRejected,
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingFields | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidToken | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::StoreRejected | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "reason": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::AlreadyExists => Self::BadRequest("Already exists".to_string()),
            IdentityError::InvalidCredentials => {
                Self::BadRequest("Invalid username or password".to_string())
            }
            other => {
                tracing::error!(error = %other, "identity operation failed");
                Self::Internal
            }
        }
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        if err.is_invalid_request() {
            tracing::debug!(error = %err, "admin request rejected");
            Self::MissingFields
        } else {
            tracing::error!(error = %err, "admin statement rejected by store");
            Self::StoreRejected
        }
    }
}

impl From<TrainingError> for ApiError {
    fn from(err: TrainingError) -> Self {
        match err {
            TrainingError::InvalidDate(date) => {
                tracing::debug!(%date, "rejecting invalid date");
                Self::MissingFields
            }
            other => {
                tracing::error!(error = %other, "training operation failed");
                Self::Internal
            }
        }
    }
}

/// Single-use response sink for one request.
#[derive(Debug)]
pub struct Responder {
    route: String,
}

impl Responder {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
        }
    }

    /// Produces this request's response.
    ///
    /// A successful payload that is a JSON object gets `success: true` merged
    /// in; `null` becomes `{success: true}`.
    pub fn finish(self, outcome: Result<Value, ApiError>) -> Response {
        match outcome {
            Ok(payload) => {
                let mut body = match payload {
                    Value::Object(map) => map,
                    Value::Null => Map::new(),
                    other => Map::from_iter([("data".to_string(), other)]),
                };
                body.insert("success".to_string(), Value::Bool(true));
                (StatusCode::OK, Json(Value::Object(body))).into_response()
            }
            Err(err) => {
                tracing::debug!(route = %self.route, reason = %err, status = %err.status(), "request rejected");
                err.into_response()
            }
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Responder {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let route = parts.uri.path().to_string();
        tracing::debug!(%route, method = %parts.method, "handling request");
        Ok(Self::new(route))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn success_merges_flag_into_payload() {
        let response = Responder::new("/t").finish(Ok(json!({"token": "ab"})));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await, json!({"token": "ab", "success": true}));

        let response = Responder::new("/t").finish(Ok(Value::Null));
        assert_eq!(body_of(response).await, json!({"success": true}));
    }

    #[tokio::test]
    async fn failures_carry_reason_and_status() {
        let cases = [
            (ApiError::MissingFields, 400, MISSING_FIELDS_REASON),
            (ApiError::InvalidToken, 401, "Invalid token"),
            (ApiError::Unauthorized, 401, "Unauthorized"),
            (ApiError::StoreRejected, 500, "SQL error"),
            (ApiError::Internal, 500, "Internal server error"),
        ];
        for (err, status, reason) in cases {
            let response = Responder::new("/t").finish(Err(err));
            assert_eq!(response.status().as_u16(), status);
            assert_eq!(
                body_of(response).await,
                json!({"success": false, "reason": reason})
            );
        }
    }

    #[test]
    fn identity_errors_map_to_user_facing_reasons() {
        let err: ApiError = IdentityError::AlreadyExists.into();
        assert_eq!(err.to_string(), "Already exists");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = IdentityError::InvalidCredentials.into();
        assert_eq!(err.to_string(), "Invalid username or password");
    }

    #[test]
    fn admin_errors_split_on_request_versus_store() {
        let err: ApiError = AdminError::UnknownTable("nope".to_string()).into();
        assert!(matches!(err, ApiError::MissingFields));
        let err: ApiError = AdminError::EmptyValues.into();
        assert!(matches!(err, ApiError::MissingFields));
    }
}
