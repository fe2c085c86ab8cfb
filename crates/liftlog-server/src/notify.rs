//! Out-of-band delivery of password reset tokens.

use liftlog_identity::{hash_password, ResetGrant};
use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct ResetNotification {
    username: String,
    email: String,
    token: String,
    /// bcrypt digest of the shared email secret.
    email_token: String,
}

#[derive(Debug, Clone)]
struct NotifyTarget {
    client: reqwest::Client,
    endpoint: String,
    email_secret: String,
}

/// Posts reset grants to the configured mail endpoint.
#[derive(Debug, Clone)]
pub struct ResetNotifier {
    target: Option<NotifyTarget>,
}

impl ResetNotifier {
    /// Builds a notifier for `endpoint`; `None` yields a disabled notifier.
    ///
    /// # Errors
    ///
    /// Returns the `reqwest` error if the HTTP client cannot be built.
    pub fn new(
        endpoint: Option<String>,
        email_secret: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let Some(endpoint) = endpoint else {
            return Ok(Self::disabled());
        };
        let client = reqwest::Client::builder().timeout(NOTIFY_TIMEOUT).build()?;
        Ok(Self {
            target: Some(NotifyTarget {
                client,
                endpoint,
                email_secret: email_secret.into(),
            }),
        })
    }

    /// A notifier that only logs.
    pub fn disabled() -> Self {
        Self { target: None }
    }

    /// Sends `grant` in the background and returns the delivery task.
    ///
    /// Delivery never fails the caller: the reset token is already stored,
    /// and errors are only logged. Returns `None` when disabled.
    pub fn notify(&self, grant: ResetGrant) -> Option<JoinHandle<()>> {
        let Some(target) = self.target.clone() else {
            tracing::debug!(user_id = grant.user_id, "no reset notify_url configured, skipping notification");
            return None;
        };

        Some(tokio::spawn(async move {
            let secret = target.email_secret;
            let email_token = match tokio::task::spawn_blocking(move || hash_password(&secret)).await {
                Ok(Ok(digest)) => digest,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "failed to hash email secret, reset notification dropped");
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "email secret hashing task failed");
                    return;
                }
            };

            let user_id = grant.user_id;
            let payload = ResetNotification {
                username: grant.username,
                email: grant.email,
                token: grant.token,
                email_token,
            };

            match target.client.post(&target.endpoint).json(&payload).send().await {
                Ok(response) => {
                    tracing::info!(user_id, status = %response.status(), "reset notification sent");
                }
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "reset notification failed");
                }
            }
        }))
    }
}
