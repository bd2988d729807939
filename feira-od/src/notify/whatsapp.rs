//! WhatsApp gateway client
//!
//! Posts text messages through the external WhatsApp HTTP API. One
//! best-effort attempt per call: the only delivery guarantee is the outcome
//! line appended to the log.

use crate::notify::outcome_log::OutcomeLog;
use crate::notify::phone::normalize_phone;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Notification errors
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The gateway answered with a non-success status
    #[error("Gateway error {status}: {body}")]
    Api { status: u16, body: String },

    /// The request never completed (connect failure, timeout, ...)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The HTTP client could not be constructed
    #[error("Client build error: {0}")]
    ClientBuild(String),
}

/// What a send attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Gateway accepted the message (200/201)
    Sent,
    /// Missing phone or instance token; no request was made
    Skipped,
}

/// Wire body for `POST /message/text`
#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    to: &'a str,
    text: &'a str,
}

/// Client for the WhatsApp text-message gateway
#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    http: reqwest::Client,
    endpoint: String,
    outcome_log: OutcomeLog,
}

impl WhatsAppClient {
    /// Build a client for `endpoint` with a fixed per-request timeout.
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        outcome_log: OutcomeLog,
    ) -> Result<Self, NotificationError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotificationError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            outcome_log,
        })
    }

    /// Endpoint messages are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one text message.
    ///
    /// An empty phone or instance token makes the call a logged no-op
    /// (`Skipped`), not an error. Everything else is a single POST; the
    /// outcome - accepted, rejected, or failed on the wire - is appended to
    /// the outcome log before this returns. Callers on the request path
    /// treat `Err` as reportable but non-fatal.
    pub async fn send_text(
        &self,
        phone: &str,
        message: &str,
        instance_token: &str,
    ) -> Result<NotifyOutcome, NotificationError> {
        if phone.is_empty() || instance_token.is_empty() {
            warn!(
                phone = %phone,
                has_token = !instance_token.is_empty(),
                "WhatsApp message not sent: missing phone or instance token"
            );
            return Ok(NotifyOutcome::Skipped);
        }

        let to = normalize_phone(phone);
        let token_id = truncate_token(instance_token);

        let response = self
            .http
            .post(&self.endpoint)
            .header("X-Instance-Token", instance_token)
            .json(&TextMessage { to: &to, text: message })
            .send()
            .await;

        match response {
            Ok(response) => {
                let status = response.status().as_u16();
                if status == 200 || status == 201 {
                    info!(to = %to, "WhatsApp message sent");
                    self.outcome_log
                        .append(&format!("SUCCESS: sent to {} (token {}...)", to, token_id))
                        .await;
                    Ok(NotifyOutcome::Sent)
                } else {
                    let body = response.text().await.unwrap_or_default();
                    warn!(to = %to, status, body = %body, "WhatsApp gateway rejected message");
                    self.outcome_log
                        .append(&format!(
                            "FAILURE: status {} for {}: {} (token {}...)",
                            status, to, body, token_id
                        ))
                        .await;
                    Err(NotificationError::Api { status, body })
                }
            }
            Err(e) => {
                warn!(to = %to, error = %e, "WhatsApp request failed");
                self.outcome_log
                    .append(&format!("EXCEPTION: {} (token {}...)", e, token_id))
                    .await;
                Err(NotificationError::Network(e))
            }
        }
    }
}

/// First five characters of the token, enough to tell tenants apart in logs
/// without recording the credential
fn truncate_token(token: &str) -> String {
    token.chars().take(5).collect()
}
