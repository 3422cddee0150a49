//! Error types for the matterlog bot.
//!
//! Failures fall into two tiers decided by the caller, not the error
//! type: fatal (bad config, unreachable server) and reported (channel
//! resolution, post sends, the event stream). [`BotError::report`] is
//! the single reporting path used by every component.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use tracing::error;

use crate::config::ConfigError;

/// Error body returned by the Mattermost REST API.
///
/// Mirrors the server's `AppError` JSON schema. Fields the server
/// omits deserialize to empty values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppError {
    /// Stable error identifier (e.g. `api.context.session_expired.app_error`).
    #[serde(default)]
    pub id: String,

    /// Human-readable error message.
    #[serde(default)]
    pub message: String,

    /// Extra detail intended for developers.
    #[serde(default)]
    pub detailed_error: String,

    /// ID of the request that failed, when available.
    #[serde(default)]
    pub request_id: String,

    /// HTTP status code the server reported.
    #[serde(default)]
    pub status_code: i32,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.id)
    }
}

/// Top-level error type for the bot.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BotError {
    /// Configuration is missing, unreadable, or invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP request itself failed (connection refused, timeout, bad body).
    #[error("http request failed: {0}")]
    Http(String),

    /// The server answered with a Mattermost error body.
    #[error("mattermost api error: {0}")]
    Api(AppError),

    /// The event stream could not be opened or broke down.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// An event arrived with a shape we could not decode.
    #[error("malformed {event} event: {reason}")]
    MalformedEvent {
        /// Event-type tag of the offending event.
        event: String,
        /// What was wrong with the payload.
        reason: String,
    },

    /// A post was attempted before the logging channel was resolved.
    #[error("logging channel is not resolved")]
    ChannelUnresolved,

    /// JSON serialization / deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BotError {
    /// Log this failure with full detail.
    ///
    /// API errors carry the server's message, id, and detailed-error
    /// fields as structured fields; everything else is rendered through
    /// its `Display` impl.
    pub fn report(&self, context: &str) {
        match self {
            BotError::Api(app) => error!(
                message = %app.message,
                id = %app.id,
                detailed_error = %app.detailed_error,
                "{context}"
            ),
            other => error!(error = %other, "{context}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_deserializes_server_body() {
        let json = r#"{
            "id": "store.sql_channel.get_by_name.missing.app_error",
            "message": "Channel does not exist.",
            "detailed_error": "channel_name=missing",
            "request_id": "req-1",
            "status_code": 404
        }"#;
        let err: AppError = serde_json::from_str(json).unwrap();
        assert_eq!(err.id, "store.sql_channel.get_by_name.missing.app_error");
        assert_eq!(err.message, "Channel does not exist.");
        assert_eq!(err.detailed_error, "channel_name=missing");
        assert_eq!(err.status_code, 404);
    }

    #[test]
    fn app_error_tolerates_partial_body() {
        let err: AppError = serde_json::from_str(r#"{"message": "nope"}"#).unwrap();
        assert_eq!(err.message, "nope");
        assert!(err.id.is_empty());
        assert_eq!(err.status_code, 0);
    }

    #[test]
    fn display_includes_message_and_id() {
        let err = AppError {
            id: "some.id".into(),
            message: "Something broke.".into(),
            ..Default::default()
        };
        assert_eq!(
            BotError::Api(err).to_string(),
            "mattermost api error: Something broke. (some.id)"
        );
    }
}
