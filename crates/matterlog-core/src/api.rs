//! Mattermost REST API client.
//!
//! [`MattermostClient`] provides typed methods for the subset of the
//! Mattermost API v4 used by the bot: reading the client configuration
//! (liveness check), resolving a channel by name, and creating posts.

use std::collections::HashMap;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, BotError};
use crate::events::Post;

/// Path prefix for all Mattermost API v4 routes.
pub const API_PREFIX: &str = "/api/v4";

/// A Mattermost channel, as returned by the channel lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    /// Unique channel ID.
    pub id: String,

    /// URL slug of the channel.
    #[serde(default)]
    pub name: String,

    /// Human-readable channel name.
    #[serde(default)]
    pub display_name: String,

    /// Channel type: `"O"` (public), `"P"` (private), `"D"` (direct).
    #[serde(default, rename = "type")]
    pub channel_type: String,
}

/// HTTP client for the Mattermost REST API.
///
/// Wraps a [`reqwest::Client`] with a base URL and bearer-token
/// authentication. Read-only after construction, so it is freely
/// shareable across tasks.
#[derive(Debug)]
pub struct MattermostClient {
    /// Shared HTTP client.
    http: Client,
    /// Server base URL, without a trailing slash.
    base_url: String,
    /// Personal access token sent as a bearer credential.
    token: String,
}

impl MattermostClient {
    /// Create a new client for the given server URL and access token.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: token.into(),
        }
    }

    /// Return the server base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Return the access token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Fetch the server's legacy-format client configuration.
    ///
    /// Used as the liveness check; the returned map contains the
    /// server version under the `"Version"` key.
    pub async fn get_client_config(&self) -> Result<HashMap<String, String>, BotError> {
        let url = format!("{}{}/config/client?format=old", self.base_url, API_PREFIX);

        debug!("fetching client config");

        let resp = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await
            .map_err(|e| BotError::Http(e.to_string()))?;

        Self::check(resp)
            .await?
            .json()
            .await
            .map_err(|e| BotError::Http(e.to_string()))
    }

    /// Resolve a channel by its name within a team.
    pub async fn get_channel_by_name_for_team_name(
        &self,
        channel_name: &str,
        team_name: &str,
    ) -> Result<Channel, BotError> {
        let url = format!(
            "{}{}/teams/name/{team_name}/channels/name/{channel_name}",
            self.base_url, API_PREFIX
        );

        debug!(channel = %channel_name, team = %team_name, "resolving channel");

        let resp = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await
            .map_err(|e| BotError::Http(e.to_string()))?;

        Self::check(resp)
            .await?
            .json()
            .await
            .map_err(|e| BotError::Http(e.to_string()))
    }

    /// Create a post.
    ///
    /// Returns the server's view of the created post.
    pub async fn create_post(&self, post: &Post) -> Result<Post, BotError> {
        let url = format!("{}{}/posts", self.base_url, API_PREFIX);

        debug!(channel_id = %post.channel_id, "creating post");

        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(post)
            .send()
            .await
            .map_err(|e| BotError::Http(e.to_string()))?;

        Self::check(resp)
            .await?
            .json()
            .await
            .map_err(|e| BotError::Http(e.to_string()))
    }

    /// Turn a non-success response into a typed error.
    ///
    /// Mattermost reports failures as an `AppError` JSON body; anything
    /// that does not decode as one falls back to the bare status code.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, BotError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        match resp.json::<AppError>().await {
            Ok(app) => Err(BotError::Api(app)),
            Err(_) => Err(BotError::Http(format!("server returned {status}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_stored() {
        let client = MattermostClient::new("http://localhost:8065", "tok");
        assert_eq!(client.base_url(), "http://localhost:8065");
        assert_eq!(client.token(), "tok");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = MattermostClient::new("http://localhost:8065/", "tok");
        assert_eq!(client.base_url(), "http://localhost:8065");
    }

    #[test]
    fn channel_deserializes() {
        let json = r#"{
            "id": "c1",
            "name": "debugging-for-sample-bot",
            "display_name": "Debugging For Sample Bot",
            "type": "O",
            "team_id": "t1"
        }"#;
        let channel: Channel = serde_json::from_str(json).unwrap();
        assert_eq!(channel.id, "c1");
        assert_eq!(channel.name, "debugging-for-sample-bot");
        assert_eq!(channel.channel_type, "O");
    }
}
