//! Mattermost WebSocket event and post types.
//!
//! The server emits tagged events over the WebSocket. Each carries an
//! `event` string, an untyped `data` object, and a sequence number.
//! Only the `posted` tag is interpreted by this bot; its post rides
//! inside `data["post"]` as a JSON-encoded string, so decoding it is a
//! two-step parse that fails closed on any shape mismatch.

use serde::{Deserialize, Serialize};

use crate::error::BotError;

/// Event-type tag for a newly created post.
pub const EVENT_POSTED: &str = "posted";

/// A tagged event received from the WebSocket.
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketEvent {
    /// Event-type tag (e.g. `"posted"`, `"hello"`, `"typing"`).
    #[serde(default)]
    pub event: String,

    /// Event payload; shape depends on the tag.
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,

    /// Server-assigned sequence number.
    #[serde(default)]
    pub seq: i64,
}

/// A Mattermost post, sent outbound via the REST API and received
/// inbound inside `posted` events.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Post {
    /// Post ID, assigned by the server.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// ID of the authoring user.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,

    /// ID of the channel the post belongs to.
    #[serde(default)]
    pub channel_id: String,

    /// Message body.
    #[serde(default)]
    pub message: String,

    /// ID of the post this replies to, empty for top-level posts.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub root_id: String,

    /// Free-form properties; carries the bot overrides on outbound posts.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub props: serde_json::Map<String, serde_json::Value>,
}

impl Post {
    /// Decode the post carried by a `posted` event.
    ///
    /// The post is a JSON-encoded string under `data["post"]`. Any
    /// mismatch (wrong tag, missing key, non-string value, invalid
    /// JSON) is an error; callers log it and drop the event.
    pub fn from_event(event: &WebSocketEvent) -> Result<Self, BotError> {
        if event.event != EVENT_POSTED {
            return Err(BotError::MalformedEvent {
                event: event.event.clone(),
                reason: "not a posted event".into(),
            });
        }

        let raw = event
            .data
            .get("post")
            .ok_or_else(|| BotError::MalformedEvent {
                event: event.event.clone(),
                reason: "missing post payload".into(),
            })?
            .as_str()
            .ok_or_else(|| BotError::MalformedEvent {
                event: event.event.clone(),
                reason: "post payload is not a string".into(),
            })?;

        serde_json::from_str(raw).map_err(|e| BotError::MalformedEvent {
            event: event.event.clone(),
            reason: format!("post payload is not valid JSON: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posted_event(post_payload: serde_json::Value) -> WebSocketEvent {
        let mut data = serde_json::Map::new();
        data.insert("post".into(), post_payload);
        WebSocketEvent {
            event: EVENT_POSTED.into(),
            data,
            seq: 1,
        }
    }

    #[test]
    fn deserialize_posted_event() {
        let json = r#"{
            "event": "posted",
            "data": {
                "channel_display_name": "Debugging",
                "post": "{\"id\":\"p1\",\"user_id\":\"u1\",\"channel_id\":\"c1\",\"message\":\"hi\"}"
            },
            "broadcast": {"channel_id": "c1"},
            "seq": 7
        }"#;
        let event: WebSocketEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event, "posted");
        assert_eq!(event.seq, 7);

        let post = Post::from_event(&event).unwrap();
        assert_eq!(post.user_id, "u1");
        assert_eq!(post.channel_id, "c1");
        assert_eq!(post.message, "hi");
    }

    #[test]
    fn deserialize_hello_event() {
        let json = r#"{"event": "hello", "data": {"server_version": "5.0.0"}, "seq": 0}"#;
        let event: WebSocketEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event, "hello");
        assert!(Post::from_event(&event).is_err());
    }

    #[test]
    fn from_event_rejects_missing_payload() {
        let event = WebSocketEvent {
            event: EVENT_POSTED.into(),
            data: serde_json::Map::new(),
            seq: 1,
        };
        let err = Post::from_event(&event).unwrap_err();
        assert!(err.to_string().contains("missing post payload"));
    }

    #[test]
    fn from_event_rejects_non_string_payload() {
        let event = posted_event(serde_json::json!({"user_id": "u1"}));
        let err = Post::from_event(&event).unwrap_err();
        assert!(err.to_string().contains("not a string"));
    }

    #[test]
    fn from_event_rejects_invalid_json_payload() {
        let event = posted_event(serde_json::json!("{broken"));
        let err = Post::from_event(&event).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn outbound_post_skips_empty_fields() {
        let post = Post {
            channel_id: "c1".into(),
            message: "hello".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["channel_id"], "c1");
        assert_eq!(json["message"], "hello");
        assert!(json.get("id").is_none());
        assert!(json.get("root_id").is_none());
        assert!(json.get("props").is_none());
    }
}
