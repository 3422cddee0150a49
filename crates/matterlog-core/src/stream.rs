//! WebSocket event stream listener.
//!
//! Derives the stream endpoint from the REST URL, opens the socket with
//! the same bearer token, and runs a receive loop that dispatches
//! `posted` events to a [`PostHandler`]. The loop is long-lived: it
//! runs until the [`CancellationToken`] fires or the socket ends.
//! There is deliberately no reconnect: a broken stream is reported and
//! the process keeps running without event handling.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::API_PREFIX;
use crate::error::BotError;
use crate::events::{EVENT_POSTED, Post, WebSocketEvent};

/// Consumer of decoded posts from the event stream.
///
/// The seam between the receive loop and whatever acts on posts, so
/// dispatch can be exercised without a live socket.
#[async_trait]
pub trait PostHandler: Send + Sync {
    /// Called for every decoded `posted` event.
    async fn on_post(&self, post: Post);
}

/// Derive the WebSocket base URL from a REST URL.
///
/// `http://…` becomes `ws://…` and `https://…` becomes `wss://…`.
/// Any other scheme has no WebSocket counterpart and yields `None`.
pub fn websocket_url(rest_url: &str) -> Option<String> {
    if let Some(rest) = rest_url.strip_prefix("http://") {
        Some(format!("ws://{rest}"))
    } else if let Some(rest) = rest_url.strip_prefix("https://") {
        Some(format!("wss://{rest}"))
    } else {
        None
    }
}

/// Listener for the Mattermost push-event stream.
pub struct EventStream {
    /// Full WebSocket endpoint, `None` when the REST URL has no
    /// derivable counterpart.
    endpoint: Option<String>,
    /// Bearer token sent on the upgrade request.
    token: String,
}

impl EventStream {
    /// Create a listener for the given REST URL and access token.
    pub fn new(rest_url: &str, token: impl Into<String>) -> Self {
        Self {
            endpoint: websocket_url(rest_url).map(|ws| format!("{ws}{API_PREFIX}/websocket")),
            token: token.into(),
        }
    }

    /// Return the derived WebSocket endpoint, if any.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Connect and run the receive loop until cancellation or the
    /// socket ends.
    ///
    /// Cancellation closes the socket gracefully and returns `Ok`.
    /// Connection failures and mid-stream errors are returned for the
    /// caller to report; they are not retried here.
    pub async fn run(
        &self,
        handler: Arc<dyn PostHandler>,
        cancel: CancellationToken,
    ) -> Result<(), BotError> {
        let Some(endpoint) = self.endpoint.as_deref() else {
            return Err(BotError::WebSocket(
                "cannot derive a websocket endpoint from the server url".into(),
            ));
        };

        let mut request = endpoint
            .into_client_request()
            .map_err(|e| BotError::WebSocket(e.to_string()))?;
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|e| BotError::WebSocket(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, auth);

        let (ws_stream, _) = connect_async(request)
            .await
            .map_err(|e| BotError::WebSocket(e.to_string()))?;

        info!(endpoint = %endpoint, "event stream connected");

        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("event stream received cancellation");
                    let _ = ws_write.close().await;
                    return Ok(());
                }
                msg = ws_read.next() => {
                    match msg {
                        Some(Ok(WsMessage::Text(text))) => {
                            match serde_json::from_str::<WebSocketEvent>(&text) {
                                Ok(event) => dispatch(&event, handler.as_ref()).await,
                                Err(e) => {
                                    debug!(error = %e, "received non-event frame, skipping");
                                }
                            }
                        }
                        Some(Ok(WsMessage::Ping(data))) => {
                            let _ = ws_write.send(WsMessage::Pong(data)).await;
                        }
                        Some(Ok(WsMessage::Close(_))) => {
                            info!("event stream closed by server");
                            return Ok(());
                        }
                        Some(Err(e)) => {
                            return Err(BotError::WebSocket(e.to_string()));
                        }
                        None => {
                            info!("event stream ended");
                            return Ok(());
                        }
                        _ => {} // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

/// Dispatch a single event by its tag.
///
/// Only `posted` events are interpreted; every other tag is skipped.
/// Malformed `posted` payloads are logged and dropped rather than
/// surfaced as loop errors.
pub(crate) async fn dispatch(event: &WebSocketEvent, handler: &dyn PostHandler) {
    match event.event.as_str() {
        EVENT_POSTED => match Post::from_event(event) {
            Ok(post) => handler.on_post(post).await,
            Err(e) => {
                debug!(error = %e, "malformed posted event, skipping");
            }
        },
        other => {
            debug!(event_type = %other, "skipping unhandled event type");
        }
    }
}
