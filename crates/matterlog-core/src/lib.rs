//! Core library for matterlog, a minimal Mattermost integration bot.
//!
//! The bot authenticates to the Mattermost REST API with a personal
//! access token, verifies server liveness, resolves a logging channel,
//! posts startup/shutdown notices, and listens on the WebSocket event
//! stream to log incoming posts.
//!
//! # Architecture
//!
//! ```text
//! config.json ──> BotConfig ──> Bot ──> MattermostClient (REST)
//!                                │         ├─ GET /config/client     (liveness)
//!                                │         ├─ GET /teams/…/channels/…(resolve)
//!                                │         └─ POST /posts            (notices)
//!                                │
//!                                └──> EventStream (WebSocket)
//!                                          │
//!                                 CancellationToken
//!                                          │
//!                                 dispatch("posted") ──> PostHandler
//! ```
//!
//! # Error handling
//!
//! All operations return [`BotError`](error::BotError). Whether a
//! failure is fatal is the caller's decision: the binary exits on
//! config and liveness failures and degrades on everything else.

pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod events;
pub mod stream;

pub use api::{Channel, MattermostClient};
pub use bot::{Bot, LoggingPostHandler};
pub use config::{BotConfig, ConfigError};
pub use error::{AppError, BotError};
pub use events::{Post, WebSocketEvent};
pub use stream::{EventStream, PostHandler, websocket_url};
