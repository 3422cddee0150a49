//! Bot orchestration.
//!
//! [`Bot`] is the owned application state: configuration, REST client,
//! and the logging channel reference resolved once at startup. Nothing
//! here is global; the binary constructs one `Bot` and drives it
//! through the bootstrap sequence.
//!
//! Failure semantics follow the two-tier taxonomy: a failed
//! [`verify_server`](Bot::verify_server) is fatal to the caller, while
//! channel resolution and post sends degrade without crashing.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::{Channel, MattermostClient};
use crate::config::BotConfig;
use crate::error::BotError;
use crate::events::Post;
use crate::stream::{EventStream, PostHandler};

/// The bot's application state.
#[derive(Debug)]
pub struct Bot {
    /// Immutable configuration.
    config: BotConfig,
    /// REST client, read-only after construction.
    client: MattermostClient,
    /// Logging channel, resolved once at startup; stays `None` when
    /// resolution fails and later posts fail individually.
    logging_channel: Option<Channel>,
}

impl Bot {
    /// Build a bot from validated configuration.
    ///
    /// Validation is re-checked here so a `Bot` can never exist with a
    /// missing server URL or token.
    pub fn new(config: BotConfig) -> Result<Self, BotError> {
        config.validate()?;

        let url = config.mattermost_url.clone().unwrap_or_default();
        let token = config.personal_access_token.clone().unwrap_or_default();

        Ok(Self {
            client: MattermostClient::new(url, token),
            config,
            logging_channel: None,
        })
    }

    /// Return the configuration.
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Return the resolved logging channel, if any.
    pub fn logging_channel(&self) -> Option<&Channel> {
        self.logging_channel.as_ref()
    }

    /// Check that the server is up by fetching its client config.
    ///
    /// Returns the server version string. Callers treat failure as
    /// fatal: the bot cannot do anything without a live server.
    pub async fn verify_server(&self) -> Result<String, BotError> {
        let props = self.client.get_client_config().await?;
        let version = props.get("Version").cloned().unwrap_or_default();

        info!(version = %version, "server detected and running");

        Ok(version)
    }

    /// Resolve the logging channel from the configured team and
    /// channel names.
    ///
    /// Non-fatal: on error the channel reference stays unset and the
    /// caller continues with degraded posting.
    pub async fn resolve_logging_channel(&mut self) -> Result<(), BotError> {
        let channel_name = self
            .config
            .channel_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(crate::config::ConfigError::MissingField("channel_name"))?;
        let team_name = self
            .config
            .team_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(crate::config::ConfigError::MissingField("team_name"))?;

        let channel = self
            .client
            .get_channel_by_name_for_team_name(channel_name, team_name)
            .await?;

        info!(
            channel_id = %channel.id,
            channel = %channel.name,
            "resolved logging channel"
        );

        self.logging_channel = Some(channel);
        Ok(())
    }

    /// Post a message to the logging channel.
    ///
    /// Fails with [`BotError::ChannelUnresolved`] when the channel was
    /// never resolved. `reply_to` threads the post under an existing
    /// one; pass `""` for a top-level post.
    pub async fn post_to_logging_channel(
        &self,
        message: &str,
        reply_to: &str,
    ) -> Result<(), BotError> {
        let channel = self
            .logging_channel
            .as_ref()
            .ok_or(BotError::ChannelUnresolved)?;

        let post = Post {
            channel_id: channel.id.clone(),
            message: message.to_owned(),
            root_id: reply_to.to_owned(),
            props: self.post_props(),
            ..Default::default()
        };

        self.client.create_post(&post).await?;
        Ok(())
    }

    /// Post the startup notice.
    pub async fn announce_startup(&self) -> Result<(), BotError> {
        self.post_to_logging_channel(&self.startup_notice(), "").await
    }

    /// Post the shutdown notice.
    pub async fn announce_shutdown(&self) -> Result<(), BotError> {
        self.post_to_logging_channel(&self.shutdown_notice(), "").await
    }

    /// Run the shutdown sequence: cancel the event stream (its receive
    /// loop closes the socket), then make a single attempt to post the
    /// shutdown notice.
    pub async fn shutdown(&self, cancel: &CancellationToken) -> Result<(), BotError> {
        cancel.cancel();
        self.announce_shutdown().await
    }

    /// Build an event stream listener sharing this bot's credentials.
    pub fn event_stream(&self) -> EventStream {
        EventStream::new(self.client.base_url(), self.client.token())
    }

    /// Startup notice text.
    pub fn startup_notice(&self) -> String {
        format!("_{} has **started** running_", self.config.display_name())
    }

    /// Shutdown notice text.
    pub fn shutdown_notice(&self) -> String {
        format!("_{} has **stopped** running_", self.config.display_name())
    }

    /// Properties attached to every outbound post: display-name and
    /// icon overrides plus the marker identifying it as a bot post.
    fn post_props(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut props = serde_json::Map::new();
        if let Some(name) = self.config.bot_name.as_deref() {
            props.insert("override_username".into(), name.into());
        }
        if let Some(icon) = self.config.bot_icon_url.as_deref() {
            props.insert("override_icon_url".into(), icon.into());
        }
        props.insert("from_webhook".into(), "true".into());
        props
    }
}

/// Default [`PostHandler`]: logs every incoming post.
pub struct LoggingPostHandler;

#[async_trait]
impl PostHandler for LoggingPostHandler {
    async fn on_post(&self, post: Post) {
        info!(
            user_id = %post.user_id,
            channel_id = %post.channel_id,
            message = %post.message,
            "received post"
        );
    }
}
