//! Bot configuration loaded from a JSON file.
//!
//! # Data Flow
//! ```text
//! config.json
//!     → load() (read & deserialize)
//!     → validate() (required-field checks)
//!     → BotConfig (validated, immutable)
//! ```
//!
//! All fields are optional at the type level; `mattermost_url` and
//! `personal_access_token` are required at runtime. Configuration is
//! all-or-nothing: any failure here is fatal to the process.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("could not read the config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON.
    #[error("could not parse the config file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required field is missing or empty.
    #[error("please set {0} in the config")]
    MissingField(&'static str),
}

/// Bot configuration.
///
/// Unknown fields are silently ignored for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BotConfig {
    /// Integration name, used in startup/shutdown notices.
    #[serde(default)]
    pub name: Option<String>,

    /// URL of the Mattermost server. Required.
    #[serde(default)]
    pub mattermost_url: Option<String>,

    /// Personal access token for the REST API. Required.
    #[serde(default)]
    pub personal_access_token: Option<String>,

    /// Display name override for posts made by the bot.
    #[serde(default)]
    pub bot_name: Option<String>,

    /// Icon URL override for posts made by the bot.
    #[serde(default)]
    pub bot_icon_url: Option<String>,

    /// Name of the team the bot interacts with.
    #[serde(default)]
    pub team_name: Option<String>,

    /// Name of the channel status messages are logged to.
    #[serde(default)]
    pub channel_name: Option<String>,
}

impl BotConfig {
    /// Load and validate configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: BotConfig = serde_json::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Check that the required fields are present and non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("mattermost_url", &self.mattermost_url),
            ("personal_access_token", &self.personal_access_token),
        ];

        for (field, value) in required {
            match value {
                Some(v) if !v.is_empty() => {}
                _ => return Err(ConfigError::MissingField(field)),
            }
        }

        Ok(())
    }

    /// Integration name, falling back to the binary name.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|s| !s.is_empty()).unwrap_or("matterlog")
    }
}
