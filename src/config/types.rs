//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::identify::IdentifyBlock;
use super::probe::{DispatchConfig, ProbeConfig};
use crate::casemap::Casemapping;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Client extension configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Connection identity.
    pub connection: ConnectionConfig,
    /// VERSION polling settings.
    #[serde(default)]
    pub probe: ProbeConfig,
    /// Handler chain priorities.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Auto-identify blocks.
    #[serde(default)]
    pub auto_identify: Vec<IdentifyBlock>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Identity of the connection the extension runs on.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Account name (e.g., "me@irc.libera.chat").
    pub account: String,
    /// Nickname used on the connection.
    pub nick: String,
    /// Nickname folding advertised by the server (default: rfc1459).
    #[serde(default)]
    pub casemapping: Casemapping,
}
