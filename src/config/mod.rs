//! Configuration management

use crate::relay::DEFAULT_STREAM_NAME;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub sessions: SessionsConfig,
    pub transport: TransportConfig,
}

/// Listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub bind: String,

    /// TCP port
    pub port: u16,

    /// Send permissive CORS headers (pages served from another origin)
    pub allow_any_origin: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 5000,
            allow_any_origin: true,
        }
    }
}

/// Session defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Label for sessions created without a name
    pub default_name: String,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            default_name: DEFAULT_STREAM_NAME.to_string(),
        }
    }
}

/// Connection transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Outbound queue depth per connection; a full queue drops events
    pub outbound_buffer: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            outbound_buffer: 256,
        }
    }
}

impl Config {
    /// Load config from an explicit path, or from the default location,
    /// or return defaults if neither exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let default_path = Self::config_path();
                if default_path.exists() {
                    Self::load_from(&default_path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    /// Load config from a TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("camrelay")
            .join("config.toml")
    }

    /// Address the server listens on
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .server
            .bind
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.server.bind))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}
