//! Configuration module for sockchat
//!
//! JSON configuration with CLI overrides layered on top by `main`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::common::Address;
use crate::error::{Error, Result};

/// Default messenger port
pub const DEFAULT_PORT: u16 = 12345;

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_greeting() -> Option<String> {
    Some("Thank you for connecting".to_string())
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log configuration
    #[serde(default)]
    pub log: LogConfig,

    /// Host to bind (server) or dial (client)
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Run as the listening side
    #[serde(default)]
    pub server: bool,

    /// Line sent to the peer immediately after accept (server role only);
    /// null disables it
    #[serde(default = "default_greeting")]
    pub greeting: Option<String>,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Create a default server configuration
    pub fn default_server() -> Self {
        Config {
            log: LogConfig::default(),
            host: default_host(),
            port: DEFAULT_PORT,
            server: true,
            greeting: default_greeting(),
        }
    }

    /// Create a default client configuration
    pub fn default_client() -> Self {
        Config {
            server: false,
            ..Self::default_server()
        }
    }

    /// The bind/connect address this configuration describes
    pub fn address(&self) -> Result<Address> {
        Address::parse(&format!("{}:{}", self.host, self.port))
    }
}

/// Log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
