//! # Server Configuration
//!
//! Environment-based configuration for the report server.

use anyhow::Context;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default location of the campaign CSV
pub const DEFAULT_DATA_PATH: &str = "Data_Detective.csv";

/// Default bind address
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:5000";

/// Report server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub server_addr: SocketAddr,

    /// Campaign CSV read on every request
    pub data_path: PathBuf,

    /// Logging level
    pub log_level: String,
}

impl Config {
    /// Configuration reading `data_path`, with default address and log level.
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            server_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            data_path: data_path.into(),
            log_level: "info".to_string(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let server_addr = env::var("SERVER_ADDR")
            .unwrap_or_else(|_| DEFAULT_SERVER_ADDR.to_string());

        Ok(Self {
            server_addr: server_addr
                .parse()
                .with_context(|| format!("Invalid SERVER_ADDR '{server_addr}'"))?,

            data_path: env::var("DATA_PATH")
                .unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string())
                .into(),

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
