//! Server configuration from an optional TOML file and command-line flags
//!
//! Values are resolved in order: built-in defaults, then the TOML file given
//! with `--config`, then any flag passed explicitly on the command line.

use crate::error::ServerError;
use clap::Parser;
use serde::Deserialize;
use shared::DEFAULT_PORT;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_configs_dir() -> PathBuf {
    PathBuf::from("predefined_configs")
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Game of Life session server")]
pub struct CliArgs {
    /// Server IP address to bind to
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Milliseconds between generations of a running session
    #[arg(short, long)]
    pub tick_ms: Option<u64>,

    /// Directory holding the grid configurations sessions can start from
    #[arg(short, long)]
    pub configs_dir: Option<PathBuf>,

    /// TOML file with server settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_configs_dir")]
    pub configs_dir: PathBuf,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
            tick_interval_ms: default_tick_interval_ms(),
            configs_dir: default_configs_dir(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ServerError> {
        let config: Self = toml::from_str(content)?;
        config.validate()
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ServerError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Builds the effective configuration for a set of command line arguments
    pub fn resolve(args: &CliArgs) -> Result<Self, ServerError> {
        let mut config = match &args.config {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };

        if let Some(host) = &args.host {
            config.host = host.clone();
        }
        if let Some(port) = args.port {
            config.port = port;
        }
        if let Some(tick_ms) = args.tick_ms {
            config.tick_interval_ms = tick_ms;
        }
        if let Some(dir) = &args.configs_dir {
            config.configs_dir = dir.clone();
        }

        config.validate()
    }

    fn validate(self) -> Result<Self, ServerError> {
        if self.tick_interval_ms == 0 {
            return Err(ServerError::Config(
                "tick interval must be at least 1 ms".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
