use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

/// Server settings, read from an optional TOML file and then overridden by
/// command-line flags.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Lifetime of tokens issued by login.
    pub token_ttl_minutes: i64,
}

impl ServerConfig {
    /// Reads a TOML config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    fn from_toml(content: &str) -> std::result::Result<Self, String> {
        let config: Self = toml::from_str(content).map_err(|e| e.to_string())?;
        if config.token_ttl_minutes <= 0 {
            return Err("token_ttl_minutes must be positive".to_string());
        }
        Ok(config)
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("rightsdesk.db")
    }

    #[must_use]
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.token_ttl_minutes)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
        }
    }
}
