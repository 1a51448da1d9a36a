//! Server configuration.
//!
//! Every field has a default, so a config file only needs the settings
//! it wants to change:
//!
//! ```toml
//! bind_addr = "0.0.0.0:5491"
//! accounts_file = "PlayerAccountData.txt"
//! max_connections = 1000
//! idle_timeout_secs = 0
//! encoding = "utf8"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use pairplay_protocol::Encoding;
use serde::Deserialize;

/// Errors loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file couldn't be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file isn't valid TOML, or has unknown/mistyped keys.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings for one server process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// Text file holding one `name,password` record per line.
    pub accounts_file: PathBuf,

    /// Connections beyond this many are closed right after accept.
    pub max_connections: usize,

    /// Drop a connection after this many seconds without a message.
    /// 0 disables the timeout (waiting players may idle indefinitely).
    pub idle_timeout_secs: u64,

    /// How each record is encoded on the wire.
    pub encoding: Encoding,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5491".to_string(),
            accounts_file: PathBuf::from("PlayerAccountData.txt"),
            max_connections: 1000,
            idle_timeout_secs: 0,
            encoding: Encoding::Utf8,
        }
    }
}

impl ServerConfig {
    /// Reads a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses TOML config text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// The idle timeout, or `None` if disabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}
