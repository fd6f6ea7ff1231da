//! Application configuration.
//!
//! Defaults live here as constants. The server settings can be overridden
//! through the environment (a `.env` file is loaded by the binary).

use std::env;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8000;

/// Maximum size of one uploaded file (in bytes).
///
/// 100 MB limit: a full year of state cases fits comfortably.
pub const MAX_UPLOAD_SIZE: usize = 100 * 1024 * 1024;

/// Capacity of the log broadcast channel.
pub const LOG_CHANNEL_CAPACITY: usize = 100;

/// Environment variable overriding [`DEFAULT_PORT`].
pub const PORT_ENV: &str = "CASERECON_PORT";

/// Environment variable overriding [`MAX_UPLOAD_SIZE`].
pub const MAX_UPLOAD_ENV: &str = "CASERECON_MAX_UPLOAD_BYTES";

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_upload_bytes: MAX_UPLOAD_SIZE,
        }
    }
}

impl ServerConfig {
    /// Read settings from the environment, falling back to defaults for
    /// unset or unparsable values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: lookup(PORT_ENV)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            max_upload_bytes: lookup(MAX_UPLOAD_ENV)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}
