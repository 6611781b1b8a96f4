//! Proxy configuration model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a proxy configuration fails validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Proxy host is empty.
    #[error("proxy host is empty")]
    EmptyHost,

    /// Proxy port is zero or unparseable.
    #[error("proxy port is invalid")]
    InvalidPort,
}

/// Upstream proxy endpoint plus credentials.
///
/// Mutated only through explicit save/enable/disable actions; the
/// controller and the auth responder read it as a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy host.
    pub host: String,
    /// Proxy port (1-65535; 0 means unset).
    pub port: u16,
    /// Proxy auth username.
    pub username: String,
    /// Proxy auth password (stored in plain form; this is not a security
    /// boundary).
    pub password: String,
    /// Whether the PAC policy should be applied.
    pub enabled: bool,
}

impl ProxyConfig {
    /// Creates a config for the given endpoint with empty credentials.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Checks that the endpoint is usable: non-empty host, non-zero port.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        Ok(())
    }

    /// Returns true if both username and password are present.
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// Formats the endpoint as `host:port`.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Masks a secret for log output: first and last characters kept, the rest
/// replaced with stars. Secrets of two characters or fewer become all stars.
///
/// Operates on characters, not bytes.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let len = chars.len();
    if len == 0 {
        return String::new();
    }
    if len <= 2 {
        return "*".repeat(len);
    }
    let stars = "*".repeat(std::cmp::max(1, len - 2));
    format!("{}{}{}", chars[0], stars, chars[len - 1])
}
