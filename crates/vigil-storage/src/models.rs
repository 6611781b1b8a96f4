//! Storage models and persisted key names.

use serde_json::Value;

/// Persisted key names.
///
/// The camelCase names are load-bearing: stores written by earlier
/// releases use them, and they must keep importing as-is.
pub mod keys {
    /// Proxy host (string).
    pub const PROXY_HOST: &str = "proxyHost";
    /// Proxy port (stored as a string; parsed on load).
    pub const PROXY_PORT: &str = "proxyPort";
    /// Proxy auth username (string).
    pub const PROXY_USERNAME: &str = "proxyUsername";
    /// Proxy auth password (string, plain form).
    pub const PROXY_PASSWORD: &str = "proxyPassword";
    /// Whether the PAC policy is enabled (bool).
    pub const PROXY_ENABLED: &str = "proxyEnabled";
    /// Serialized diagnostics snapshot (object).
    pub const PROXY_DIAGNOSTICS: &str = "proxyDiagnostics";
    /// Per-device identifier (string, UUID format).
    pub const APP_ID: &str = "appId";
}

/// A single key-value row in the config table.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    /// The storage key.
    pub key: String,
    /// The JSON value.
    pub value: Value,
}
