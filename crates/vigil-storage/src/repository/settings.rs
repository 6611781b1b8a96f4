//! Typed proxy-settings load/save on top of the key-value table.

use rusqlite::Connection;
use serde_json::{json, Value};

use vigil_core::ProxyConfig;

use crate::error::Result;
use crate::models::keys;
use crate::repository::ConfigRepo;

/// Repository assembling [`ProxyConfig`] from its individual storage keys.
pub struct SettingsRepo;

impl SettingsRepo {
    /// Load the stored proxy configuration.
    ///
    /// Missing keys fall back to defaults; an unparseable port loads as 0,
    /// which the controller treats as "not configured".
    pub fn load(conn: &Connection) -> Result<ProxyConfig> {
        let port_value: Value = ConfigRepo::get(conn, keys::PROXY_PORT)?.unwrap_or(Value::Null);

        Ok(ProxyConfig {
            host: ConfigRepo::get_string(conn, keys::PROXY_HOST)?,
            port: parse_port(&port_value),
            username: ConfigRepo::get_string(conn, keys::PROXY_USERNAME)?,
            password: ConfigRepo::get_string(conn, keys::PROXY_PASSWORD)?,
            enabled: ConfigRepo::get_or_default(conn, keys::PROXY_ENABLED, false)?,
        })
    }

    /// Save the proxy configuration.
    ///
    /// The port is stored as a string; older stores wrote it that way, so
    /// writes keep the same shape and loads accept both.
    pub fn save(conn: &Connection, cfg: &ProxyConfig) -> Result<()> {
        ConfigRepo::set(conn, keys::PROXY_HOST, &json!(cfg.host))?;
        ConfigRepo::set(conn, keys::PROXY_PORT, &json!(cfg.port.to_string()))?;
        ConfigRepo::set(conn, keys::PROXY_USERNAME, &json!(cfg.username))?;
        ConfigRepo::set(conn, keys::PROXY_PASSWORD, &json!(cfg.password))?;
        ConfigRepo::set(conn, keys::PROXY_ENABLED, &json!(cfg.enabled))?;
        Ok(())
    }

    /// Flip only the enabled flag.
    pub fn set_enabled(conn: &Connection, enabled: bool) -> Result<()> {
        ConfigRepo::set(conn, keys::PROXY_ENABLED, &json!(enabled))
    }
}

/// Parses a stored port value. Accepts a JSON string or number; anything
/// else (or out-of-range) yields 0.
fn parse_port(value: &Value) -> u16 {
    match value {
        Value::String(s) => s.trim().parse().unwrap_or(0),
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u16::try_from(v).ok())
            .unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::run_migrations;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn round_trip() {
        let conn = setup_db();

        let cfg = ProxyConfig {
            host: "10.0.0.1".into(),
            port: 3128,
            username: "user".into(),
            password: "secret".into(),
            enabled: true,
        };
        SettingsRepo::save(&conn, &cfg).unwrap();

        let loaded = SettingsRepo::load(&conn).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn defaults_when_empty() {
        let conn = setup_db();
        let loaded = SettingsRepo::load(&conn).unwrap();
        assert_eq!(loaded, ProxyConfig::default());
        assert!(!loaded.enabled);
    }

    #[test]
    fn port_stored_as_number_still_loads() {
        let conn = setup_db();
        ConfigRepo::set(&conn, keys::PROXY_PORT, &json!(8080)).unwrap();
        assert_eq!(SettingsRepo::load(&conn).unwrap().port, 8080);
    }

    #[test]
    fn garbage_port_loads_as_zero() {
        let conn = setup_db();
        ConfigRepo::set(&conn, keys::PROXY_PORT, &json!("not-a-port")).unwrap();
        assert_eq!(SettingsRepo::load(&conn).unwrap().port, 0);

        ConfigRepo::set(&conn, keys::PROXY_PORT, &json!(123456)).unwrap();
        assert_eq!(SettingsRepo::load(&conn).unwrap().port, 0);
    }

    #[test]
    fn set_enabled_flips_only_flag() {
        let conn = setup_db();

        let cfg = ProxyConfig {
            host: "h".into(),
            port: 1,
            username: "u".into(),
            password: "p".into(),
            enabled: false,
        };
        SettingsRepo::save(&conn, &cfg).unwrap();

        SettingsRepo::set_enabled(&conn, true).unwrap();
        let loaded = SettingsRepo::load(&conn).unwrap();
        assert!(loaded.enabled);
        assert_eq!(loaded.host, "h");
    }
}
