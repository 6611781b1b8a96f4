//! High-level database interface.

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use vigil_core::ProxyConfig;

use crate::error::{Result, StorageError};
use crate::models::keys;
use crate::pool::ConnectionPool;
use crate::repository::{ConfigRepo, DeviceRepo, SettingsRepo};

/// High-level database interface for Vigil.
#[derive(Clone)]
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    /// Create a new database in the default app data directory.
    pub fn new() -> Result<Self> {
        let path = Self::default_db_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening database at: {:?}", path);
        let pool = ConnectionPool::new(&path)?;

        Ok(Self { pool })
    }

    /// Create a new database at a specific path.
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening database at: {:?}", path);
        let pool = ConnectionPool::new(&path)?;

        Ok(Self { pool })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let pool = ConnectionPool::in_memory()?;
        Ok(Self { pool })
    }

    /// Get the default database path.
    pub fn default_db_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "vigil", "vigil")
            .ok_or_else(|| StorageError::Config("Could not determine app data directory".into()))?;

        Ok(proj_dirs.data_dir().join("vigil.db"))
    }

    // === Proxy configuration ===

    /// Load the stored proxy configuration.
    pub fn load_proxy_config(&self) -> Result<ProxyConfig> {
        let conn = self.pool.get()?;
        SettingsRepo::load(&conn)
    }

    /// Save the proxy configuration.
    pub fn save_proxy_config(&self, cfg: &ProxyConfig) -> Result<()> {
        let conn = self.pool.get()?;
        SettingsRepo::save(&conn, cfg)
    }

    /// Flip only the enabled flag.
    pub fn set_proxy_enabled(&self, enabled: bool) -> Result<()> {
        let conn = self.pool.get()?;
        SettingsRepo::set_enabled(&conn, enabled)
    }

    // === Diagnostics snapshot ===

    /// Persist the full diagnostics snapshot.
    ///
    /// Every diagnostics mutation persists the whole snapshot rather than a
    /// delta; at this scale simplicity wins over efficiency.
    pub fn save_diagnostics<T: Serialize>(&self, snapshot: &T) -> Result<()> {
        let conn = self.pool.get()?;
        let value = serde_json::to_value(snapshot)?;
        ConfigRepo::set(&conn, keys::PROXY_DIAGNOSTICS, &value)
    }

    /// Load the persisted diagnostics snapshot, if any.
    pub fn load_diagnostics<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let conn = self.pool.get()?;
        match ConfigRepo::get(&conn, keys::PROXY_DIAGNOSTICS)? {
            Some(value) => Ok(serde_json::from_value(value).ok()),
            None => Ok(None),
        }
    }

    // === Device identifier ===

    /// Get the stored app id, generating one on first use.
    pub fn get_or_create_app_id(&self) -> Result<String> {
        let conn = self.pool.get()?;
        DeviceRepo::get_or_create_app_id(&conn)
    }

    // === Raw access ===

    /// Get a raw config value.
    pub fn get_config(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.pool.get()?;
        ConfigRepo::get(&conn, key)
    }

    /// Set a raw config value.
    pub fn set_config(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.pool.get()?;
        ConfigRepo::set(&conn, key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn proxy_config_round_trip() {
        let db = Database::in_memory().unwrap();

        let mut cfg = ProxyConfig::new("10.0.0.1", 3128);
        cfg.username = "user".into();
        cfg.enabled = true;
        db.save_proxy_config(&cfg).unwrap();

        assert_eq!(db.load_proxy_config().unwrap(), cfg);
    }

    #[test]
    fn enabled_flag_is_independent() {
        let db = Database::in_memory().unwrap();

        let mut cfg = ProxyConfig::new("h", 1);
        cfg.enabled = true;
        db.save_proxy_config(&cfg).unwrap();

        db.set_proxy_enabled(false).unwrap();
        let loaded = db.load_proxy_config().unwrap();
        assert!(!loaded.enabled);
        assert_eq!(loaded.host, "h");
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        enabled: bool,
        requests: u64,
    }

    #[test]
    fn diagnostics_round_trip() {
        let db = Database::in_memory().unwrap();

        assert!(db.load_diagnostics::<Snapshot>().unwrap().is_none());

        let snap = Snapshot {
            enabled: true,
            requests: 7,
        };
        db.save_diagnostics(&snap).unwrap();

        assert_eq!(db.load_diagnostics::<Snapshot>().unwrap(), Some(snap));
    }

    #[test]
    fn file_backed_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vigil.db");

        {
            let db = Database::with_path(&path).unwrap();
            db.set_config("appId", &json!("abc")).unwrap();
        }

        let db = Database::with_path(&path).unwrap();
        assert_eq!(db.get_config("appId").unwrap(), Some(json!("abc")));
    }

    #[test]
    fn app_id_is_created_once() {
        let db = Database::in_memory().unwrap();
        let a = db.get_or_create_app_id().unwrap();
        let b = db.get_or_create_app_id().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 36);
    }
}
