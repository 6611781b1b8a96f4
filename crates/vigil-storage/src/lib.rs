//! Vigil Storage - SQLite persistence layer.
//!
//! This crate persists everything the companion keeps between runs:
//!
//! - Proxy configuration (host, port, credentials, enabled flag)
//! - The serialized diagnostics snapshot
//! - The per-device identifier used by the presence service
//!
//! All of it lives in a single key-value `config` table with JSON values
//! under stable camelCase keys (`proxyHost`, `proxyPort`, `proxyUsername`,
//! `proxyPassword`, `proxyEnabled`, `proxyDiagnostics`, `appId`).
//!
//! # Example
//!
//! ```no_run
//! use vigil_core::ProxyConfig;
//! use vigil_storage::Database;
//!
//! let db = Database::in_memory().unwrap();
//!
//! let mut cfg = ProxyConfig::new("10.0.0.1", 3128);
//! cfg.enabled = true;
//! db.save_proxy_config(&cfg).unwrap();
//!
//! let app_id = db.get_or_create_app_id().unwrap();
//! assert!(!app_id.is_empty());
//! ```

mod database;
pub mod error;
pub mod models;
mod pool;
pub mod repository;
mod schema;

pub use database::Database;
pub use error::{Result, StorageError};
pub use models::keys;
pub use pool::ConnectionPool;
pub use repository::{ConfigRepo, DeviceRepo, SettingsRepo};
