//! Per-device identifier.

use rand::Rng;
use rusqlite::Connection;
use serde_json::json;
use tracing::info;

use crate::error::Result;
use crate::models::keys;
use crate::repository::ConfigRepo;

/// Repository for the persistent device identifier.
///
/// The identifier is generated once and reused forever after; the presence
/// service uses it to tell devices apart. It is a usage-correlation token,
/// not a credential, so a non-cryptographic source is acceptable.
pub struct DeviceRepo;

impl DeviceRepo {
    /// Get the stored app id, generating and persisting one if absent.
    pub fn get_or_create_app_id(conn: &Connection) -> Result<String> {
        let stored = ConfigRepo::get_string(conn, keys::APP_ID)?;
        if !stored.is_empty() {
            return Ok(stored);
        }

        let app_id = generate_app_id();
        ConfigRepo::set(conn, keys::APP_ID, &json!(app_id))?;
        info!(app_id = %app_id, "Generated new device identifier");
        Ok(app_id)
    }
}

/// Generates a UUID-format identifier (version-4 layout).
fn generate_app_id() -> String {
    let mut rng = rand::thread_rng();
    let mut out = String::with_capacity(36);
    for c in "xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx".chars() {
        match c {
            'x' => {
                let v: u32 = rng.gen_range(0..16);
                out.push(char::from_digit(v, 16).unwrap_or('0'));
            }
            'y' => {
                // variant nibble: 8, 9, a, or b
                let v: u32 = rng.gen_range(8..12);
                out.push(char::from_digit(v, 16).unwrap_or('8'));
            }
            other => out.push(other),
        }
    }
    out
}
