//! Key-value configuration repository.

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::error::Result;
use crate::models::ConfigEntry;

/// Repository for the key-value config table.
pub struct ConfigRepo;

impl ConfigRepo {
    /// Get a raw JSON value.
    pub fn get(conn: &Connection, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> = conn
            .query_row("SELECT value FROM config WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;

        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s).unwrap_or(Value::Null))),
            None => Ok(None),
        }
    }

    /// Set a value (insert or update).
    pub fn set(conn: &Connection, key: &str, value: &Value) -> Result<()> {
        let value_json = serde_json::to_string(value)?;

        conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value_json],
        )?;

        Ok(())
    }

    /// Delete a value. Returns true if a row was removed.
    pub fn delete(conn: &Connection, key: &str) -> Result<bool> {
        let deleted = conn.execute("DELETE FROM config WHERE key = ?1", [key])?;
        Ok(deleted > 0)
    }

    /// Get a typed value, falling back to `default` when the key is absent
    /// or the stored value does not deserialize.
    pub fn get_or_default<T: serde::de::DeserializeOwned>(
        conn: &Connection,
        key: &str,
        default: T,
    ) -> Result<T> {
        match Self::get(conn, key)? {
            Some(value) => Ok(serde_json::from_value(value).unwrap_or(default)),
            None => Ok(default),
        }
    }

    /// Get a string value; non-string values fall back to empty.
    pub fn get_string(conn: &Connection, key: &str) -> Result<String> {
        Self::get_or_default(conn, key, String::new())
    }

    /// Get all entries ordered by key.
    pub fn get_all(conn: &Connection) -> Result<Vec<ConfigEntry>> {
        let mut stmt = conn.prepare("SELECT key, value FROM config ORDER BY key")?;

        let entries = stmt
            .query_map([], |row| {
                let value_str: String = row.get(1)?;
                Ok(ConfigEntry {
                    key: row.get(0)?,
                    value: serde_json::from_str(&value_str).unwrap_or(Value::Null),
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(entries)
    }
}
