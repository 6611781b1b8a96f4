//! Vigil Core - target matching, PAC generation, and proxy configuration.
//!
//! This crate holds the pure logic shared by the rest of the workspace:
//!
//! - The fixed set of chat-service domains the proxy applies to
//! - PAC script generation (the exact text handed to the proxy resolver)
//! - The proxy configuration model with validation and secret masking

pub mod config;
pub mod pac;
pub mod targets;

pub use config::{mask_secret, ConfigError, ProxyConfig};
pub use pac::build_pac_script;
pub use targets::{host_matches, is_target_host, PROXY_TARGETS};
