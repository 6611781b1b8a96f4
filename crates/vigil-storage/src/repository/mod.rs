//! Stateless repositories over a borrowed connection.

mod config;
mod device;
mod settings;

pub use config::ConfigRepo;
pub use device::DeviceRepo;
pub use settings::SettingsRepo;
