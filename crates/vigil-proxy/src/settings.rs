//! Platform proxy-settings seam.
//!
//! The controller talks to the platform through [`ProxySettings`]; the
//! system implementation writes the PAC script to the data directory and
//! points the OS auto-proxy configuration at it. Failures are returned to
//! the caller rather than swallowed, so a failed write never looks like a
//! successful apply.

use std::path::PathBuf;
use std::process::Command;

use directories::ProjectDirs;
use tracing::info;

use crate::error::{ProxyError, Result};

/// Applies or clears the active proxy policy.
pub trait ProxySettings: Send + Sync {
    /// Install `pac` as the active auto-proxy policy.
    fn apply_pac(&self, pac: &str) -> Result<()>;

    /// Install a direct (no-proxy) policy.
    fn apply_direct(&self) -> Result<()>;
}

/// System proxy settings backed by the OS configuration tools.
pub struct SystemProxySettings {
    pac_path: PathBuf,
}

impl SystemProxySettings {
    /// Creates settings writing the PAC file into the app data directory.
    pub fn new() -> Result<Self> {
        let dirs = ProjectDirs::from("com", "vigil", "vigil")
            .ok_or_else(|| ProxyError::Settings("Could not determine app data directory".into()))?;
        let dir = dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            pac_path: dir.join("vigil.pac"),
        })
    }

    /// Creates settings with an explicit PAC file path.
    pub fn with_pac_path(pac_path: impl Into<PathBuf>) -> Self {
        Self {
            pac_path: pac_path.into(),
        }
    }

    /// Path of the written PAC file.
    pub fn pac_path(&self) -> &PathBuf {
        &self.pac_path
    }

    fn pac_url(&self) -> String {
        format!("file://{}", self.pac_path.display())
    }
}

impl ProxySettings for SystemProxySettings {
    fn apply_pac(&self, pac: &str) -> Result<()> {
        std::fs::write(&self.pac_path, pac)?;
        set_auto_proxy_url(&self.pac_url())?;
        info!(pac = %self.pac_path.display(), "Auto-proxy configuration applied");
        Ok(())
    }

    fn apply_direct(&self) -> Result<()> {
        clear_auto_proxy()?;
        info!("Auto-proxy configuration cleared");
        Ok(())
    }
}

fn run_checked(cmd: &mut Command) -> Result<()> {
    let output = cmd
        .output()
        .map_err(|e| ProxyError::Settings(format!("Failed to run {:?}: {}", cmd.get_program(), e)))?;
    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(ProxyError::Settings(format!(
            "{:?} failed: {}",
            cmd.get_program(),
            stderr.trim()
        )))
    }
}

// ============================================================================
// Linux (GNOME)
// ============================================================================

#[cfg(target_os = "linux")]
fn set_auto_proxy_url(url: &str) -> Result<()> {
    run_checked(Command::new("gsettings").args(["set", "org.gnome.system.proxy", "autoconfig-url", url]))?;
    run_checked(Command::new("gsettings").args(["set", "org.gnome.system.proxy", "mode", "auto"]))
}

#[cfg(target_os = "linux")]
fn clear_auto_proxy() -> Result<()> {
    run_checked(Command::new("gsettings").args(["set", "org.gnome.system.proxy", "mode", "none"]))
}

// ============================================================================
// macOS
// ============================================================================

#[cfg(target_os = "macos")]
fn get_active_network_service() -> Result<String> {
    let output = Command::new("networksetup")
        .args(["-listallnetworkservices"])
        .output()
        .map_err(|e| ProxyError::Settings(format!("Failed to run networksetup: {}", e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout);

    for service in ["Wi-Fi", "Ethernet", "USB 10/100/1000 LAN"] {
        if stdout.contains(service) {
            return Ok(service.to_string());
        }
    }

    stdout
        .lines()
        .skip(1) // header line
        .find(|line| !line.starts_with('*'))
        .map(|s| s.to_string())
        .ok_or_else(|| ProxyError::Settings("Could not find active network service".into()))
}

#[cfg(target_os = "macos")]
fn set_auto_proxy_url(url: &str) -> Result<()> {
    let service = get_active_network_service()?;
    run_checked(Command::new("networksetup").args(["-setautoproxyurl", &service, url]))?;
    run_checked(Command::new("networksetup").args(["-setautoproxystate", &service, "on"]))
}

#[cfg(target_os = "macos")]
fn clear_auto_proxy() -> Result<()> {
    let service = get_active_network_service()?;
    run_checked(Command::new("networksetup").args(["-setautoproxystate", &service, "off"]))
}

// ============================================================================
// Windows
// ============================================================================

#[cfg(target_os = "windows")]
fn set_auto_proxy_url(url: &str) -> Result<()> {
    let ps_script = format!(
        r#"
        $regPath = 'HKCU:\Software\Microsoft\Windows\CurrentVersion\Internet Settings'
        Set-ItemProperty -Path $regPath -Name AutoConfigURL -Value '{}'
        Set-ItemProperty -Path $regPath -Name ProxyEnable -Value 0
        "#,
        url.replace('\'', "''")
    );
    run_checked(Command::new("powershell").args([
        "-NoProfile",
        "-ExecutionPolicy",
        "Bypass",
        "-Command",
        &ps_script,
    ]))
}

#[cfg(target_os = "windows")]
fn clear_auto_proxy() -> Result<()> {
    let ps_script = r#"
        $regPath = 'HKCU:\Software\Microsoft\Windows\CurrentVersion\Internet Settings'
        Remove-ItemProperty -Path $regPath -Name AutoConfigURL -ErrorAction SilentlyContinue
        Set-ItemProperty -Path $regPath -Name ProxyEnable -Value 0
    "#;
    run_checked(Command::new("powershell").args([
        "-NoProfile",
        "-ExecutionPolicy",
        "Bypass",
        "-Command",
        ps_script,
    ]))
}

// ============================================================================
// Other platforms
// ============================================================================

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn set_auto_proxy_url(_url: &str) -> Result<()> {
    Err(ProxyError::Settings("Unsupported operating system".into()))
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn clear_auto_proxy() -> Result<()> {
    Err(ProxyError::Settings("Unsupported operating system".into()))
}
