//! Configuration management.
//!
//! Settings are read from `~/.config/wifictl/config.toml` (or the path given
//! with `--config`). Every field has a default, so a missing file or a file
//! naming only a few keys is fine.
//!
//! # Example
//! ```toml
//! ctrl_iface_dir = "/run/wpa_supplicant"
//! reply_timeout_ms = 2000
//! log_level = "wifictl=debug"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(unix)]
use crate::transport::SessionOptions;

/// Directory where wpa_supplicant publishes its control sockets.
pub const CTRL_IFACE_DIR: &str = "/var/run/wpa_supplicant";

/// Effective settings, file values over defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding wpa_supplicant's per-interface control sockets.
    pub ctrl_iface_dir: PathBuf,

    /// Directory for the private client sockets. Defaults to the temp dir.
    pub socket_dir: Option<PathBuf>,

    /// Extra receives allowed while waiting for `PONG`.
    pub handshake_retries: u32,
    /// Receive timeout for each handshake attempt.
    pub handshake_timeout_ms: u64,

    /// Per-request reply timeout. Unset blocks until the supplicant answers.
    pub reply_timeout_ms: Option<u64>,

    /// Interface index used when none is given on the command line.
    pub default_interface: usize,

    /// Pause between triggering a scan and reading its results.
    pub scan_wait_secs: u64,
    /// How long `connect` waits for the association to complete.
    pub connect_timeout_secs: u64,

    /// Log filter used when neither `--log-level` nor `RUST_LOG` is set.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ctrl_iface_dir: PathBuf::from(CTRL_IFACE_DIR),
            socket_dir: None,
            handshake_retries: 3,
            handshake_timeout_ms: 1000,
            reply_timeout_ms: None,
            default_interface: 0,
            scan_wait_secs: 5,
            connect_timeout_secs: 10,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Loads the config from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads the config from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Renders the effective settings, as printed by `show-config`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Directory for private client sockets; the temp dir when unset.
    pub fn socket_dir(&self) -> PathBuf {
        self.socket_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Transport tunables derived from the timeout settings.
    #[cfg(unix)]
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            handshake_retries: self.handshake_retries,
            handshake_timeout: Some(Duration::from_millis(self.handshake_timeout_ms)),
            reply_timeout: self.reply_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn scan_wait(&self) -> Duration {
        Duration::from_secs(self.scan_wait_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Default config file location: `<config_dir>/wifictl/config.toml`.
///
/// # Errors
/// Fails if the platform has no user config directory.
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?;
    Ok(config_dir.join("wifictl").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.ctrl_iface_dir, PathBuf::from("/var/run/wpa_supplicant"));
        assert_eq!(cfg.socket_dir(), std::env::temp_dir());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "ctrl_iface_dir = \"/run/wpa_supplicant\"\nreply_timeout_ms = 500\nlog_level = \"debug\"\n",
        )
        .unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.ctrl_iface_dir, PathBuf::from("/run/wpa_supplicant"));
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.handshake_retries, 3);

        let options = cfg.session_options();
        assert_eq!(options.reply_timeout, Some(Duration::from_millis(500)));
        assert_eq!(options.handshake_timeout, Some(Duration::from_secs(1)));
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "handshake_retries = \"many\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn serializes_back_to_toml() {
        let text = Config::default().to_toml().unwrap();
        assert!(text.contains("ctrl_iface_dir"));
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
