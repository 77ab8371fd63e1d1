//! WiFi control library built on the wpa_supplicant control interface.
//!
//! This library discovers wifi adapters, triggers scans, lists visible
//! access points and manages the networks saved in the supplicant by
//! speaking its text protocol over a per-interface Unix datagram socket.
//!
//! # Modules
//!
//! - [`config`] - Configuration file handling
//! - [`connection`] - Connect/disconnect workflows with bounded waiting
//! - [`driver`] - The platform driver trait and interface status
//! - [`error`] - Custom error types for the library
//! - [`interface`] - Per-adapter handle forwarding to the driver
//! - [`manager`] - Adapter enumeration and driver selection
//! - [`profile`] - Access point and saved network model
//! - [`registry`] - Control sessions keyed by adapter name
//! - [`scan`] - Scanning and scan result display
//! - [`transport`] - The control socket session
//! - [`wpa`] - The wpa_supplicant protocol driver
//!
//! # Example Usage
//!
//! ```no_run
//! use wifictl::{Config, IfaceStatus, WifiManager};
//!
//! let mut manager = WifiManager::new(&Config::default()).expect("No driver");
//! for iface in manager.interfaces().expect("Enumeration failed") {
//!     let status = iface.status().unwrap_or(IfaceStatus::Disconnected);
//!     println!("{} - {}", iface.name(), status);
//! }
//! ```

/// Configuration module: TOML file with socket paths, timeouts and defaults.
pub mod config;

/// Connection module: connect, disconnect and status display.
pub mod connection;

/// Driver module: the capability set every platform backend provides.
pub mod driver;

/// Error module defining custom error types for the library.
/// Uses `thiserror` for ergonomic error handling.
pub mod error;

/// Interface module: the per-adapter facade.
pub mod interface;

/// Manager module: enumerates adapters and picks the platform driver.
pub mod manager;

/// Profile module: the record shared by scan results and saved networks.
pub mod profile;

#[cfg(unix)]
pub mod registry;

/// Scan module for discovering available WiFi networks.
pub mod scan;

#[cfg(unix)]
pub mod transport;

#[cfg(unix)]
pub mod wpa;

pub use config::Config;
pub use driver::{Adapter, AdapterState, IfaceStatus, WifiDriver};
pub use error::WifiCtlError;
pub use interface::Interface;
pub use manager::WifiManager;
pub use profile::{AkmType, AuthAlgorithm, CipherType, KeyType, Profile};
