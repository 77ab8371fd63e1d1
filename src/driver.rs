//! Platform driver interface.
//!
//! Every platform backend implements [`WifiDriver`]. The facade in
//! [`crate::interface`] only talks to this trait, so it stays platform
//! independent.

use std::fmt;

use anyhow::Result;
use serde::Serialize;

use crate::profile::Profile;

/// Connection state of an adapter, derived from the supplicant on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum IfaceStatus {
    #[default]
    Disconnected,
    Scanning,
    Inactive,
    Connecting,
    Connected,
}

impl fmt::Display for IfaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "DISCONNECTED"),
            Self::Scanning => write!(f, "SCANNING"),
            Self::Inactive => write!(f, "INACTIVE"),
            Self::Connecting => write!(f, "CONNECTING"),
            Self::Connected => write!(f, "CONNECTED"),
        }
    }
}

/// Whether a control session could be established for an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterState {
    Ready,
    Unavailable(String),
}

/// An adapter as reported by a driver's enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adapter {
    pub name: String,
    pub state: AdapterState,
}

pub trait WifiDriver {
    /// Enumerates adapters and (re-)establishes a control session for each.
    fn interfaces(&mut self) -> Result<Vec<Adapter>>;

    /// Triggers a scan. Does not wait for it to finish.
    fn scan(&self, iface: &str) -> Result<()>;

    fn scan_results(&self, iface: &str) -> Result<Vec<Profile>>;

    /// Selects the saved network whose SSID equals `profile.ssid`.
    fn connect(&self, iface: &str, profile: &Profile) -> Result<()>;

    fn disconnect(&self, iface: &str) -> Result<()>;

    /// Saves `profile` and returns it carrying the allocated id.
    fn add_network_profile(&self, iface: &str, profile: Profile) -> Result<Profile>;

    /// Removes the saved network that partially matches `profile`. When
    /// several match, the last one in the daemon's list goes.
    fn remove_network_profile(&self, iface: &str, profile: &Profile) -> Result<()>;

    fn remove_all_network_profiles(&self, iface: &str) -> Result<()>;

    fn network_profiles(&self, iface: &str) -> Result<Vec<Profile>>;

    fn status(&self, iface: &str) -> Result<IfaceStatus>;
}
