use thiserror::Error;

use crate::driver::IfaceStatus;

#[derive(Error, Debug)]
pub enum WifiCtlError {
    #[error("No WiFi interface found")]
    NoInterfaceFound,

    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    #[error("Interface index {index} not found (available: 0-{})", .count.saturating_sub(1))]
    InterfaceIndexOutOfRange { index: usize, count: usize },

    #[error("No control session for interface '{iface}': {reason}")]
    SessionUnavailable { iface: String, reason: String },

    #[error("Handshake with '{iface}' failed: {reason}")]
    Handshake { iface: String, reason: String },

    #[error("Unexpected reply from wpa_supplicant: {0}")]
    Protocol(String),

    #[error("Network '{0}' not found")]
    NetworkNotFound(String),

    #[error("Failed to connect to '{ssid}'. Status: {status}")]
    ConnectTimeout { ssid: String, status: IfaceStatus },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Platform '{0}' is not supported")]
    UnsupportedPlatform(String),
}
