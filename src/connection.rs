//! WiFi connection management module.
//!
//! Higher-level workflows built on an [`Interface`]: connecting to a network
//! by SSID and password, disconnecting, and reporting status. The
//! supplicant acts on these requests asynchronously, so each workflow polls
//! the interface status with a deadline instead of trusting the immediate
//! acknowledgement.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use wifictl::{Config, WifiManager};
//! use wifictl::connection::{connect_to, display_status};
//!
//! let mut manager = WifiManager::new(&Config::default()).expect("No driver");
//! let iface = manager.interface(0).expect("No WiFi interface");
//!
//! connect_to(&iface, "MyNetwork", Some("password123"), Duration::from_secs(10))
//!     .expect("Connect failed");
//! display_status(iface.name(), iface.status().expect("Status failed"));
//! ```

use anyhow::Result;
use std::time::Duration;
use tracing::warn;

use crate::driver::IfaceStatus;
use crate::error::WifiCtlError;
use crate::interface::Interface;
use crate::profile::{AkmType, AuthAlgorithm, CipherType, Profile};

/// First pause between two status polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Profile used to join `ssid`: WPA2-PSK with CCMP when a password is given,
/// an open network otherwise.
pub fn build_profile(ssid: &str, password: Option<&str>) -> Profile {
    let profile = Profile::new(ssid).with_auth(AuthAlgorithm::Open);

    match password {
        Some(password) => profile
            .with_akm(AkmType::Wpa2Psk)
            .with_cipher(CipherType::Ccmp)
            .with_key(password),
        None => profile.with_akm(AkmType::None),
    }
}

/// Replaces the saved networks of `iface` with one for `ssid` and waits for
/// the connection to complete.
///
/// # Returns
/// - `Ok(())` once the interface reports `CONNECTED`
/// - `Err(WifiCtlError::ConnectTimeout)` if it does not within `timeout`
pub fn connect_to(
    iface: &Interface<'_>,
    ssid: &str,
    password: Option<&str>,
    timeout: Duration,
) -> Result<()> {
    iface.disconnect()?;
    iface.remove_all_network_profiles()?;

    let profile = iface.add_network_profile(build_profile(ssid, password))?;
    iface.connect(&profile)?;

    match iface.wait_for_status(&[IfaceStatus::Connected], timeout, POLL_INTERVAL) {
        Ok(_) => Ok(()),
        Err(e) if is_timeout(&e) => {
            let status = iface.status()?;
            Err(WifiCtlError::ConnectTimeout {
                ssid: ssid.to_string(),
                status,
            }
            .into())
        }
        Err(e) => Err(e),
    }
}

/// Disconnects `iface` and waits up to `settle` for it to go idle.
///
/// Returns the last observed status. Not settling in time is only a warning,
/// the supplicant may be busy scanning.
pub fn disconnect_from(iface: &Interface<'_>, settle: Duration) -> Result<IfaceStatus> {
    iface.disconnect()?;

    let idle = [IfaceStatus::Disconnected, IfaceStatus::Inactive];
    match iface.wait_for_status(&idle, settle, POLL_INTERVAL) {
        Ok(status) => Ok(status),
        Err(e) if is_timeout(&e) => {
            let status = iface.status()?;
            warn!(iface = iface.name(), %status, "disconnect may have failed");
            Ok(status)
        }
        Err(e) => Err(e),
    }
}

/// Prints the status of an interface.
///
/// # Output Format
/// ```text
/// Interface: wlan0
/// Status:    CONNECTED
/// ```
pub fn display_status(name: &str, status: IfaceStatus) {
    println!("Interface: {}", name);
    println!("Status:    {}", status);
}

fn is_timeout(e: &anyhow::Error) -> bool {
    matches!(e.downcast_ref::<WifiCtlError>(), Some(WifiCtlError::Timeout(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn password_selects_wpa2_psk() {
        let profile = build_profile("home", Some("hunter22"));
        assert_eq!(profile.ssid.as_deref(), Some("home"));
        assert_eq!(profile.akm, vec![AkmType::Wpa2Psk]);
        assert_eq!(profile.cipher, CipherType::Ccmp);
        assert_eq!(profile.key.as_ref().map(|k| k.expose_secret()), Some("hunter22"));
    }

    #[test]
    fn no_password_selects_open_network() {
        let profile = build_profile("cafe", None);
        assert_eq!(profile.akm, vec![AkmType::None]);
        assert_eq!(profile.cipher, CipherType::None);
        assert!(profile.key.is_none());
    }
}
