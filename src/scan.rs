//! WiFi network scanning module.
//!
//! # Scanning Process
//!
//! 1. Triggers a scan on the interface (`SCAN`)
//! 2. Waits for the supplicant to collect results
//! 3. Retrieves the discovered access points (`SCAN_RESULTS`)
//! 4. Sorts them by signal strength (strongest first)
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use wifictl::{Config, WifiManager};
//! use wifictl::scan::{display_networks, scan_networks};
//!
//! let mut manager = WifiManager::new(&Config::default()).expect("No driver");
//! let iface = manager.interface(0).expect("No WiFi interface");
//! let networks = scan_networks(&iface, Duration::from_secs(5)).expect("Scan failed");
//! display_networks(&networks);
//! ```

use anyhow::Result;
use std::time::Duration;

use crate::interface::Interface;
use crate::profile::Profile;

/// Scans for access points visible to `iface`.
///
/// The supplicant does not report scan completion on the control socket, so
/// this simply sleeps for `wait` before reading the results.
pub fn scan_networks(iface: &Interface<'_>, wait: Duration) -> Result<Vec<Profile>> {
    iface.scan()?;

    std::thread::sleep(wait);

    let mut networks = iface.scan_results()?;
    sort_by_signal(&mut networks);
    Ok(networks)
}

/// Strongest signal first; entries without a level go last.
pub fn sort_by_signal(networks: &mut [Profile]) {
    networks.sort_by(|a, b| b.signal.unwrap_or(i32::MIN).cmp(&a.signal.unwrap_or(i32::MIN)));
}

/// Prints scan results as a table.
///
/// # Output Format
/// ```text
/// SSID                             BSSID              SIGNAL       SECURITY
/// ------------------------------------------------------------------------------------
/// TOTOLINK N302RE                  14:4d:67:14:1e:44   -67 ██░░     WPA2-PSK
/// (Hidden)                         aa:bb:cc:dd:ee:ff   -84 ░░░░     Open
/// ```
pub fn display_networks(networks: &[Profile]) {
    if networks.is_empty() {
        println!("No networks found.");
        return;
    }

    println!("Found {} network(s):", networks.len());
    println!();
    println!("{:<32} {:<18} {:<12} {}", "SSID", "BSSID", "SIGNAL", "SECURITY");
    println!("{}", "-".repeat(84));

    for network in networks {
        let ssid = network.ssid.as_deref().unwrap_or("(Hidden)");
        let bssid = network.bssid.as_deref().unwrap_or("N/A");
        let signal = match network.signal {
            Some(dbm) => format!("{:>4} {}", dbm, signal_to_bar(dbm)),
            None => "N/A".to_string(),
        };

        println!(
            "{:<32} {:<18} {:<12} {}",
            truncate_ssid(ssid, 32),
            bssid,
            signal,
            network.security_label()
        );
    }
}

/// Shortens an SSID to at most `max_len` characters, ending in "...".
fn truncate_ssid(ssid: &str, max_len: usize) -> String {
    if ssid.chars().count() > max_len {
        let head: String = ssid.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        ssid.to_string()
    }
}

/// Four-step bar for a signal level in dBm.
fn signal_to_bar(dbm: i32) -> &'static str {
    match dbm {
        d if d >= -50 => "████",
        d if d >= -60 => "███░",
        d if d >= -70 => "██░░",
        d if d >= -80 => "█░░░",
        _ => "░░░░",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_signal(ssid: &str, signal: Option<i32>) -> Profile {
        Profile {
            signal,
            ..Profile::new(ssid)
        }
    }

    #[test]
    fn sorts_strongest_first() {
        let mut networks = vec![
            with_signal("weak", Some(-91)),
            with_signal("unknown", None),
            with_signal("strong", Some(-40)),
            with_signal("fair", Some(-67)),
        ];
        sort_by_signal(&mut networks);
        let order: Vec<&str> = networks.iter().map(|n| n.ssid.as_deref().unwrap()).collect();
        assert_eq!(order, vec!["strong", "fair", "weak", "unknown"]);
    }

    #[test]
    fn truncates_long_ssids() {
        assert_eq!(truncate_ssid("Short", 10), "Short");
        assert_eq!(truncate_ssid("VeryLongNetworkName", 10), "VeryLon...");
        assert_eq!(truncate_ssid("ネットワーク名前です", 5), "ネッ...");
    }

    #[test]
    fn signal_bars() {
        assert_eq!(signal_to_bar(-45), "████");
        assert_eq!(signal_to_bar(-67), "██░░");
        assert_eq!(signal_to_bar(-91), "░░░░");
    }
}
