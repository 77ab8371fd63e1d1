//! Per-adapter facade.
//!
//! An [`Interface`] pairs an adapter name with the driver that enumerated
//! it. Callers never pass adapter names to the driver themselves; every
//! operation goes through the handle, which logs the decoded results.

use anyhow::Result;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::driver::{AdapterState, IfaceStatus, WifiDriver};
use crate::error::WifiCtlError;
use crate::profile::Profile;

/// Shortest pause between two status polls.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Longest pause between two status polls.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Handle on one wifi adapter. Forwards every operation to the platform
/// driver and logs what comes back.
pub struct Interface<'a> {
    name: String,
    state: AdapterState,
    driver: &'a dyn WifiDriver,
}

impl<'a> Interface<'a> {
    /// Wraps the adapter `name` as enumerated by `driver`.
    pub fn new(name: impl Into<String>, state: AdapterState, driver: &'a dyn WifiDriver) -> Self {
        Self {
            name: name.into(),
            state,
            driver,
        }
    }

    /// Adapter name, e.g. `wlan0`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &AdapterState {
        &self.state
    }

    /// Whether a control session was established during enumeration.
    pub fn is_available(&self) -> bool {
        self.state == AdapterState::Ready
    }

    /// Triggers a scan; results have to be fetched later.
    pub fn scan(&self) -> Result<()> {
        info!(iface = %self.name, "scan");
        self.driver.scan(&self.name)
    }

    /// Fetches the BSSs found by the last scan, logging each one.
    pub fn scan_results(&self) -> Result<Vec<Profile>> {
        let bsses = self.driver.scan_results(&self.name)?;

        for bss in &bsses {
            info!(
                iface = %self.name,
                bssid = bss.bssid.as_deref().unwrap_or_default(),
                ssid = bss.ssid.as_deref().unwrap_or_default(),
                freq = bss.freq.unwrap_or_default(),
                auth = %bss.auth,
                akm = ?bss.akm,
                signal = bss.signal.unwrap_or_default(),
                "found bss"
            );
        }

        Ok(bsses)
    }

    /// Saves `profile` in the supplicant and returns it with its new id.
    pub fn add_network_profile(&self, profile: Profile) -> Result<Profile> {
        self.driver.add_network_profile(&self.name, profile)
    }

    pub fn remove_network_profile(&self, profile: &Profile) -> Result<()> {
        self.driver.remove_network_profile(&self.name, profile)
    }

    pub fn remove_all_network_profiles(&self) -> Result<()> {
        self.driver.remove_all_network_profiles(&self.name)
    }

    /// Reads back every saved network, logging each one.
    pub fn network_profiles(&self) -> Result<Vec<Profile>> {
        let profiles = self.driver.network_profiles(&self.name)?;

        for profile in &profiles {
            info!(
                iface = %self.name,
                ssid = profile.ssid.as_deref().unwrap_or_default(),
                auth = %profile.auth,
                akm = ?profile.akm,
                cipher = %profile.cipher,
                "get profile"
            );
        }

        Ok(profiles)
    }

    /// Selects the saved network whose SSID equals `profile`'s.
    pub fn connect(&self, profile: &Profile) -> Result<()> {
        info!(
            iface = %self.name,
            ssid = profile.ssid.as_deref().unwrap_or_default(),
            "connect"
        );
        self.driver.connect(&self.name, profile)
    }

    pub fn disconnect(&self) -> Result<()> {
        info!(iface = %self.name, "disconnect");
        self.driver.disconnect(&self.name)
    }

    pub fn status(&self) -> Result<IfaceStatus> {
        self.driver.status(&self.name)
    }

    /// Polls `status()` until it reports one of `targets` or `timeout`
    /// elapses. The pause between polls starts at `poll` and doubles up to
    /// [`MAX_POLL_INTERVAL`].
    ///
    /// # Arguments
    /// * `targets` - Statuses that end the wait
    /// * `timeout` - Total time allowed
    /// * `poll` - First pause between polls
    ///
    /// # Returns
    /// - `Ok(IfaceStatus)` with the first status found in `targets`
    /// - `Err(WifiCtlError::Timeout)` if none was reported in time
    pub fn wait_for_status(
        &self,
        targets: &[IfaceStatus],
        timeout: Duration,
        poll: Duration,
    ) -> Result<IfaceStatus> {
        let deadline = Instant::now() + timeout;
        let mut interval = poll.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL);

        loop {
            let status = self.status()?;
            if targets.contains(&status) {
                return Ok(status);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(WifiCtlError::Timeout(format!(
                    "'{}' still {} after {:?}",
                    self.name, status, timeout
                ))
                .into());
            }

            debug!(iface = %self.name, %status, "waiting for status");
            thread::sleep(interval.min(deadline - now));
            interval = (interval * 2).min(MAX_POLL_INTERVAL);
        }
    }
}
