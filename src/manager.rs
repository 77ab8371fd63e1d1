//! Adapter enumeration.
//!
//! [`WifiManager`] owns the platform driver (and through it the session of
//! every adapter) and hands out [`Interface`] handles borrowing it.

use anyhow::Result;
use tracing::{error, info};

use crate::config::Config;
use crate::driver::WifiDriver;
use crate::error::WifiCtlError;
use crate::interface::Interface;

/// Builds the driver for the platform this binary was compiled for.
#[cfg(target_os = "linux")]
pub fn default_driver(config: &Config) -> Result<Box<dyn WifiDriver>> {
    Ok(Box::new(crate::wpa::WpaDriver::from_config(config)))
}

#[cfg(not(target_os = "linux"))]
pub fn default_driver(_config: &Config) -> Result<Box<dyn WifiDriver>> {
    Err(WifiCtlError::UnsupportedPlatform(std::env::consts::OS.to_string()).into())
}

pub struct WifiManager {
    driver: Box<dyn WifiDriver>,
}

impl WifiManager {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_driver(default_driver(config)?))
    }

    pub fn with_driver(driver: Box<dyn WifiDriver>) -> Self {
        Self { driver }
    }

    /// Enumerates the adapters. An empty list is logged but is not an error.
    pub fn interfaces(&mut self) -> Result<Vec<Interface<'_>>> {
        let adapters = self.driver.interfaces()?;
        let driver: &dyn WifiDriver = self.driver.as_ref();

        let ifaces: Vec<Interface<'_>> = adapters
            .into_iter()
            .map(|adapter| {
                info!(iface = %adapter.name, state = ?adapter.state, "get interface");
                Interface::new(adapter.name, adapter.state, driver)
            })
            .collect();

        if ifaces.is_empty() {
            error!("can't get wifi interface");
        }

        Ok(ifaces)
    }

    /// Enumerates the adapters and picks the one at `index`.
    pub fn interface(&mut self, index: usize) -> Result<Interface<'_>> {
        let mut ifaces = self.interfaces()?;
        if ifaces.is_empty() {
            return Err(WifiCtlError::NoInterfaceFound.into());
        }

        let count = ifaces.len();
        if index >= count {
            return Err(WifiCtlError::InterfaceIndexOutOfRange { index, count }.into());
        }

        Ok(ifaces.swap_remove(index))
    }
}
