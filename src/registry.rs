//! Per-adapter control sessions.
//!
//! Each adapter owns exactly one session with the supplicant. The registry
//! keeps that session for the lifetime of the driver and records adapters
//! whose handshake failed, so later operations report a definite error
//! instead of silently finding nothing.

use anyhow::Result;
use std::collections::BTreeMap;
use tracing::info;

use crate::error::WifiCtlError;
use crate::transport::ControlSocket;

/// What enumeration left behind for one adapter.
#[derive(Debug)]
pub enum SessionSlot {
    /// Handshake succeeded; the session is live.
    Ready(ControlSocket),
    /// Handshake failed, with the reason.
    Unavailable(String),
}

/// Adapter name to session slot, ordered by name.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    slots: BTreeMap<String, SessionSlot>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the slot for `iface`, replacing (and closing) any previous one.
    pub fn insert(&mut self, iface: &str, slot: SessionSlot) {
        if self.slots.insert(iface.to_string(), slot).is_some() {
            info!(iface, "connection for iface already existed, replaced");
        }
    }

    /// Drops the previous session of `iface`, if any. Must run before a new
    /// session binds the same local socket path.
    pub fn close(&mut self, iface: &str) {
        self.slots.remove(iface);
    }

    /// Drops every slot whose adapter is not in `present`, closing its
    /// session and removing its local socket.
    pub fn retain(&mut self, present: &[String]) {
        self.slots.retain(|iface, _| {
            let keep = present.contains(iface);
            if !keep {
                info!(iface = %iface, "adapter vanished, closing its session");
            }
            keep
        });
    }

    /// Returns the live session for `iface`.
    ///
    /// # Returns
    /// - `Ok(&ControlSocket)` if the adapter's handshake succeeded
    /// - `Err(WifiCtlError::SessionUnavailable)` if it failed
    /// - `Err(WifiCtlError::InterfaceNotFound)` if the adapter was never
    ///   enumerated
    pub fn session(&self, iface: &str) -> Result<&ControlSocket> {
        match self.slots.get(iface) {
            Some(SessionSlot::Ready(sock)) => Ok(sock),
            Some(SessionSlot::Unavailable(reason)) => Err(WifiCtlError::SessionUnavailable {
                iface: iface.to_string(),
                reason: reason.clone(),
            }
            .into()),
            None => Err(WifiCtlError::InterfaceNotFound(iface.to_string()).into()),
        }
    }

    /// Names of all adapters with a slot, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_iface_is_not_found() {
        let registry = SessionRegistry::new();
        let err = registry.session("wlan0").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WifiCtlError>(),
            Some(WifiCtlError::InterfaceNotFound(name)) if name == "wlan0"
        ));
    }

    #[test]
    fn unavailable_iface_reports_reason() {
        let mut registry = SessionRegistry::new();
        registry.insert("wlan0", SessionSlot::Unavailable("no PONG".into()));
        assert_eq!(registry.len(), 1);

        let err = registry.session("wlan0").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WifiCtlError>(),
            Some(WifiCtlError::SessionUnavailable { reason, .. }) if reason == "no PONG"
        ));

        registry.close("wlan0");
        assert!(registry.is_empty());
    }

    #[test]
    fn retain_drops_vanished_adapters() {
        let mut registry = SessionRegistry::new();
        registry.insert("wlan0", SessionSlot::Unavailable("no PONG".into()));
        registry.insert("wlan1", SessionSlot::Unavailable("no PONG".into()));
        registry.insert("wlan2", SessionSlot::Unavailable("no PONG".into()));

        registry.retain(&["wlan0".to_string(), "wlan2".to_string()]);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["wlan0", "wlan2"]);

        registry.retain(&[]);
        assert!(registry.is_empty());
    }
}
