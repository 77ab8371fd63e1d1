//! wpa_supplicant control interface driver.
//!
//! Translates wifi operations into the supplicant's text command vocabulary
//! and decodes its replies.
//!
//! # Commands Used
//! ```text
//! PING, SCAN, SCAN_RESULTS, LIST_NETWORKS, SELECT_NETWORK <id>, DISCONNECT,
//! ADD_NETWORK, SET_NETWORK <id> <field> <value>, GET_NETWORK <id> <field>,
//! REMOVE_NETWORK <id>|all, STATUS
//! ```
//!
//! # Reply Formats
//! `SCAN_RESULTS` and `LIST_NETWORKS` reply with a header line followed by
//! one tab-separated record per entry. `STATUS` replies with `key=value`
//! lines. `GET_NETWORK` replies with the bare value (SSIDs quoted) or a
//! `FAIL` token.

use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::FileTypeExt;
use std::path::PathBuf;
use tracing::{error, warn};

use crate::config::Config;
use crate::driver::{Adapter, AdapterState, IfaceStatus, WifiDriver};
use crate::error::WifiCtlError;
use crate::profile::{AkmType, AuthAlgorithm, CipherType, Profile};
use crate::registry::{SessionRegistry, SessionSlot};
use crate::transport::{ControlSocket, SessionOptions};

/// One record of a `LIST_NETWORKS` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEntry {
    pub id: u32,
    pub ssid: String,
    pub bssid: String,
    pub flags: String,
}

/// [`WifiDriver`] backed by wpa_supplicant's control sockets.
///
/// Every adapter found in `ctrl_dir` gets one session, bound under
/// `socket_dir`. Sessions live until the next enumeration or until the
/// driver is dropped.
pub struct WpaDriver {
    ctrl_dir: PathBuf,
    socket_dir: PathBuf,
    options: SessionOptions,
    registry: SessionRegistry,
}

impl WpaDriver {
    /// Creates a driver. No socket is touched until
    /// [`interfaces`](WifiDriver::interfaces) runs.
    ///
    /// # Arguments
    /// * `ctrl_dir` - Directory with the supplicant's control sockets
    /// * `socket_dir` - Directory for this client's private sockets
    /// * `options` - Handshake and reply tunables for every session
    pub fn new(ctrl_dir: impl Into<PathBuf>, socket_dir: impl Into<PathBuf>, options: SessionOptions) -> Self {
        Self {
            ctrl_dir: ctrl_dir.into(),
            socket_dir: socket_dir.into(),
            options,
            registry: SessionRegistry::new(),
        }
    }

    /// Creates a driver from the `ctrl_iface_dir`, `socket_dir` and timeout
    /// settings of `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.ctrl_iface_dir.clone(),
            config.socket_dir(),
            config.session_options(),
        )
    }

    /// Sessions opened by the last enumeration.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    fn session(&self, iface: &str) -> Result<&ControlSocket> {
        self.registry.session(iface)
    }

    fn saved_networks(&self, sock: &ControlSocket) -> Result<Vec<NetworkEntry>> {
        Ok(parse_network_list(&sock.request("LIST_NETWORKS")?))
    }

    /// Rebuilds one saved network. `None` when the supplicant rejects one of
    /// the required queries.
    fn read_profile(&self, sock: &ControlSocket, id: u32) -> Result<Option<Profile>> {
        let ssid = sock.request(&format!("GET_NETWORK {} ssid", id))?;
        if is_fail(&ssid) {
            return Ok(None);
        }

        let key_mgmt = sock.request(&format!("GET_NETWORK {} key_mgmt", id))?;
        if is_fail(&key_mgmt) {
            return Ok(None);
        }
        let key_mgmt = key_mgmt.trim().to_uppercase();

        let proto = if needs_proto(&key_mgmt) {
            let proto = sock.request(&format!("GET_NETWORK {} proto", id))?;
            Some(proto.trim().to_uppercase())
        } else {
            None
        };

        let pairwise = sock.request(&format!("GET_NETWORK {} pairwise", id))?;
        if is_fail(&pairwise) {
            return Ok(None);
        }

        Ok(Some(Profile {
            id: Some(id),
            ssid: Some(unquote(ssid.trim()).to_string()),
            auth: AuthAlgorithm::Open,
            akm: vec![akm_from_key_mgmt(&key_mgmt, proto.as_deref())],
            cipher: parse_cipher(&pairwise),
            ..Default::default()
        }))
    }
}

impl WifiDriver for WpaDriver {
    fn interfaces(&mut self) -> Result<Vec<Adapter>> {
        let entries = match fs::read_dir(&self.ctrl_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                error!(dir = %self.ctrl_dir.display(), "control interface directory does not exist");
                self.registry.retain(&[]);
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to list {}", self.ctrl_dir.display())
                });
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("Failed to list {}", self.ctrl_dir.display()))?;
            let Some(name) = entry.file_name().to_str().map(String::from) else {
                continue;
            };
            // Follows symlinks, like stat(2).
            match fs::metadata(entry.path()) {
                Ok(meta) if meta.file_type().is_socket() => names.push(name),
                Ok(_) => {}
                Err(e) => warn!(entry = %name, error = %e, "cannot stat control socket"),
            }
        }
        names.sort();
        self.registry.retain(&names);

        let mut adapters = Vec::with_capacity(names.len());
        for name in names {
            // The old session must release the local socket path first.
            self.registry.close(&name);

            let state = match ControlSocket::open(&self.ctrl_dir, &self.socket_dir, &name, &self.options) {
                Ok(sock) => {
                    self.registry.insert(&name, SessionSlot::Ready(sock));
                    AdapterState::Ready
                }
                Err(e) => {
                    let reason = format!("{:#}", e);
                    error!(iface = %name, error = %reason, "cannot open control session");
                    self.registry.insert(&name, SessionSlot::Unavailable(reason.clone()));
                    AdapterState::Unavailable(reason)
                }
            };
            adapters.push(Adapter { name, state });
        }

        Ok(adapters)
    }

    fn scan(&self, iface: &str) -> Result<()> {
        self.session(iface)?.send("SCAN")
    }

    fn scan_results(&self, iface: &str) -> Result<Vec<Profile>> {
        let reply = self.session(iface)?.request("SCAN_RESULTS")?;
        Ok(parse_scan_results(&reply))
    }

    fn connect(&self, iface: &str, profile: &Profile) -> Result<()> {
        let sock = self.session(iface)?;
        let ssid = profile
            .ssid
            .as_deref()
            .ok_or_else(|| WifiCtlError::Protocol("cannot connect to a profile without SSID".to_string()))?;

        let entry = self
            .saved_networks(sock)?
            .into_iter()
            .find(|n| n.ssid == ssid)
            .ok_or_else(|| WifiCtlError::NetworkNotFound(ssid.to_string()))?;

        sock.send(&format!("SELECT_NETWORK {}", entry.id))
    }

    fn disconnect(&self, iface: &str) -> Result<()> {
        self.session(iface)?.send("DISCONNECT")
    }

    fn add_network_profile(&self, iface: &str, mut profile: Profile) -> Result<Profile> {
        let sock = self.session(iface)?;
        let ssid = profile
            .ssid
            .clone()
            .ok_or_else(|| WifiCtlError::Protocol("cannot add a profile without SSID".to_string()))?;

        let reply = sock.request("ADD_NETWORK")?;
        let id: u32 = reply.trim().parse().map_err(|_| {
            WifiCtlError::Protocol(format!("ADD_NETWORK replied '{}'", reply.trim()))
        })?;

        profile.process_akm();
        let akm = profile.effective_akm();

        sock.send(&format!("SET_NETWORK {} ssid \"{}\"", id, ssid))?;
        sock.send(&format!("SET_NETWORK {} key_mgmt {}", id, key_mgmt_for(akm)))?;

        if let Some(proto) = proto_for(akm) {
            sock.send(&format!("SET_NETWORK {} proto {}", id, proto))?;
        }

        if let Some(pairwise) = pairwise_for(profile.cipher) {
            sock.send(&format!("SET_NETWORK {} pairwise {}", id, pairwise))?;
        }

        if akm.is_psk() {
            match &profile.key {
                Some(key) => {
                    sock.send(&format!("SET_NETWORK {} psk \"{}\"", id, key.expose_secret()))?;
                }
                None => warn!(iface, id, "PSK profile added without a key"),
            }
        }

        profile.id = Some(id);
        Ok(profile)
    }

    fn remove_network_profile(&self, iface: &str, profile: &Profile) -> Result<()> {
        let target = self
            .network_profiles(iface)?
            .into_iter()
            .filter(|p| p.matches(profile))
            .last()
            .and_then(|p| p.id)
            .ok_or_else(|| {
                WifiCtlError::NetworkNotFound(profile.ssid.clone().unwrap_or_default())
            })?;

        self.session(iface)?.send(&format!("REMOVE_NETWORK {}", target))
    }

    fn remove_all_network_profiles(&self, iface: &str) -> Result<()> {
        self.session(iface)?.send("REMOVE_NETWORK all")
    }

    fn network_profiles(&self, iface: &str) -> Result<Vec<Profile>> {
        let sock = self.session(iface)?;
        let mut profiles = Vec::new();

        for entry in self.saved_networks(sock)? {
            match self.read_profile(sock, entry.id)? {
                Some(profile) => profiles.push(profile),
                None => warn!(iface, id = entry.id, "skipping network rejected by wpa_supplicant"),
            }
        }

        Ok(profiles)
    }

    fn status(&self, iface: &str) -> Result<IfaceStatus> {
        let reply = self.session(iface)?.request("STATUS")?;
        Ok(parse_status(&reply))
    }
}

/// Decodes a `SCAN_RESULTS` reply.
///
/// Columns: `bssid`, `frequency`, `signal level`, `flags`, `ssid`. The AKM
/// kinds are derived from substrings of the flags column; one AP may
/// advertise several.
pub fn parse_scan_results(reply: &str) -> Vec<Profile> {
    let mut bsses = Vec::new();

    for line in records(reply) {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 4 {
            warn!(line, "malformed scan result");
            continue;
        }

        let (Ok(freq), Ok(signal)) = (cols[1].trim().parse::<u32>(), cols[2].trim().parse::<i32>()) else {
            warn!(line, "malformed scan result");
            continue;
        };

        let flags = cols[3];
        let mut akm = Vec::new();
        if flags.contains("WPA-PSK") {
            akm.push(AkmType::WpaPsk);
        }
        if flags.contains("WPA2-PSK") {
            akm.push(AkmType::Wpa2Psk);
        }
        if flags.contains("WPA-EAP") {
            akm.push(AkmType::Wpa);
        }
        if flags.contains("WPA2-EAP") {
            akm.push(AkmType::Wpa2);
        }

        bsses.push(Profile {
            bssid: Some(cols[0].to_string()),
            freq: Some(freq),
            signal: Some(signal),
            ssid: cols.get(4).filter(|s| !s.is_empty()).map(|s| s.to_string()),
            // The scan summary carries no shared-key signal.
            auth: AuthAlgorithm::Open,
            akm,
            ..Default::default()
        });
    }

    bsses
}

/// Decodes a `LIST_NETWORKS` reply (`network id / ssid / bssid / flags`).
pub fn parse_network_list(reply: &str) -> Vec<NetworkEntry> {
    let mut networks = Vec::new();

    for line in records(reply) {
        let cols: Vec<&str> = line.split('\t').collect();
        let Ok(id) = cols[0].trim().parse::<u32>() else {
            warn!(line, "malformed network list entry");
            continue;
        };

        networks.push(NetworkEntry {
            id,
            ssid: cols.get(1).map(|s| s.to_string()).unwrap_or_default(),
            bssid: cols.get(2).map(|s| s.to_string()).unwrap_or_default(),
            flags: cols.get(3).map(|s| s.to_string()).unwrap_or_default(),
        });
    }

    networks
}

/// Maps the `wpa_state=` line of a `STATUS` reply. A missing line or an
/// unknown state reads as disconnected.
pub fn parse_status(reply: &str) -> IfaceStatus {
    let Some(state) = reply.lines().find_map(|l| l.trim().strip_prefix("wpa_state=")) else {
        return IfaceStatus::Disconnected;
    };

    match state.to_lowercase().as_str() {
        "completed" => IfaceStatus::Connected,
        "inactive" | "interface_disabled" => IfaceStatus::Inactive,
        "authenticating" | "associating" | "associated" | "4way_handshake" | "group_handshake" => {
            IfaceStatus::Connecting
        }
        "scanning" => IfaceStatus::Scanning,
        "disconnected" => IfaceStatus::Disconnected,
        other => {
            warn!(state = other, "unknown wpa_state");
            IfaceStatus::Disconnected
        }
    }
}

/// Infers the pairwise cipher from a `GET_NETWORK <id> pairwise` reply.
/// CCMP wins when several ciphers are allowed.
pub fn parse_cipher(reply: &str) -> CipherType {
    let tokens: Vec<String> = reply.split_whitespace().map(str::to_uppercase).collect();

    match tokens.as_slice() {
        [] => CipherType::None,
        [single] => match single.as_str() {
            "CCMP" => CipherType::Ccmp,
            "TKIP" => CipherType::Tkip,
            "NONE" => CipherType::None,
            _ => CipherType::Unknown,
        },
        many if many.iter().any(|t| t == "CCMP") => CipherType::Ccmp,
        many if many.iter().any(|t| t == "TKIP") => CipherType::Tkip,
        _ => CipherType::Unknown,
    }
}

/// Reverse mapping of `key_mgmt` (and `proto`) to an AKM kind. Both
/// arguments are expected upper-case.
pub fn akm_from_key_mgmt(key_mgmt: &str, proto: Option<&str>) -> AkmType {
    let rsn = proto == Some("RSN");
    match key_mgmt {
        "WPA-PSK" if rsn => AkmType::Wpa2Psk,
        "WPA-PSK" => AkmType::WpaPsk,
        "WPA-EAP" if rsn => AkmType::Wpa2,
        "WPA-EAP" => AkmType::Wpa,
        "NONE" => AkmType::None,
        _ => AkmType::Unknown,
    }
}

/// `key_mgmt` value written for an AKM kind.
pub fn key_mgmt_for(akm: AkmType) -> &'static str {
    if akm.is_psk() {
        "WPA-PSK"
    } else if akm.is_eap() {
        "WPA-EAP"
    } else {
        "NONE"
    }
}

/// `proto` value written for an AKM kind, if any.
pub fn proto_for(akm: AkmType) -> Option<&'static str> {
    match akm {
        AkmType::WpaPsk | AkmType::Wpa => Some("WPA"),
        AkmType::Wpa2Psk | AkmType::Wpa2 => Some("RSN"),
        _ => None,
    }
}

fn pairwise_for(cipher: CipherType) -> Option<&'static str> {
    match cipher {
        CipherType::Ccmp => Some("CCMP"),
        CipherType::Tkip => Some("TKIP"),
        _ => None,
    }
}

fn needs_proto(key_mgmt: &str) -> bool {
    key_mgmt == "WPA-PSK" || key_mgmt == "WPA-EAP"
}

fn is_fail(reply: &str) -> bool {
    reply.trim_start().to_uppercase().starts_with("FAIL")
}

// Data lines of a tabular reply: header skipped, blank lines dropped.
fn records(reply: &str) -> impl Iterator<Item = &str> {
    reply.lines().skip(1).filter(|l| !l.trim().is_empty())
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
