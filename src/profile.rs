//! Network profile model.
//!
//! A [`Profile`] describes either an access point seen in a scan or a network
//! configuration saved in the supplicant. The same shape serves both roles;
//! which fields are populated tells them apart.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

/// Authentication algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum AuthAlgorithm {
    #[default]
    Open,
    Shared,
}

impl fmt::Display for AuthAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Shared => write!(f, "SHARED"),
        }
    }
}

/// Authentication and key management kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum AkmType {
    #[default]
    None,
    Wpa,
    WpaPsk,
    Wpa2,
    Wpa2Psk,
    Unknown,
}

impl AkmType {
    pub fn is_psk(self) -> bool {
        matches!(self, Self::WpaPsk | Self::Wpa2Psk)
    }

    pub fn is_eap(self) -> bool {
        matches!(self, Self::Wpa | Self::Wpa2)
    }
}

impl fmt::Display for AkmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "NONE"),
            Self::Wpa => write!(f, "WPA"),
            Self::WpaPsk => write!(f, "WPA-PSK"),
            Self::Wpa2 => write!(f, "WPA2"),
            Self::Wpa2Psk => write!(f, "WPA2-PSK"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Pairwise cipher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum CipherType {
    #[default]
    None,
    Wep,
    Tkip,
    Ccmp,
    Unknown,
}

impl fmt::Display for CipherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "NONE"),
            Self::Wep => write!(f, "WEP"),
            Self::Tkip => write!(f, "TKIP"),
            Self::Ccmp => write!(f, "CCMP"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// How the `key` of a profile is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum KeyType {
    NetworkKey,
    #[default]
    Passphrase,
}

/// A discovered access point or a saved network configuration.
#[derive(Debug, Default, Serialize)]
pub struct Profile {
    /// Network id in the supplicant's store. Only set once the supplicant
    /// has allocated one.
    pub id: Option<u32>,

    /// Network name. `None` for hidden networks.
    pub ssid: Option<String>,

    /// Access point hardware address. Only populated for scan results.
    pub bssid: Option<String>,

    pub auth: AuthAlgorithm,

    /// Key management kinds. A scan result lists every kind the AP
    /// advertises; a profile being created only honours the last one.
    pub akm: Vec<AkmType>,

    pub cipher: CipherType,

    #[serde(skip)]
    pub key_type: KeyType,

    /// Pre-shared key or passphrase.
    #[serde(skip)]
    pub key: Option<SecretString>,

    /// Channel frequency in MHz. Scan results only.
    pub freq: Option<u32>,

    /// Signal level in dBm. Scan results only.
    pub signal: Option<i32>,
}

impl Clone for Profile {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            ssid: self.ssid.clone(),
            bssid: self.bssid.clone(),
            auth: self.auth,
            akm: self.akm.clone(),
            cipher: self.cipher,
            key_type: self.key_type,
            key: self
                .key
                .as_ref()
                .map(|k| SecretString::from(k.expose_secret().to_owned())),
            freq: self.freq,
            signal: self.signal,
        }
    }
}

impl Profile {
    pub fn new(ssid: impl Into<String>) -> Self {
        Self {
            ssid: Some(ssid.into()),
            ..Default::default()
        }
    }

    pub fn with_akm(mut self, akm: AkmType) -> Self {
        self.akm = vec![akm];
        self
    }

    pub fn with_cipher(mut self, cipher: CipherType) -> Self {
        self.cipher = cipher;
        self
    }

    pub fn with_auth(mut self, auth: AuthAlgorithm) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(SecretString::from(key.into()));
        self
    }

    /// Collapses the AKM list to its last entry. Creating a network only
    /// supports a single key management kind.
    pub fn process_akm(&mut self) {
        if self.akm.len() > 1 {
            self.akm.drain(..self.akm.len() - 1);
        }
    }

    /// The key management kind used when this profile is written to the
    /// supplicant.
    pub fn effective_akm(&self) -> AkmType {
        self.akm.last().copied().unwrap_or_default()
    }

    /// Partial-match comparison against `pattern`.
    ///
    /// Every field left unset on `pattern` is a wildcard. `auth` and `cipher`
    /// count as unset at their default (`Open`, `None`). AKM lists match when
    /// the pattern's list is empty or shares at least one kind with ours.
    /// The relation is not symmetric: a sparse pattern matches a full
    /// profile, but not the other way round.
    pub fn matches(&self, pattern: &Profile) -> bool {
        if let Some(ssid) = non_empty(&pattern.ssid) {
            if self.ssid.as_deref() != Some(ssid) {
                return false;
            }
        }

        if let Some(bssid) = non_empty(&pattern.bssid) {
            if self.bssid.as_deref() != Some(bssid) {
                return false;
            }
        }

        if pattern.auth != AuthAlgorithm::default() && pattern.auth != self.auth {
            return false;
        }

        if pattern.cipher != CipherType::default() && pattern.cipher != self.cipher {
            return false;
        }

        pattern.akm.is_empty() || pattern.akm.iter().any(|k| self.akm.contains(k))
    }

    /// Human-readable list of the advertised AKM kinds, `Open` when none.
    pub fn security_label(&self) -> String {
        let kinds: Vec<String> = self
            .akm
            .iter()
            .filter(|k| **k != AkmType::None)
            .map(ToString::to_string)
            .collect();
        if kinds.is_empty() {
            "Open".to_string()
        } else {
            kinds.join(", ")
        }
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}
