//! Stack configuration.
//!
//! Network parameters a board provisions: device identity, subnet,
//! CSMA-CA defaults, the beacon and background-scan schedules.
//! Loaded from JSON during provisioning or from a postcard blob kept in
//! non-volatile storage.  Values are validated, never silently clamped.

use serde::{Deserialize, Serialize};

use crate::csma::params;
use crate::error::ConfigError;
use crate::m2np::MAX_PAYLOAD;
use crate::time::Ti;

/// Device identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// 8-byte universal ID.
    pub uid: [u8; 8],
    /// 2-byte virtual ID; all-zero means unassigned.
    pub vid: [u8; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsmaConfig {
    /// Default `csmaca_params` for locally originated requests.
    pub params: u8,
    /// Turnaround guard between no-CA attempts.
    pub tg: Ti,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconConfig {
    pub enabled: bool,
    pub channel: u8,
    /// ISF announced in each beacon.
    pub isf_id: u8,
    pub max_bytes: u8,
    /// Ticks between beacons.
    pub interval: Ti,
    pub redundants: u8,
    /// Contention window for each beacon.
    pub window: Ti,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    pub channel: u8,
    pub timeout: Ti,
    pub redundants: u8,
}

/// Network configuration (`netconf`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackConfig {
    pub device: DeviceConfig,
    /// Frame-filter subnet for requests.
    pub subnet: u8,
    /// Subnet used for outgoing beacons.
    pub beacon_subnet: u8,
    /// Link-control byte written into every outgoing frame.
    pub tx_eirp: u8,
    /// Key index for DLLS/NLS frames.
    pub key_index: u8,
    /// Honour multi-hop routing blocks.
    pub multihop: bool,
    pub csma: CsmaConfig,
    pub beacon: BeaconConfig,
    pub scan: ScanConfig,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig {
                uid: [0x00, 0x0B, 0x57, 0x00, 0x00, 0x00, 0x00, 0x01],
                vid: [0x00, 0x00],
            },
            subnet: 0xF0,
            beacon_subnet: 0xF0,
            tx_eirp: 0x7F,
            key_index: 0,
            multihop: false,
            csma: CsmaConfig {
                params: params::RIGD,
                tg: Ti(5),
            },
            beacon: BeaconConfig {
                enabled: false,
                channel: 0x10,
                isf_id: 0x01,
                max_bytes: 16,
                interval: Ti(4096), // 4 s
                redundants: 1,
                window: Ti(32),
            },
            scan: ScanConfig {
                channel: 0x10,
                timeout: Ti(128),
                redundants: 0,
            },
        }
    }
}

impl StackConfig {
    /// Range checks.  Rejects rather than clamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.uid == [0; 8] {
            return Err(ConfigError::ValidationFailed("device.uid must be non-zero"));
        }
        if self.csma.params & !(params::ALGO | params::NOCA | params::A2P) != 0 {
            return Err(ConfigError::ValidationFailed("csma.params has unknown bits"));
        }
        if usize::from(self.beacon.max_bytes) > MAX_PAYLOAD {
            return Err(ConfigError::ValidationFailed("beacon.max_bytes exceeds frame payload"));
        }
        if self.beacon.enabled && self.beacon.interval.is_zero() {
            return Err(ConfigError::ValidationFailed("beacon.interval must be > 0"));
        }
        if self.scan.timeout.is_zero() {
            return Err(ConfigError::ValidationFailed("scan.timeout must be > 0"));
        }
        Ok(())
    }

    /// Parse and validate a JSON provisioning document.
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(s).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persistence blob.
    pub fn to_postcard(&self) -> Result<Vec<u8>, ConfigError> {
        postcard::to_allocvec(self).map_err(|_| ConfigError::Corrupted)
    }

    /// Decode and validate a persistence blob.
    pub fn from_postcard(bytes: &[u8]) -> Result<Self, ConfigError> {
        let cfg: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn vid_assigned(&self) -> bool {
        self.device.vid != [0, 0]
    }
}
