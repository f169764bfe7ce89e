//! Device configuration persistence.
//!
//! One flat JSON document per installation holds everything the drawer core
//! needs: printer address/port, pulse parameters, and the two PIN hashes.
//! The host hands us the storage path at startup; everything else (defaults,
//! tolerant reads, merge-on-save) lives here.
//!
//! Reads never fail: a missing, unreadable, or malformed file is treated as
//! a first run and yields the defaults. Writes are merge-on-save — a partial
//! patch is applied over the last persisted record so unrelated fields are
//! never clobbered — and serialized through a single in-process lock.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Sentinel printer address that selects the no-hardware test path.
pub const SIMULATE_ADDRESS: &str = "simulate";

/// Default raw TCP port for network receipt printers.
pub const DEFAULT_PRINTER_PORT: u16 = 9100;

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// Which drawer-kick line the pulse goes out on.
///
/// ESC/POS printers expose two kick lines on the DK connector: `m = 0`
/// drives pin 2, `m = 1` drives pin 5. Serialized as the raw 0/1 integer;
/// any other value makes the document malformed, which loads as defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DrawerChannel {
    #[default]
    Pin2 = 0,
    Pin5 = 1,
}

impl TryFrom<u8> for DrawerChannel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Pin2),
            1 => Ok(Self::Pin5),
            other => Err(format!("drawer channel must be 0 or 1, got {other}")),
        }
    }
}

impl From<DrawerChannel> for u8 {
    fn from(channel: DrawerChannel) -> Self {
        channel as u8
    }
}

/// The single persisted configuration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceConfig {
    /// Printer IPv4/hostname, or [`SIMULATE_ADDRESS`]. Empty = unconfigured.
    pub printer_address: String,
    pub printer_port: u16,
    pub drawer_channel: DrawerChannel,
    pub pulse_on_ticks: u8,
    pub pulse_off_ticks: u8,
    /// One-way hash of the staff PIN; `None` means the slot is unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_pin_hash: Option<String>,
    /// One-way hash of the admin PIN; `None` means the slot is unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_pin_hash: Option<String>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            printer_address: String::new(),
            printer_port: DEFAULT_PRINTER_PORT,
            drawer_channel: DrawerChannel::Pin2,
            pulse_on_ticks: 50,
            pulse_off_ticks: 200,
            staff_pin_hash: None,
            admin_pin_hash: None,
        }
    }
}

impl DeviceConfig {
    /// True when a printer address has been set at all.
    pub fn is_configured(&self) -> bool {
        !self.printer_address.trim().is_empty()
    }

    /// True when the address selects the no-hardware simulate path.
    pub fn is_simulate(&self) -> bool {
        self.printer_address
            .trim()
            .eq_ignore_ascii_case(SIMULATE_ADDRESS)
    }
}

/// A partial update to [`DeviceConfig`]. Fields left as `None` keep their
/// persisted value on save.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigPatch {
    pub printer_address: Option<String>,
    pub printer_port: Option<u16>,
    pub drawer_channel: Option<DrawerChannel>,
    pub pulse_on_ticks: Option<u8>,
    pub pulse_off_ticks: Option<u8>,
    pub staff_pin_hash: Option<String>,
    pub admin_pin_hash: Option<String>,
}

impl ConfigPatch {
    /// Patch that only rotates the staff PIN hash.
    pub fn staff_pin_hash(hash: String) -> Self {
        Self {
            staff_pin_hash: Some(hash),
            ..Self::default()
        }
    }

    /// Patch that only rotates the admin PIN hash.
    pub fn admin_pin_hash(hash: String) -> Self {
        Self {
            admin_pin_hash: Some(hash),
            ..Self::default()
        }
    }

    fn apply(self, cfg: &mut DeviceConfig) {
        if let Some(v) = self.printer_address {
            cfg.printer_address = v;
        }
        if let Some(v) = self.printer_port {
            cfg.printer_port = v;
        }
        if let Some(v) = self.drawer_channel {
            cfg.drawer_channel = v;
        }
        if let Some(v) = self.pulse_on_ticks {
            cfg.pulse_on_ticks = v;
        }
        if let Some(v) = self.pulse_off_ticks {
            cfg.pulse_off_ticks = v;
        }
        if let Some(v) = self.staff_pin_hash {
            cfg.staff_pin_hash = Some(v);
        }
        if let Some(v) = self.admin_pin_hash {
            cfg.admin_pin_hash = Some(v);
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Loads and saves the configuration record at a fixed path.
pub struct ConfigStore {
    path: PathBuf,
    /// Serializes save() calls so two partial merges can never interleave.
    write_lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted record. Never errors: missing, unreadable, or
    /// malformed storage is treated as a first run and yields defaults.
    pub async fn load(&self) -> DeviceConfig {
        read_record(&self.path)
    }

    /// Merge `patch` over the persisted record and write the result back.
    ///
    /// The whole load-merge-write sequence runs under the write lock, and the
    /// document is replaced via temp file + rename so a concurrent `load`
    /// never observes a half-written record.
    pub async fn save(&self, patch: ConfigPatch) -> Result<(), String> {
        let _guard = self.write_lock.lock().await;

        let mut cfg = read_record(&self.path);
        patch.apply(&mut cfg);

        let json = serde_json::to_string_pretty(&cfg).map_err(|e| e.to_string())?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("create config dir {}: {e}", parent.display()))?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| format!("write {}: {e}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| format!("replace {}: {e}", self.path.display()))?;

        debug!(path = %self.path.display(), "config saved");
        Ok(())
    }
}

fn read_record(path: &Path) -> DeviceConfig {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return DeviceConfig::default(),
    };
    match serde_json::from_str::<DeviceConfig>(&raw) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "config unreadable — using defaults");
            DeviceConfig::default()
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
