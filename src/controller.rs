//! Orchestration of the drawer-open and settings flows.
//!
//! The controller is what the host (window/tray/hotkey layer) actually
//! talks to. It wires the config store, the PIN gate, and the protocol
//! client together and classifies outcomes for the operator. Nothing here
//! ever raises to the caller — results come back as values, and operator
//! feedback goes through the injected [`OperatorUi`].

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::AuthorizationGate;
use crate::config::{ConfigPatch, ConfigStore, DeviceConfig};
use crate::drawer::DrawerProtocolClient;
use crate::ui::OperatorUi;

const DRAWER_TITLE: &str = "Cash drawer";

/// Entry point for every host-triggered operation.
pub struct DrawerController {
    store: Arc<ConfigStore>,
    gate: AuthorizationGate,
    client: DrawerProtocolClient,
    ui: Arc<dyn OperatorUi>,
}

impl DrawerController {
    pub fn new(store: Arc<ConfigStore>, ui: Arc<dyn OperatorUi>) -> Self {
        let gate = AuthorizationGate::new(store.clone(), ui.clone());
        Self {
            store,
            gate,
            client: DrawerProtocolClient::new(),
            ui,
        }
    }

    /// Current persisted configuration (defaults on first run).
    pub async fn load_config(&self) -> DeviceConfig {
        self.store.load().await
    }

    /// Persist a settings change. Admin-gated: the gate runs (bootstrapping
    /// the admin PIN on first use) before anything is written.
    pub async fn save_config(&self, patch: ConfigPatch) -> bool {
        let cfg = self.store.load().await;
        if !self.gate.verify_or_bootstrap_admin(&cfg).await {
            return false;
        }
        match self.store.save(patch).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to save settings");
                self.ui.show_error("Settings", "Failed to save settings");
                false
            }
        }
    }

    /// The privileged action: open the drawer.
    ///
    /// 1. Unconfigured (no printer address) — tell the operator, and never
    ///    show a PIN prompt.
    /// 2. Staff gate fails (wrong PIN or cancelled) — stop silently; the two
    ///    cases are indistinguishable on purpose.
    /// 3. Kick fails — one generic failure message; the cause is in the log.
    pub async fn open_drawer(&self) {
        let cfg = self.store.load().await;
        if !cfg.is_configured() {
            self.ui.show_error(
                DRAWER_TITLE,
                "No printer address configured. Open settings first.",
            );
            return;
        }

        if !self.gate.verify_or_bootstrap_staff(&cfg).await {
            info!("drawer open not authorized");
            return;
        }

        if self.client.kick(&cfg).await {
            info!("drawer opened");
        } else {
            self.ui.show_error(
                DRAWER_TITLE,
                "Failed to open the drawer. Check the printer address, drawer channel, pulse timing, and that the printer is reachable.",
            );
        }
    }

    /// Kick with a caller-supplied (possibly unsaved) config, bypassing
    /// authorization. Only for the settings surface, which is already behind
    /// the admin gate.
    pub async fn test_open(&self, cfg: &DeviceConfig) -> bool {
        self.client.kick(cfg).await
    }

    /// Rotate the staff PIN (admin-gated inside the gate).
    pub async fn set_staff_pin(&self) -> bool {
        let cfg = self.store.load().await;
        let ok = self.gate.change_staff_pin(&cfg).await;
        if ok {
            self.ui.show_message("Staff PIN updated");
        }
        ok
    }

    /// Rotate the admin PIN (current PIN + confirmation re-entry).
    pub async fn set_admin_pin(&self) -> bool {
        let cfg = self.store.load().await;
        let ok = self.gate.change_admin_pin(&cfg).await;
        if ok {
            self.ui.show_message("Admin PIN updated");
        }
        ok
    }
}

// ===========================================================================
// Tests
// ===========================================================================
