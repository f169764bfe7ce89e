//! Two-tier PIN authorization gate.
//!
//! Two independent credential slots: **staff** (gates opening the drawer)
//! and **admin** (gates settings and PIN rotation). Each slot is a tiny
//! state machine — `Unset` until the first successful prompt bootstraps it,
//! then `Set` forever (only deleting the config record externally resets it).
//!
//! Every operation resolves to a plain `bool`. Callers cannot tell a wrong
//! PIN from a cancelled prompt; that is deliberate, so a failed attempt
//! yields no guessing feedback. Cancellation never mutates anything.

use std::sync::Arc;

use tracing::{info, warn};
use zeroize::Zeroize;

use crate::config::{ConfigPatch, ConfigStore, DeviceConfig};
use crate::credentials;
use crate::ui::OperatorUi;

/// The two credential slots. No shared namespace — a staff PIN equal to the
/// admin PIN is two separate credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Staff,
    Admin,
}

impl Slot {
    fn label(self) -> &'static str {
        match self {
            Self::Staff => "staff",
            Self::Admin => "admin",
        }
    }

    fn stored_hash(self, cfg: &DeviceConfig) -> Option<&str> {
        match self {
            Self::Staff => cfg.staff_pin_hash.as_deref(),
            Self::Admin => cfg.admin_pin_hash.as_deref(),
        }
    }

    fn patch(self, hash: String) -> ConfigPatch {
        match self {
            Self::Staff => ConfigPatch::staff_pin_hash(hash),
            Self::Admin => ConfigPatch::admin_pin_hash(hash),
        }
    }
}

/// PIN gate in front of the drawer and settings operations.
pub struct AuthorizationGate {
    store: Arc<ConfigStore>,
    ui: Arc<dyn OperatorUi>,
}

impl AuthorizationGate {
    pub fn new(store: Arc<ConfigStore>, ui: Arc<dyn OperatorUi>) -> Self {
        Self { store, ui }
    }

    /// Verify the admin PIN, or bootstrap it on first use.
    ///
    /// Idempotent across retries: once a bootstrap has persisted a hash,
    /// every later call takes the verify path.
    pub async fn verify_or_bootstrap_admin(&self, cfg: &DeviceConfig) -> bool {
        self.verify_or_bootstrap(cfg, Slot::Admin).await
    }

    /// Verify the staff PIN, or bootstrap it on first use. No admin gate —
    /// any operator may set the staff PIN the first time.
    pub async fn verify_or_bootstrap_staff(&self, cfg: &DeviceConfig) -> bool {
        self.verify_or_bootstrap(cfg, Slot::Staff).await
    }

    /// Rotate the staff PIN. Admin-gated; a single entry, no confirmation.
    pub async fn change_staff_pin(&self, cfg: &DeviceConfig) -> bool {
        if !self.verify_or_bootstrap_admin(cfg).await {
            return false;
        }
        let Some(mut pin) = self.capture("Change staff PIN", "New staff PIN").await else {
            return false;
        };
        let hash = credentials::hash_pin(&pin);
        pin.zeroize();
        self.persist(Slot::Staff, hash).await
    }

    /// Rotate the admin PIN. Requires the current admin PIN (or bootstrap if
    /// unset), then a new entry plus a confirmation re-entry.
    pub async fn change_admin_pin(&self, cfg: &DeviceConfig) -> bool {
        if !self.verify_or_bootstrap_admin(cfg).await {
            return false;
        }
        let Some(mut pin) = self.capture("Change admin PIN", "New admin PIN").await else {
            return false;
        };
        let Some(mut confirm) = self
            .capture("Change admin PIN", "Confirm new admin PIN")
            .await
        else {
            pin.zeroize();
            return false;
        };

        let matched = pin == confirm;
        confirm.zeroize();
        if !matched {
            pin.zeroize();
            self.ui.show_error("Change admin PIN", "PINs didn't match");
            return false;
        }

        let hash = credentials::hash_pin(&pin);
        pin.zeroize();
        self.persist(Slot::Admin, hash).await
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn verify_or_bootstrap(&self, cfg: &DeviceConfig, slot: Slot) -> bool {
        match slot.stored_hash(cfg) {
            None => self.bootstrap(slot).await,
            Some(stored) => self.verify(slot, stored).await,
        }
    }

    async fn bootstrap(&self, slot: Slot) -> bool {
        let title = match slot {
            Slot::Staff => "Set staff PIN",
            Slot::Admin => "Set admin PIN",
        };
        let Some(mut pin) = self.capture(title, "New PIN").await else {
            return false;
        };
        let hash = credentials::hash_pin(&pin);
        pin.zeroize();
        if !self.persist(slot, hash).await {
            return false;
        }
        info!(slot = slot.label(), "PIN bootstrapped");
        true
    }

    async fn verify(&self, slot: Slot, stored_hash: &str) -> bool {
        let title = match slot {
            Slot::Staff => "Staff PIN required",
            Slot::Admin => "Admin PIN required",
        };
        let Some(mut pin) = self.capture(title, "PIN").await else {
            return false;
        };
        let ok = credentials::pin_matches(&pin, stored_hash);
        pin.zeroize();
        if !ok {
            warn!(slot = slot.label(), "PIN verification failed");
        }
        ok
    }

    /// Prompt for a secret. Empty input counts as cancellation — the host's
    /// modal reports both the same way, and an empty PIN would be a
    /// credential nobody can re-enter on purpose.
    async fn capture(&self, title: &str, label: &str) -> Option<String> {
        let pin = self.ui.prompt_secret(title, label).await?;
        if pin.is_empty() {
            return None;
        }
        Some(pin)
    }

    async fn persist(&self, slot: Slot, hash: String) -> bool {
        match self.store.save(slot.patch(hash)).await {
            Ok(()) => true,
            Err(e) => {
                warn!(slot = slot.label(), error = %e, "failed to persist PIN hash");
                false
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
