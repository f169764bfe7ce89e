//! tillkick — PIN-gated cash drawer controller.
//!
//! Opens a cash drawer attached to a network receipt printer by sending the
//! ESC/POS pulse command over raw TCP. The interesting parts are the
//! two-tier PIN authorization gate (staff opens the drawer, admin changes
//! settings, both with first-run bootstrap) and the fail-safe protocol
//! dispatch with a hardware-free `simulate` mode.
//!
//! This crate is the core only. The host application (window, tray icon,
//! global hotkey) implements [`ui::OperatorUi`], picks the config file
//! location, and drives [`controller::DrawerController`].

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod auth;
pub mod config;
pub mod controller;
pub mod credentials;
pub mod drawer;
pub mod ui;

pub use config::{ConfigPatch, ConfigStore, DeviceConfig, DrawerChannel, SIMULATE_ADDRESS};
pub use controller::DrawerController;
pub use drawer::DrawerProtocolClient;
pub use ui::OperatorUi;

/// Initialize console logging for hosts that don't bring their own
/// subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tillkick=debug"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();
}
