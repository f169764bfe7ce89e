//! Operator-facing capability interface.
//!
//! The core never renders anything. The host (window/tray layer) implements
//! [`OperatorUi`] and injects it; the gate and controller call through it for
//! PIN capture and outcome notifications. This keeps the authorization logic
//! agnostic to how prompts and message boxes are actually drawn.

use async_trait::async_trait;

/// What the host must provide for the core to talk to the operator.
#[async_trait]
pub trait OperatorUi: Send + Sync {
    /// Modal secret-text capture. Resolves once, with `None` when the
    /// operator cancels the prompt.
    async fn prompt_secret(&self, title: &str, label: &str) -> Option<String>;

    /// Fire-and-forget error notification.
    fn show_error(&self, title: &str, message: &str);

    /// Fire-and-forget informational notification.
    fn show_message(&self, message: &str);
}
