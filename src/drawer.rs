//! Cash drawer kick via ESC/POS over TCP.
//!
//! Sends the standard ESC/POS pulse command to open a cash drawer connected
//! to a thermal receipt printer's DK (drawer kick) port. Raw TCP, port 9100
//! by default; the printer sends no response, we just write and close.
//!
//! Key design goals:
//! - **Fail-safe**: every failure mode (bad address, connect refused, write
//!   error, timeout) is logged and reported as a plain `false` — nothing
//!   propagates to the caller.
//! - **Bounded**: the whole connect+write sequence runs under one timeout;
//!   hitting it drops the in-flight socket rather than leaking it.
//! - **Testable**: the `simulate` address short-circuits through a fixed
//!   async delay so the full flow can run without hardware.

use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, warn};

use crate::config::DeviceConfig;

// ---------------------------------------------------------------------------
// ESC/POS pulse command
// ---------------------------------------------------------------------------

/// ESC — first byte of every ESC/POS command.
pub const PULSE_MARKER: u8 = 0x1B;

/// 'p' — generate pulse.
pub const PULSE_COMMAND: u8 = 0x70;

/// Overall budget for connect + write against real hardware.
const KICK_TIMEOUT: Duration = Duration::from_millis(3000);

/// Fixed delay on the simulate path, standing in for real I/O latency.
const SIMULATE_DELAY: Duration = Duration::from_millis(250);

/// Build the 5-byte pulse frame `ESC p m t1 t2` for this config.
///
/// Byte order and the two leading bytes are load-bearing: real hardware
/// silently ignores or misinterprets anything else.
pub fn pulse_command(cfg: &DeviceConfig) -> [u8; 5] {
    [
        PULSE_MARKER,
        PULSE_COMMAND,
        cfg.drawer_channel.into(),
        cfg.pulse_on_ticks,
        cfg.pulse_off_ticks,
    ]
}

/// Why a kick against real hardware failed. Logged, never surfaced — the
/// operator only ever sees a generic failure.
#[derive(Debug, Error)]
enum KickError {
    #[error("TCP connect to {addr} failed: {source}")]
    Connect { addr: String, source: io::Error },
    #[error("TCP write to {addr} failed: {source}")]
    Write { addr: String, source: io::Error },
    #[error("kick to {addr} timed out after {:?}", KICK_TIMEOUT)]
    TimedOut { addr: String },
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Transmits the drawer kick pulse, or pretends to in simulate mode.
pub struct DrawerProtocolClient {
    timeout: Duration,
    simulate_delay: Duration,
}

impl Default for DrawerProtocolClient {
    fn default() -> Self {
        Self {
            timeout: KICK_TIMEOUT,
            simulate_delay: SIMULATE_DELAY,
        }
    }
}

impl DrawerProtocolClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client with a custom timeout, for tests that need tight bounds.
    #[cfg(test)]
    fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Pulse the drawer line described by `cfg`. Resolves `true` iff the
    /// frame was written without error (or simulate mode is selected);
    /// resolves `false` on any connect/write/timeout failure.
    pub async fn kick(&self, cfg: &DeviceConfig) -> bool {
        if cfg.is_simulate() {
            tokio::time::sleep(self.simulate_delay).await;
            info!("simulate mode — drawer kick skipped hardware");
            return true;
        }

        let host = cfg.printer_address.trim().to_string();
        let addr = format!("{host}:{}", cfg.printer_port);
        let frame = pulse_command(cfg);

        // The timeout covers DNS + connect + write. On expiry the future is
        // dropped, which aborts the connection.
        let sent = tokio::time::timeout(
            self.timeout,
            send_pulse(host, cfg.printer_port, frame),
        )
        .await
        .unwrap_or(Err(KickError::TimedOut { addr: addr.clone() }));

        match sent {
            Ok(()) => {
                info!(addr = %addr, frame = %hex_frame(&frame), "drawer kick sent");
                true
            }
            Err(e) => {
                warn!(error = %e, "drawer kick failed");
                false
            }
        }
    }
}

async fn send_pulse(host: String, port: u16, frame: [u8; 5]) -> Result<(), KickError> {
    let addr = format!("{host}:{port}");
    let mut stream = TcpStream::connect((host.as_str(), port))
        .await
        .map_err(|source| KickError::Connect {
            addr: addr.clone(),
            source,
        })?;

    stream
        .write_all(&frame)
        .await
        .map_err(|source| KickError::Write {
            addr: addr.clone(),
            source,
        })?;

    // Flush the write side before dropping the socket; the printer never
    // replies, so there is nothing to read.
    stream
        .shutdown()
        .await
        .map_err(|source| KickError::Write { addr, source })?;
    Ok(())
}

fn hex_frame(frame: &[u8]) -> String {
    frame
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DrawerChannel;
    use std::time::Instant;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn cfg(address: &str, port: u16) -> DeviceConfig {
        DeviceConfig {
            printer_address: address.into(),
            printer_port: port,
            ..DeviceConfig::default()
        }
    }

    #[test]
    fn pulse_command_layout() {
        let cfg = DeviceConfig::default();
        let frame = pulse_command(&cfg);
        assert_eq!(frame.len(), 5);
        assert_eq!(frame[0], 0x1B); // ESC
        assert_eq!(frame[1], 0x70); // p
    }

    #[test]
    fn pulse_command_reference_bytes() {
        // channel=0, on=50, off=200 must produce 1B 70 00 32 C8.
        let cfg = DeviceConfig {
            drawer_channel: DrawerChannel::Pin2,
            pulse_on_ticks: 50,
            pulse_off_ticks: 200,
            ..DeviceConfig::default()
        };
        assert_eq!(pulse_command(&cfg), [0x1B, 0x70, 0x00, 0x32, 0xC8]);
    }

    #[test]
    fn pulse_command_second_channel() {
        let cfg = DeviceConfig {
            drawer_channel: DrawerChannel::Pin5,
            pulse_on_ticks: 0,
            pulse_off_ticks: 255,
            ..DeviceConfig::default()
        };
        assert_eq!(pulse_command(&cfg), [0x1B, 0x70, 0x01, 0x00, 0xFF]);
    }

    #[tokio::test]
    async fn simulate_resolves_true_within_bound() {
        let client = DrawerProtocolClient::new();
        let start = Instant::now();
        // Other fields are irrelevant in simulate mode, including the port.
        assert!(client.kick(&cfg("simulate", 1)).await);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn simulate_matches_case_insensitively() {
        let client = DrawerProtocolClient::new();
        assert!(client.kick(&cfg("  SIMULATE ", 9100)).await);
    }

    #[tokio::test]
    async fn listener_receives_exact_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut stream, _addr) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf).await.unwrap();
            buf
        });

        let client = DrawerProtocolClient::new();
        let mut cfg = cfg("127.0.0.1", port);
        cfg.drawer_channel = DrawerChannel::Pin2;
        cfg.pulse_on_ticks = 50;
        cfg.pulse_off_ticks = 200;
        assert!(client.kick(&cfg).await);

        let received = server.await.unwrap();
        assert_eq!(received, vec![0x1B, 0x70, 0x00, 0x32, 0xC8]);
    }

    #[tokio::test]
    async fn refused_connection_resolves_false() {
        // Bind then drop, so the port is closed and connect is refused.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = DrawerProtocolClient::new();
        assert!(!client.kick(&cfg("127.0.0.1", port)).await);
    }

    #[tokio::test]
    async fn unreachable_address_resolves_false_within_timeout() {
        // 192.0.2.1 is TEST-NET; connects either fail fast or hang until
        // the client timeout fires. Either way the result is bounded.
        let client = DrawerProtocolClient::with_timeout(Duration::from_millis(300));
        let start = Instant::now();
        assert!(!client.kick(&cfg("192.0.2.1", 9100)).await);
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn unresolvable_hostname_resolves_false() {
        let client = DrawerProtocolClient::with_timeout(Duration::from_secs(1));
        assert!(!client.kick(&cfg("printer.invalid", 9100)).await);
    }
}
