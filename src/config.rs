//! Sender tuning parameters.
//!
//! The protocol constants are fixed by BEARS-TP; [`SenderConfig`] exists so
//! tests can shorten the timeout or shrink the window without touching the
//! driver.

use std::time::Duration;

/// How long a single receive waits before the window is swept.
pub const RETRANSMIT_TIMEOUT: Duration = Duration::from_millis(400);

/// Maximum number of packets held in the window.
pub const WINDOW_SIZE: u32 = 7;

/// Stale acks tolerated before the oldest packet is resent.
pub const FAST_RETRANSMIT_THRESHOLD: u32 = 3;

/// Largest payload carried by one `dat` packet.
pub const MAX_CHUNK_SIZE: usize = 1200;

/// Default receiver port.
pub const DEFAULT_PORT: u16 = 33122;

/// Parameters consumed by [`crate::sender::Sender`].
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Receive timeout; expiry triggers a full retransmission sweep.
    pub timeout: Duration,
    /// Window capacity in packets.
    pub window_size: u32,
    /// Fast retransmit fires once the stale-ack count exceeds this.
    pub fast_retransmit_threshold: u32,
    /// Bytes read from the input per `dat` packet.
    pub chunk_size: usize,
    /// Selective acknowledgment mode requested on the command line.
    ///
    /// `sack` replies are honored regardless; the flag is only reported.
    pub sack_mode: bool,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            timeout: RETRANSMIT_TIMEOUT,
            window_size: WINDOW_SIZE,
            fast_retransmit_threshold: FAST_RETRANSMIT_THRESHOLD,
            chunk_size: MAX_CHUNK_SIZE,
            sack_mode: false,
        }
    }
}

impl SenderConfig {
    /// Default configuration with the given sack mode.
    pub fn with_sack_mode(sack_mode: bool) -> Self {
        Self {
            sack_mode,
            ..Self::default()
        }
    }
}
