//! Transfer statistics.
//!
//! Counters are bumped by [`crate::sender::Sender`] as the transfer runs and
//! returned from [`crate::sender::Sender::run`].

use std::fmt;
use std::time::{Duration, Instant};

/// Counters for one transfer.
#[derive(Debug, Clone)]
pub struct TransferStats {
    /// Datagrams put on the wire, retransmissions included.
    pub packets_sent: u64,
    /// Datagrams sent again after their first transmission.
    pub packets_retransmitted: u64,
    /// Receive timeouts that triggered a sweep.
    pub timeout_sweeps: u64,
    /// Targeted resends triggered by stale acks.
    pub fast_retransmits: u64,
    /// Acks that did not advance the window.
    pub stale_acks: u64,
    /// Acks past anything that could have been sent.
    pub implausible_acks: u64,
    /// Replies dropped for a bad checksum.
    pub corrupt_replies: u64,
    /// Replies with an intact checksum but unparseable content.
    pub dropped_replies: u64,
    /// Payload bytes read from the input and sent in `dat` packets.
    pub payload_bytes: u64,
    started: Instant,
}

impl Default for TransferStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferStats {
    pub fn new() -> Self {
        Self {
            packets_sent: 0,
            packets_retransmitted: 0,
            timeout_sweeps: 0,
            fast_retransmits: 0,
            stale_acks: 0,
            implausible_acks: 0,
            corrupt_replies: 0,
            dropped_replies: 0,
            payload_bytes: 0,
            started: Instant::now(),
        }
    }

    /// Time since the transfer started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Fraction of transmissions that were repeats.
    pub fn retransmit_ratio(&self) -> f64 {
        if self.packets_sent == 0 {
            0.0
        } else {
            self.packets_retransmitted as f64 / self.packets_sent as f64
        }
    }

    /// Payload throughput in bytes per second over the elapsed time.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.payload_bytes as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for TransferStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bytes in {:.2?} ({:.0} B/s): sent={} retransmitted={} ({:.1}%) sweeps={} \
             fast={} stale={} implausible={} corrupt={} dropped={}",
            self.payload_bytes,
            self.elapsed(),
            self.throughput(),
            self.packets_sent,
            self.packets_retransmitted,
            self.retransmit_ratio() * 100.0,
            self.timeout_sweeps,
            self.fast_retransmits,
            self.stale_acks,
            self.implausible_acks,
            self.corrupt_replies,
            self.dropped_replies,
        )
    }
}
