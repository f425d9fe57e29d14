//! Retransmission policy.
//!
//! Two triggers put already-framed datagrams back on the wire:
//! - **Timeout sweep**: the receive timed out, so every pending entry in the
//!   window is resent in ascending order.
//! - **Fast retransmit**: acks keep arriving without moving the window; once
//!   the stale-ack count exceeds the threshold, only the oldest pending entry
//!   is resent.
//!
//! Datagrams are resent exactly as first framed; nothing is re-encoded.
//! [`RetransmitPolicy`] decides *what* to resend and the driver sends it.

use crate::window::Window;

/// Stale-ack bookkeeping for one connection.
#[derive(Debug)]
pub struct RetransmitPolicy {
    threshold: u32,
    /// Consecutive acks that did not advance the window.
    stale_acks: u32,
}

impl RetransmitPolicy {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            stale_acks: 0,
        }
    }

    /// Current stale-ack count (`retransmit_count`).
    pub fn stale_acks(&self) -> u32 {
        self.stale_acks
    }

    /// Forget accumulated loss evidence.  Called whenever the window slides.
    pub fn reset(&mut self) {
        self.stale_acks = 0;
    }

    /// Record one stale ack and return the datagram to fast-retransmit, if
    /// the count now exceeds the threshold.
    ///
    /// The count is left as is after firing, so every further stale ack
    /// resends again until the window slides or a sweep runs.
    pub fn on_stale_ack(&mut self, window: &Window) -> Option<Vec<u8>> {
        self.stale_acks += 1;
        if self.stale_acks > self.threshold {
            window.oldest_pending().map(<[u8]>::to_vec)
        } else {
            None
        }
    }

    /// Collect every pending datagram for a timeout sweep, oldest first, and
    /// reset the stale-ack count.
    pub fn on_timeout(&mut self, window: &Window) -> Vec<(u32, Vec<u8>)> {
        self.stale_acks = 0;
        window
            .pending()
            .map(|(seqno, bytes)| (seqno, bytes.to_vec()))
            .collect()
    }
}
