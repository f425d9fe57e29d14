//! Outbound sliding window.
//!
//! [`Window`] holds every packet that has been transmitted but not yet
//! cumulatively acknowledged, keyed by sequence number.
//!
//! # Window contract
//!
//! - At most `window_size` entries are held at once; the driver checks
//!   [`Window::occupancy`] before enqueueing.
//! - New entries always take the next contiguous slot, `base + occupancy`.
//! - An entry is either [`Slot::Pending`] (eligible for retransmission) or
//!   [`Slot::Acked`] (selectively acknowledged; kept until a cumulative ack
//!   moves `base` past it).
//! - `base` never decreases, and keys below it are gone for good.
//!
//! ```text
//!   base                      base + occupancy
//!    │                               │
//!  ──┼───┬───┬───┬───┬───────────────┼──────▶ seqno
//!    │ P │ P │ A │ P │               │
//!    └───┴───┴───┴───┘
//!      in flight        (P = pending, A = sacked)
//! ```
//!
//! This module only manages state; all socket I/O is the caller's
//! responsibility.

use std::collections::BTreeMap;

/// One window entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// The encoded datagram, kept byte-for-byte for retransmission.
    Pending(Vec<u8>),
    /// Received out of order by the peer; never resent.
    Acked,
}

/// Sender-side window state for one connection.
#[derive(Debug, Default)]
pub struct Window {
    /// Sequence number of the oldest packet not yet cumulatively acked.
    base: u32,
    entries: BTreeMap<u32, Slot>,
}

impl Window {
    /// Create an empty window whose left edge is `base`.
    pub fn new(base: u32) -> Self {
        Self {
            base,
            entries: BTreeMap::new(),
        }
    }

    /// Left edge of the window (`current_seqno`).
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Number of entries currently held, pending or sacked.
    pub fn occupancy(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sequence number the next enqueued packet must carry.
    pub fn next_seqno(&self) -> u32 {
        self.base + self.entries.len() as u32
    }

    /// Place a just-framed datagram into the window.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `seqno` is not the next contiguous slot.
    pub fn enqueue(&mut self, seqno: u32, datagram: Vec<u8>) {
        debug_assert_eq!(
            seqno,
            self.next_seqno(),
            "enqueue out of order (base {}, occupancy {})",
            self.base,
            self.entries.len()
        );
        self.entries.insert(seqno, Slot::Pending(datagram));
    }

    /// Drop every entry below `new_base` and move the left edge there.
    ///
    /// Returns the number of entries removed.  A `new_base` at or below the
    /// current base leaves the window untouched.
    pub fn slide(&mut self, new_base: u32) -> usize {
        if new_base <= self.base {
            return 0;
        }
        let kept = self.entries.split_off(&new_base);
        let removed = self.entries.len();
        self.entries = kept;
        self.base = new_base;
        removed
    }

    /// Turn a pending entry into a tombstone.
    ///
    /// Returns `true` when the entry changed.  Unknown keys and entries that
    /// are already sacked are left alone.
    pub fn mark_selectively_acked(&mut self, seqno: u32) -> bool {
        match self.entries.get_mut(&seqno) {
            Some(slot) if matches!(slot, Slot::Pending(_)) => {
                *slot = Slot::Acked;
                true
            }
            _ => false,
        }
    }

    /// `true` when `seqno` is held in the window (pending or sacked).
    pub fn contains(&self, seqno: u32) -> bool {
        self.entries.contains_key(&seqno)
    }

    /// Pending entries in ascending sequence order.
    ///
    /// Used by the retransmission sweep.
    pub fn pending(&self) -> impl Iterator<Item = (u32, &[u8])> {
        self.entries.iter().filter_map(|(&seqno, slot)| match slot {
            Slot::Pending(bytes) => Some((seqno, bytes.as_slice())),
            Slot::Acked => None,
        })
    }

    /// The entry at `base`, if it is still pending.
    pub fn oldest_pending(&self) -> Option<&[u8]> {
        match self.entries.get(&self.base) {
            Some(Slot::Pending(bytes)) => Some(bytes.as_slice()),
            _ => None,
        }
    }

    /// Sequence numbers currently held, ascending.
    pub fn seqnos(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }
}
