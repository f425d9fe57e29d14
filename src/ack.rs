//! Acknowledgment interpretation.
//!
//! Turns one decoded, checksum-valid reply into a [`Verdict`] about the
//! window's left edge.  `sack` replies also tombstone the out-of-order
//! sequence numbers they list, which happens before the cumulative part is
//! validated.
//!
//! The interpreter never moves the window base itself; the driver applies an
//! [`Verdict::Advance`] so that sliding and the stale-ack counter reset stay in
//! one place.

use crate::packet::Packet;
use crate::window::Window;

/// What a reply means for the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// New cumulative base; slide the window to it.
    Advance(u32),
    /// No new information (`seqno <= base`); evidence of loss.
    Stale(u32),
    /// Acknowledges data that cannot have been sent yet.
    Implausible(u32),
    /// Not an acknowledgment.
    Ignored,
}

/// Interpret `packet` against `window`.
///
/// `window_size` bounds how far past the base a plausible ack may reach.
pub fn interpret(packet: &Packet, window: &mut Window, window_size: u32) -> Verdict {
    let proposed = match packet {
        Packet::Ack { seqno } => *seqno,
        Packet::Sack { base, extra } => {
            for &seqno in extra {
                if window.mark_selectively_acked(seqno) {
                    log::debug!("[sender] sack marks seq={seqno}");
                }
            }
            *base
        }
        Packet::Syn { .. } | Packet::Dat { .. } | Packet::Fin { .. } => return Verdict::Ignored,
    };
    validate(proposed, window.base(), window_size)
}

/// Range-check a proposed cumulative base against the current one.
pub fn validate(proposed: u32, base: u32, window_size: u32) -> Verdict {
    if u64::from(proposed) > u64::from(base) + u64::from(window_size) {
        Verdict::Implausible(proposed)
    } else if proposed <= base {
        Verdict::Stale(proposed)
    } else {
        Verdict::Advance(proposed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 7;

    fn window(base: u32, n: u32) -> Window {
        let mut w = Window::new(base);
        for seqno in base..base + n {
            w.enqueue(seqno, vec![seqno as u8]);
        }
        w
    }

    #[test]
    fn ack_one_past_base_advances() {
        let mut w = window(3, 4);
        assert_eq!(interpret(&Packet::Ack { seqno: 4 }, &mut w, W), Verdict::Advance(4));
    }

    #[test]
    fn ack_equal_to_base_is_stale() {
        let mut w = window(3, 4);
        assert_eq!(interpret(&Packet::Ack { seqno: 3 }, &mut w, W), Verdict::Stale(3));
        assert_eq!(interpret(&Packet::Ack { seqno: 0 }, &mut w, W), Verdict::Stale(0));
    }

    #[test]
    fn ack_beyond_window_is_implausible() {
        let mut w = window(3, 4);
        assert_eq!(
            interpret(&Packet::Ack { seqno: 3 + W + 1 }, &mut w, W),
            Verdict::Implausible(11)
        );
        // The far edge itself is still accepted.
        assert_eq!(interpret(&Packet::Ack { seqno: 3 + W }, &mut w, W), Verdict::Advance(10));
    }

    #[test]
    fn validate_does_not_overflow_near_max() {
        assert_eq!(validate(u32::MAX, u32::MAX - 1, W), Verdict::Advance(u32::MAX));
    }

    #[test]
    fn interpret_leaves_base_alone() {
        let mut w = window(1, 3);
        interpret(&Packet::Ack { seqno: 3 }, &mut w, W);
        assert_eq!(w.base(), 1);
        assert_eq!(w.occupancy(), 3);
    }

    #[test]
    fn sack_marks_listed_entries_and_reports_base() {
        let mut w = window(1, 4);
        let sack = Packet::Sack { base: 1, extra: vec![3] };
        assert_eq!(interpret(&sack, &mut w, W), Verdict::Stale(1));
        let pending: Vec<u32> = w.pending().map(|(s, _)| s).collect();
        assert_eq!(pending, vec![1, 2, 4]);
        assert_eq!(w.base(), 1);
    }

    #[test]
    fn sack_ignores_unknown_seqnos() {
        let mut w = window(1, 2);
        let sack = Packet::Sack { base: 2, extra: vec![0, 5, 2] };
        assert_eq!(interpret(&sack, &mut w, W), Verdict::Advance(2));
        let pending: Vec<u32> = w.pending().map(|(s, _)| s).collect();
        assert_eq!(pending, vec![1]);
    }

    #[test]
    fn implausible_sack_still_marks_entries() {
        let mut w = window(0, 3);
        let sack = Packet::Sack { base: 50, extra: vec![2] };
        assert_eq!(interpret(&sack, &mut w, W), Verdict::Implausible(50));
        assert_eq!(w.pending().count(), 2);
    }

    #[test]
    fn sender_packet_types_are_ignored() {
        let mut w = window(0, 1);
        assert_eq!(interpret(&Packet::Syn { seqno: 1 }, &mut w, W), Verdict::Ignored);
        assert_eq!(interpret(&Packet::Fin { seqno: 1 }, &mut w, W), Verdict::Ignored);
        assert_eq!(
            interpret(&Packet::Dat { seqno: 1, data: vec![] }, &mut w, W),
            Verdict::Ignored
        );
    }
}
