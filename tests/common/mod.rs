//! A minimal BEARS-TP receiver used as the far end of integration tests.
//!
//! It acks cumulatively (or with `sack` replies), buffers out-of-order
//! segments, and returns the reassembled stream once the `fin` has been
//! delivered and the sender has gone quiet.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use bears_sender::Packet;
use tokio::net::UdpSocket;

/// How long the receiver lingers after the `fin` for retransmitted packets.
const LINGER: Duration = Duration::from_millis(500);

pub struct TestReceiver {
    socket: UdpSocket,
    sack: bool,
}

impl TestReceiver {
    pub async fn bind(sack: bool) -> (Self, SocketAddr) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.expect("bind receiver");
        let addr = socket.local_addr().unwrap();
        (Self { socket, sack }, addr)
    }

    /// Serve one transfer and return the bytes delivered in order.
    pub async fn serve(self) -> Vec<u8> {
        let mut segments: BTreeMap<u32, Vec<u8>> = BTreeMap::new();
        let mut fin: Option<u32> = None;
        let mut expected = 0u32;
        let mut buf = vec![0u8; 65_535];

        loop {
            let wait = if fin.is_some_and(|f| expected > f) {
                LINGER
            } else {
                Duration::from_secs(30)
            };
            let (n, from) = match tokio::time::timeout(wait, self.socket.recv_from(&mut buf)).await {
                Ok(r) => r.expect("receiver recv"),
                Err(_) => break,
            };
            let Ok(packet) = Packet::decode(&buf[..n]) else {
                continue;
            };

            match packet {
                Packet::Syn { seqno: 0 } => {
                    segments.entry(0).or_default();
                }
                Packet::Dat { seqno, data } if seqno >= expected => {
                    segments.insert(seqno, data);
                }
                Packet::Fin { seqno } if seqno >= expected => {
                    segments.entry(seqno).or_default();
                    fin = Some(seqno);
                }
                _ => {}
            }
            while segments.contains_key(&expected) {
                expected += 1;
            }

            let reply = if self.sack {
                let extra: Vec<u32> = segments.range(expected..).map(|(k, _)| *k).collect();
                Packet::Sack { base: expected, extra }
            } else {
                Packet::Ack { seqno: expected }
            };
            let _ = self.socket.send_to(&reply.encode(), from).await;
        }

        let end = fin.expect("transfer ended without fin");
        segments
            .range(1..end)
            .flat_map(|(_, data)| data.iter().copied())
            .collect()
    }
}

/// Deterministic test payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}
