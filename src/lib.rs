//! `bears-sender`: the sending half of BEARS-TP, a reliable byte stream
//! carried over UDP with a sliding-window ARQ protocol.
//!
//! # Architecture
//!
//! ```text
//!   input (file / stdin)
//!       │ 1200-byte chunks
//!  ┌────▼──────────────────────────────────────┐
//!  │                 Sender                    │
//!  │  (handshake → fill window → drain on EOF) │
//!  │    ├── Window           in-flight packets │
//!  │    ├── ack::interpret   ack / sack replies│
//!  │    └── RetransmitPolicy sweep / fast resend│
//!  └────┬──────────────────────────────▲───────┘
//!       │ syn / dat / fin               │ ack / sack
//!  ┌────▼───────────────────────────────┴──────┐
//!  │  Transport (Socket over tokio UdpSocket)  │
//!  └───────────────────────────────────────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`packet`]      BEARS-TP wire format and CRC-32 checksum
//! - [`window`]      outbound window keyed by sequence number
//! - [`ack`]         interpretation and range validation of replies
//! - [`retransmit`]  timeout sweep and fast retransmit decisions
//! - [`sender`]      connection lifecycle driver
//! - [`socket`]      datagram transport trait and UDP implementation
//! - [`simulator`]   lossy transport wrapper for testing
//! - [`config`]      protocol constants and sender configuration
//! - [`stats`]       per-transfer counters

pub mod ack;
pub mod config;
pub mod packet;
pub mod retransmit;
pub mod sender;
pub mod simulator;
pub mod socket;
pub mod stats;
pub mod window;

pub use config::SenderConfig;
pub use packet::{Packet, PacketError};
pub use sender::{Sender, SenderError};
pub use socket::{Socket, Transport, TransportError};
pub use stats::TransferStats;
