//! Connection lifecycle driver.
//!
//! [`Sender`] owns the window, the retransmission policy and the transport,
//! and runs one transfer from handshake to teardown:
//!
//! ```text
//!  INIT ──enqueue syn@0──▶ HANDSHAKE_WAIT ──window empty──▶ SENDING
//!                                                            │  ▲
//!                              window full: run a round ─────┘  │
//!                              read chunk, enqueue dat ─────────┘
//!  SENDING ──chunk empty: enqueue fin──▶ DRAINING ──window empty──▶ DONE
//! ```
//!
//! Every wait is a *round*: one bounded receive, then either a timeout sweep
//! or the interpretation of a single reply.  There is no retry ceiling; the
//! sender keeps going until the peer acknowledges or the process is killed.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::ack::{self, Verdict};
use crate::config::SenderConfig;
use crate::packet::{self, Packet};
use crate::retransmit::RetransmitPolicy;
use crate::socket::{Transport, TransportError};
use crate::stats::TransferStats;
use crate::window::Window;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Failures that abort a transfer.
///
/// Protocol-level anomalies (loss, corruption, stale acks) never show up
/// here; they are absorbed by the retransmission machinery.
#[derive(Debug, Error)]
pub enum SenderError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to read input: {0}")]
    Input(#[from] io::Error),
}

// ---------------------------------------------------------------------------
// Sender
// ---------------------------------------------------------------------------

/// Send side of one BEARS-TP connection.
pub struct Sender<T> {
    transport: T,
    config: SenderConfig,
    window: Window,
    policy: RetransmitPolicy,
    stats: TransferStats,
}

impl<T: Transport> Sender<T> {
    pub fn new(transport: T, config: SenderConfig) -> Self {
        let policy = RetransmitPolicy::new(config.fast_retransmit_threshold);
        Self {
            transport,
            config,
            window: Window::new(0),
            policy,
            stats: TransferStats::new(),
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Consecutive stale acks seen since the last slide or sweep.
    pub fn stale_acks(&self) -> u32 {
        self.policy.stale_acks()
    }

    pub fn stats(&self) -> &TransferStats {
        &self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Transfer everything `input` yields, then close the stream.
    ///
    /// Returns once the `fin` has been acknowledged.
    pub async fn run<R>(&mut self, mut input: R) -> Result<TransferStats, SenderError>
    where
        R: AsyncRead + Unpin,
    {
        self.stats = TransferStats::new();
        if self.config.sack_mode {
            log::info!("[sender] sack mode requested; sack replies are honored in every mode");
        }

        self.handshake().await?;

        loop {
            self.make_room().await?;
            let chunk = read_chunk(&mut input, self.config.chunk_size).await?;
            let eof = chunk.is_empty();
            self.send_chunk(chunk).await?;
            if eof {
                break;
            }
        }
        drop(input);

        self.drain().await?;
        log::info!("[sender] transfer complete: {}", self.stats);
        Ok(self.stats.clone())
    }

    /// Send `syn` at the current base and wait until it is acknowledged.
    pub async fn handshake(&mut self) -> Result<(), SenderError> {
        let syn = Packet::Syn {
            seqno: self.window.next_seqno(),
        };
        self.enqueue(syn).await?;
        self.drain().await?;
        log::debug!("[sender] handshake complete, base={}", self.window.base());
        Ok(())
    }

    /// Enqueue one chunk of input: a `dat` packet, or `fin` when the chunk is
    /// empty.
    pub async fn send_chunk(&mut self, chunk: Vec<u8>) -> Result<(), SenderError> {
        let seqno = self.window.next_seqno();
        let packet = if chunk.is_empty() {
            Packet::Fin { seqno }
        } else {
            self.stats.payload_bytes += chunk.len() as u64;
            Packet::Dat { seqno, data: chunk }
        };
        self.enqueue(packet).await
    }

    /// Run rounds until every packet in the window is acknowledged.
    pub async fn drain(&mut self) -> Result<(), SenderError> {
        while !self.window.is_empty() {
            self.process_round().await?;
        }
        Ok(())
    }

    /// Run rounds until there is room for one more packet.
    async fn make_room(&mut self) -> Result<(), SenderError> {
        while self.window.occupancy() >= self.config.window_size as usize {
            self.process_round().await?;
        }
        Ok(())
    }

    /// One bounded receive followed by a sweep or a reply.
    pub async fn process_round(&mut self) -> Result<(), SenderError> {
        match self.transport.recv_timeout(self.config.timeout).await? {
            None => self.sweep().await,
            Some(datagram) => self.handle_reply(&datagram).await,
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Frame `packet`, put it in the window and send it.
    async fn enqueue(&mut self, packet: Packet) -> Result<(), SenderError> {
        let seqno = packet.seqno();
        let datagram = packet.encode();
        log::debug!(
            "[sender] → {} seq={} len={} in_flight={}",
            packet.tag(),
            seqno,
            datagram.len(),
            self.window.occupancy() + 1
        );
        self.transmit(&datagram).await?;
        self.window.enqueue(seqno, datagram);
        Ok(())
    }

    async fn transmit(&mut self, datagram: &[u8]) -> Result<(), SenderError> {
        self.transport.send(datagram).await?;
        self.stats.packets_sent += 1;
        Ok(())
    }

    /// Timeout: resend every pending packet, oldest first.
    async fn sweep(&mut self) -> Result<(), SenderError> {
        let due = self.policy.on_timeout(&self.window);
        self.stats.timeout_sweeps += 1;
        log::debug!(
            "[sender] timeout, retransmitting {} packet(s) from base={}",
            due.len(),
            self.window.base()
        );
        for (_, datagram) in due {
            self.transmit(&datagram).await?;
            self.stats.packets_retransmitted += 1;
        }
        Ok(())
    }

    async fn handle_reply(&mut self, datagram: &[u8]) -> Result<(), SenderError> {
        if !packet::is_valid(datagram) {
            self.stats.corrupt_replies += 1;
            return Ok(());
        }
        let reply = match Packet::decode(datagram) {
            Ok(reply) => reply,
            Err(e) => {
                log::debug!("[sender] ← dropped reply: {e}");
                self.stats.dropped_replies += 1;
                return Ok(());
            }
        };

        match ack::interpret(&reply, &mut self.window, self.config.window_size) {
            Verdict::Advance(new_base) => {
                let slid = self.window.slide(new_base);
                self.policy.reset();
                log::debug!(
                    "[sender] ← {} seq={} (slid {} packet(s))",
                    reply.tag(),
                    new_base,
                    slid
                );
            }
            Verdict::Stale(seqno) => {
                self.stats.stale_acks += 1;
                log::debug!("[sender] ← {} seq={} stale", reply.tag(), seqno);
                if let Some(oldest) = self.policy.on_stale_ack(&self.window) {
                    log::debug!(
                        "[sender] fast retransmit seq={} after {} stale acks",
                        self.window.base(),
                        self.policy.stale_acks()
                    );
                    self.transmit(&oldest).await?;
                    self.stats.fast_retransmits += 1;
                    self.stats.packets_retransmitted += 1;
                }
            }
            Verdict::Implausible(seqno) => {
                self.stats.implausible_acks += 1;
                log::debug!(
                    "[sender] ← {} seq={} beyond window (base={})",
                    reply.tag(),
                    seqno,
                    self.window.base()
                );
            }
            Verdict::Ignored => {
                log::debug!("[sender] ← unexpected {} ignored", reply.tag());
            }
        }
        Ok(())
    }
}

/// Read up to `size` bytes, stopping early only at end of input.
async fn read_chunk<R>(input: &mut R, size: usize) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = Vec::with_capacity(size);
    input.take(size as u64).read_to_end(&mut chunk).await?;
    Ok(chunk)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
