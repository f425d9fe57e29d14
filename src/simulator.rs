//! Fault-injecting transport for deterministic testing.
//!
//! Real networks drop, duplicate and corrupt datagrams.  To exercise the
//! retransmission machinery without depending on actual network conditions,
//! [`LossyTransport`] wraps any [`Transport`] and applies a configurable
//! fault model in both directions:
//!
//! | Fault        | Description                                          |
//! |--------------|------------------------------------------------------|
//! | Loss         | Drop a datagram with probability `loss_rate`.        |
//! | Duplication  | Send an outbound datagram twice.                     |
//! | Corruption   | Flip one random bit with probability `corrupt_rate`. |
//!
//! The RNG is seeded so a failing run can be replayed exactly.

use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::socket::{Transport, TransportError};

/// Configuration for the fault-injection model.
///
/// All probabilities are in the range `[0.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Probability that any given datagram is silently dropped.
    pub loss_rate: f64,
    /// Probability that an outbound datagram is sent twice.
    pub duplicate_rate: f64,
    /// Probability that a datagram has one bit flipped.
    pub corrupt_rate: f64,
    /// RNG seed.
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        // No faults: a transparent pass-through.
        Self {
            loss_rate: 0.0,
            duplicate_rate: 0.0,
            corrupt_rate: 0.0,
            seed: 0,
        }
    }
}

/// Counts of faults injected so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultCounts {
    pub dropped: u64,
    pub duplicated: u64,
    pub corrupted: u64,
}

/// A fault-injecting wrapper around another transport.
pub struct LossyTransport<T> {
    inner: T,
    config: SimulatorConfig,
    rng: StdRng,
    faults: FaultCounts,
}

impl<T: Transport> LossyTransport<T> {
    pub fn new(inner: T, config: SimulatorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            inner,
            config,
            rng,
            faults: FaultCounts::default(),
        }
    }

    pub fn faults(&self) -> FaultCounts {
        self.faults
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    fn chance(&mut self, p: f64) -> bool {
        p > 0.0 && self.rng.gen_bool(p.min(1.0))
    }

    /// Possibly flip one bit; returns the (maybe altered) datagram.
    fn maybe_corrupt(&mut self, datagram: &[u8]) -> Vec<u8> {
        let mut out = datagram.to_vec();
        if !out.is_empty() && self.chance(self.config.corrupt_rate) {
            let i = self.rng.gen_range(0..out.len());
            let bit = self.rng.gen_range(0..8);
            out[i] ^= 1u8 << bit;
            self.faults.corrupted += 1;
        }
        out
    }
}

#[async_trait]
impl<T: Transport> Transport for LossyTransport<T> {
    async fn send(&mut self, datagram: &[u8]) -> Result<(), TransportError> {
        if self.chance(self.config.loss_rate) {
            self.faults.dropped += 1;
            log::trace!("[sim] dropped outbound datagram");
            return Ok(());
        }
        let out = self.maybe_corrupt(datagram);
        self.inner.send(&out).await?;
        if self.chance(self.config.duplicate_rate) {
            self.faults.duplicated += 1;
            self.inner.send(&out).await?;
        }
        Ok(())
    }

    async fn recv_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, TransportError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let Some(datagram) = self.inner.recv_timeout(remaining).await? else {
                return Ok(None);
            };
            if self.chance(self.config.loss_rate) {
                self.faults.dropped += 1;
                log::trace!("[sim] dropped inbound datagram");
                continue;
            }
            return Ok(Some(self.maybe_corrupt(&datagram)));
        }
    }
}
