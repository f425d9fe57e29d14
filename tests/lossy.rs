//! Recovery under simulated loss, duplication and corruption.
//!
//! The sender's socket is wrapped in a [`LossyTransport`], so faults hit both
//! the outbound data and the inbound acknowledgments.

mod common;

use std::time::Duration;

use bears_sender::simulator::{LossyTransport, SimulatorConfig};
use bears_sender::{Sender, SenderConfig, Socket};
use common::{payload, TestReceiver};

async fn lossy_transfer(data: &[u8], sim: SimulatorConfig, sack: bool) -> Vec<u8> {
    let (receiver, addr) = TestReceiver::bind(sack).await;
    let server = tokio::spawn(receiver.serve());

    let socket = Socket::connect_addr(addr).await.expect("connect");
    let transport = LossyTransport::new(socket, sim);
    let config = SenderConfig {
        timeout: Duration::from_millis(20),
        ..SenderConfig::default()
    };
    let mut sender = Sender::new(transport, config);

    tokio::time::timeout(Duration::from_secs(60), sender.run(data))
        .await
        .expect("transfer timed out")
        .expect("transfer failed");

    server.await.expect("receiver panicked")
}

#[tokio::test]
async fn recovers_from_packet_loss() {
    let data = payload(30_000);
    let sim = SimulatorConfig {
        loss_rate: 0.2,
        seed: 1,
        ..SimulatorConfig::default()
    };
    assert_eq!(lossy_transfer(&data, sim, false).await, data);
}

#[tokio::test]
async fn recovers_from_loss_with_selective_acks() {
    let data = payload(30_000);
    let sim = SimulatorConfig {
        loss_rate: 0.2,
        seed: 2,
        ..SimulatorConfig::default()
    };
    assert_eq!(lossy_transfer(&data, sim, true).await, data);
}

#[tokio::test]
async fn corrupted_and_duplicated_datagrams_are_tolerated() {
    let data = payload(20_000);
    let sim = SimulatorConfig {
        loss_rate: 0.05,
        corrupt_rate: 0.1,
        duplicate_rate: 0.1,
        seed: 3,
    };
    assert_eq!(lossy_transfer(&data, sim, false).await, data);
}
