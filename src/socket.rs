//! Datagram transport.
//!
//! [`Transport`] is the only thing the sender needs from the network: send one
//! datagram, and wait a bounded time for the next one.  [`Socket`] implements
//! it over a connected `tokio::net::UdpSocket`; tests substitute scripted or
//! fault-injecting transports.  All protocol logic lives elsewhere; this
//! module owns only byte I/O.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::net::{lookup_host, UdpSocket};

/// Maximum UDP payload size (theoretical limit; in practice kept much smaller).
const MAX_DATAGRAM: usize = 65_535;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can arise from transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying I/O error from the OS.
    #[error("socket I/O error: {0}")]
    Io(#[from] io::Error),
    /// The destination host name did not resolve to any address.
    #[error("could not resolve {0}")]
    Unresolved(String),
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// A datagram channel to a single peer.
#[async_trait]
pub trait Transport: Send {
    /// Send one datagram to the peer.
    async fn send(&mut self, datagram: &[u8]) -> Result<(), TransportError>;

    /// Wait up to `timeout` for the next datagram.
    ///
    /// Returns `Ok(None)` when the timeout elapses first.
    async fn recv_timeout(&mut self, timeout: Duration)
        -> Result<Option<Vec<u8>>, TransportError>;
}

// ---------------------------------------------------------------------------
// Socket
// ---------------------------------------------------------------------------

/// A UDP socket connected to the receiver.
#[derive(Debug)]
pub struct Socket {
    /// Address this socket is bound to (filled in after OS assigns ephemeral port).
    pub local_addr: SocketAddr,
    /// The receiver's address.
    pub peer: SocketAddr,
    inner: UdpSocket,
    /// Receive buffer, reused across rounds.
    buf: Vec<u8>,
}

impl Socket {
    /// Resolve `host:port`, bind an ephemeral port of the matching address
    /// family and connect to the first resolved address.
    pub async fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let peer = lookup_host((host, port))
            .await?
            .next()
            .ok_or_else(|| TransportError::Unresolved(format!("{host}:{port}")))?;
        Self::connect_addr(peer).await
    }

    /// Bind an ephemeral port and connect to `peer`.
    pub async fn connect_addr(peer: SocketAddr) -> Result<Self, TransportError> {
        let bind: SocketAddr = if peer.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let inner = UdpSocket::bind(bind).await?;
        inner.connect(peer).await?;
        let local_addr = inner.local_addr()?;
        Ok(Self {
            local_addr,
            peer,
            inner,
            buf: vec![0u8; MAX_DATAGRAM],
        })
    }
}

#[async_trait]
impl Transport for Socket {
    async fn send(&mut self, datagram: &[u8]) -> Result<(), TransportError> {
        match self.inner.send(datagram).await {
            Ok(_) => Ok(()),
            // A pending ICMP error from an earlier datagram; this one counts
            // as lost and the retransmission timer covers it.
            Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                log::debug!("[socket] {} refused a datagram", self.peer);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn recv_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, TransportError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, self.inner.recv(&mut self.buf)).await {
                Ok(Ok(n)) => return Ok(Some(self.buf[..n].to_vec())),
                // ICMP port-unreachable from an earlier send; the receiver may
                // not be up yet, so keep waiting out the timeout.
                Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => continue,
                Ok(Err(e)) => return Err(e.into()),
                Err(_elapsed) => return Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_and_receive_over_loopback() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut sock = Socket::connect_addr(peer.local_addr().unwrap())
            .await
            .unwrap();

        sock.send(b"syn|0||2507698612").await.unwrap();
        let mut buf = [0u8; 64];
        let (n, from) = peer.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"syn|0||2507698612");

        peer.send_to(b"ack|1|2195368786", from).await.unwrap();
        let got = sock
            .recv_timeout(Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(got.as_deref(), Some(&b"ack|1|2195368786"[..]));
    }

    #[tokio::test]
    async fn recv_times_out_when_peer_is_silent() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut sock = Socket::connect_addr(peer.local_addr().unwrap())
            .await
            .unwrap();
        let got = sock
            .recv_timeout(Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn shorter_datagram_after_longer_one_is_returned_exactly() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut sock = Socket::connect_addr(peer.local_addr().unwrap())
            .await
            .unwrap();

        let to = ("127.0.0.1", sock.local_addr.port());
        peer.send_to(b"sack|1;3,4,5|0000000000", to).await.unwrap();
        peer.send_to(b"ack|2|1", to).await.unwrap();

        let first = sock.recv_timeout(Duration::from_secs(5)).await.unwrap();
        let second = sock.recv_timeout(Duration::from_secs(5)).await.unwrap();
        assert_eq!(first.as_deref(), Some(&b"sack|1;3,4,5|0000000000"[..]));
        assert_eq!(second.as_deref(), Some(&b"ack|2|1"[..]));
        assert_eq!(sock.buf.len(), MAX_DATAGRAM);
    }

    #[tokio::test]
    async fn connect_resolves_host_names() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = peer.local_addr().unwrap().port();
        let sock = Socket::connect("127.0.0.1", port).await.unwrap();
        assert_eq!(sock.peer.port(), port);
    }
}
