//! Wire-format definitions for BEARS-TP datagrams.
//!
//! Every datagram exchanged with the receiver is a [`Packet`].  This module is
//! responsible for:
//! - Defining the on-wire text layout (type tag, sequence field, payload,
//!   checksum).
//! - Serialising a [`Packet`] into a byte buffer ready for transmission.
//! - Deserialising a raw byte slice back into a [`Packet`], rejecting corrupt
//!   or malformed input.
//!
//! No I/O happens here.
//!
//! # Wire format
//!
//! Fields are separated by `|`.  Sequence numbers and the checksum are ASCII
//! decimal.
//!
//! ```text
//!  syn|<seqno>|<payload>|<checksum>
//!  dat|<seqno>|<payload>|<checksum>
//!  fin|<seqno>|<payload>|<checksum>
//!  ack|<seqno>|<checksum>
//!  sack|<base>;<s1>,<s2>,...|<checksum>
//! ```
//!
//! The payload is raw bytes and may itself contain `|`; it spans everything
//! between the second separator and the last one.  The checksum is the CRC-32
//! (zlib polynomial) of every byte up to and including the final separator.

use thiserror::Error;

/// Field separator.
const SEP: u8 = b'|';
/// Separates the cumulative base from the selective list inside a `sack`.
const SACK_SEP: &str = ";";
/// Separates entries of the selective list.
const SACK_LIST_SEP: &str = ",";

/// A decoded BEARS-TP datagram.
///
/// The sender produces `Syn`, `Dat`, and `Fin`; the receiver replies with
/// `Ack` and `Sack`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Connection open request.
    Syn { seqno: u32 },
    /// One data segment of at most [`crate::config::MAX_CHUNK_SIZE`] bytes.
    Dat { seqno: u32, data: Vec<u8> },
    /// End-of-stream marker.
    Fin { seqno: u32 },
    /// Cumulative acknowledgment: every seqno below `seqno` has arrived.
    Ack { seqno: u32 },
    /// Cumulative base plus sequence numbers received out of order.
    Sack { base: u32, extra: Vec<u32> },
}

impl Packet {
    /// The type tag written on the wire.
    pub fn tag(&self) -> &'static str {
        match self {
            Packet::Syn { .. } => "syn",
            Packet::Dat { .. } => "dat",
            Packet::Fin { .. } => "fin",
            Packet::Ack { .. } => "ack",
            Packet::Sack { .. } => "sack",
        }
    }

    /// Sequence number carried by the packet (the cumulative base for `sack`).
    pub fn seqno(&self) -> u32 {
        match self {
            Packet::Syn { seqno }
            | Packet::Dat { seqno, .. }
            | Packet::Fin { seqno }
            | Packet::Ack { seqno } => *seqno,
            Packet::Sack { base, .. } => *base,
        }
    }

    /// Serialise this packet into a newly allocated byte vector, checksum
    /// included.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(self.tag().as_bytes());
        buf.push(SEP);

        match self {
            Packet::Syn { seqno } | Packet::Fin { seqno } => {
                buf.extend_from_slice(seqno.to_string().as_bytes());
                buf.push(SEP);
            }
            Packet::Dat { seqno, data } => {
                buf.extend_from_slice(seqno.to_string().as_bytes());
                buf.push(SEP);
                buf.extend_from_slice(data);
            }
            Packet::Ack { seqno } => {
                buf.extend_from_slice(seqno.to_string().as_bytes());
            }
            Packet::Sack { base, extra } => {
                let list: Vec<String> = extra.iter().map(u32::to_string).collect();
                let field = format!("{}{}{}", base, SACK_SEP, list.join(SACK_LIST_SEP));
                buf.extend_from_slice(field.as_bytes());
            }
        }

        buf.push(SEP);
        let csum = checksum(&buf);
        buf.extend_from_slice(csum.to_string().as_bytes());
        buf
    }

    /// Parse a [`Packet`] from a raw datagram.
    ///
    /// The checksum is verified with [`is_valid`] before anything else is
    /// looked at, so a corrupted datagram always yields
    /// [`PacketError::ChecksumFailed`].
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        let last = trailer(buf).ok_or(PacketError::Malformed)?;
        if !is_valid(buf) {
            return Err(PacketError::ChecksumFailed);
        }

        let body = &buf[..last];
        let (tag, rest) = split_once(body).ok_or(PacketError::Malformed)?;
        // The stock receiver omits the payload field on acks.
        let (seq_field, data) = split_once(rest).unwrap_or((rest, &[][..]));

        let tag = std::str::from_utf8(tag).map_err(|_| PacketError::Malformed)?;
        let seq_field = std::str::from_utf8(seq_field).map_err(|_| PacketError::BadSeqno)?;

        match tag {
            "syn" => Ok(Packet::Syn { seqno: parse_seqno(seq_field)? }),
            "dat" => Ok(Packet::Dat {
                seqno: parse_seqno(seq_field)?,
                data: data.to_vec(),
            }),
            "fin" => Ok(Packet::Fin { seqno: parse_seqno(seq_field)? }),
            "ack" => Ok(Packet::Ack { seqno: parse_seqno(seq_field)? }),
            "sack" => parse_sack(seq_field),
            other => Err(PacketError::UnknownType(other.to_string())),
        }
    }
}

/// Returns `true` when the trailing checksum of `datagram` verifies.
///
/// The sender runs every reply through this before decoding it; it does not
/// look at the packet type or sequence field.
pub fn is_valid(datagram: &[u8]) -> bool {
    trailer(datagram)
        .is_some_and(|last| checksum_matches(&datagram[..=last], &datagram[last + 1..]))
}

/// Errors that can arise when parsing a raw datagram.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    /// A field separator is missing.
    #[error("datagram is missing a field separator")]
    Malformed,
    /// Checksum did not match the recomputed value.
    #[error("checksum verification failed")]
    ChecksumFailed,
    /// Type tag is not one of `syn`, `dat`, `fin`, `ack`, `sack`.
    #[error("unknown packet type {0:?}")]
    UnknownType(String),
    /// The sequence field is not a decimal integer.
    #[error("sequence number is not a decimal integer")]
    BadSeqno,
    /// A `sack` field that does not read as `<base>;<s1>,<s2>,...`.
    #[error("malformed selective acknowledgment")]
    MalformedAck,
}

/// CRC-32 over `body`, matching zlib's `crc32`.
fn checksum(body: &[u8]) -> u32 {
    crc32fast::hash(body)
}

/// Index of the separator in front of the checksum.
fn trailer(buf: &[u8]) -> Option<usize> {
    buf.iter().rposition(|&b| b == SEP)
}

fn checksum_matches(body: &[u8], reported: &[u8]) -> bool {
    std::str::from_utf8(reported)
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .is_some_and(|r| r == checksum(body))
}

/// Split at the first separator, excluding it.
fn split_once(buf: &[u8]) -> Option<(&[u8], &[u8])> {
    let i = buf.iter().position(|&b| b == SEP)?;
    Some((&buf[..i], &buf[i + 1..]))
}

fn parse_seqno(field: &str) -> Result<u32, PacketError> {
    field.parse().map_err(|_| PacketError::BadSeqno)
}

fn parse_sack(field: &str) -> Result<Packet, PacketError> {
    let (base, list) = field
        .split_once(SACK_SEP)
        .ok_or(PacketError::MalformedAck)?;
    let base = base.parse().map_err(|_| PacketError::MalformedAck)?;
    let extra = if list.is_empty() {
        Vec::new()
    } else {
        list.split(SACK_LIST_SEP)
            .map(|s| s.parse().map_err(|_| PacketError::MalformedAck))
            .collect::<Result<Vec<u32>, _>>()?
    };
    Ok(Packet::Sack { base, extra })
}
