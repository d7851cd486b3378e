//! # Event Decoding
//!
//! Turns a raw `PacketEvent` record from the ring buffer into a [`DecodedEvent`].
//!
//! Fields are read at their fixed offsets with explicit byte-order conversions
//! instead of a pointer cast, so a short buffer is a per-record error rather than
//! undefined behaviour. Whether the producer and this decoder agree on the layout
//! is checked once at startup (see [`super::layout`]), not per record.
//!
//! ## Byte Order
//!
//! - Scalars are little-endian (the producer runs on `bpfel`).
//! - Addresses hold the header bytes unchanged: octet 0 is the low byte.
//! - Ports hold network byte order and are converted for display.

use std::net::Ipv4Addr;

use xdpeek_common::{PacketEvent, PAYLOAD_CAPACITY};

use super::clock::ClockOffset;
use crate::domain::{DecodeError, Protocol};

/// A packet record with wall-clock timestamp and host-order fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    /// Nanoseconds since the Unix epoch
    pub timestamp_ns: u64,
    /// Nanoseconds since boot, as recorded by the producer
    pub boot_ns: u64,
    pub protocol: Protocol,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub source_port: u16,
    pub dest_port: u16,
    pub packet_size: u32,
    /// Payload text, present only when payload decoding is on and bytes were captured
    pub payload: Option<String>,
}

/// Stateless record decoder
///
/// Holds the clock offset computed at startup and whether payloads are decoded.
#[derive(Debug, Clone, Copy)]
pub struct EventDecoder {
    offset: ClockOffset,
    decode_payload: bool,
}

impl EventDecoder {
    #[must_use]
    pub fn new(offset: ClockOffset, decode_payload: bool) -> Self {
        Self { offset, decode_payload }
    }

    /// Decode one raw record
    ///
    /// Bytes beyond `PacketEvent::SIZE` are ignored (ring buffer entries may be
    /// padded to 8 bytes).
    ///
    /// # Errors
    /// Returns [`DecodeError::Truncated`] if `raw` is shorter than a record
    pub fn decode(&self, raw: &[u8]) -> Result<DecodedEvent, DecodeError> {
        if raw.len() < PacketEvent::SIZE {
            return Err(DecodeError::Truncated { len: raw.len(), expected: PacketEvent::SIZE });
        }

        let boot_ns = read_u64(raw, PacketEvent::OFFSET_TIMESTAMP);
        let payload = if self.decode_payload {
            let declared = read_u32(raw, PacketEvent::OFFSET_PAYLOAD_LEN) as usize;
            let len = declared.min(PAYLOAD_CAPACITY);
            (len > 0).then(|| {
                let start = PacketEvent::OFFSET_PAYLOAD;
                decode_payload_text(&raw[start..start + len])
            })
        } else {
            None
        };

        Ok(DecodedEvent {
            timestamp_ns: self.offset.to_absolute_ns(boot_ns),
            boot_ns,
            protocol: Protocol::from(raw[PacketEvent::OFFSET_PROTO]),
            source: ipv4_from_raw(read_u32(raw, PacketEvent::OFFSET_SADDR)),
            destination: ipv4_from_raw(read_u32(raw, PacketEvent::OFFSET_DADDR)),
            source_port: read_port(raw, PacketEvent::OFFSET_SPORT),
            dest_port: read_port(raw, PacketEvent::OFFSET_DPORT),
            packet_size: read_u32(raw, PacketEvent::OFFSET_PKT_SIZE),
            payload,
        })
    }
}

/// Dotted-quad address from a record's raw address field
///
/// Octet 0 is the least significant byte.
#[must_use]
pub fn ipv4_from_raw(raw: u32) -> Ipv4Addr {
    Ipv4Addr::new(
        (raw & 0xff) as u8,
        ((raw >> 8) & 0xff) as u8,
        ((raw >> 16) & 0xff) as u8,
        ((raw >> 24) & 0xff) as u8,
    )
}

/// Best-effort UTF-8 decode; invalid sequences become U+FFFD
#[must_use]
pub fn decode_payload_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn read_u64(raw: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&raw[offset..offset + 8]);
    u64::from_le_bytes(buf)
}

fn read_u32(raw: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&raw[offset..offset + 4]);
    u32::from_le_bytes(buf)
}

/// Port fields keep the wire bytes, so they read as big-endian
fn read_port(raw: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([raw[offset], raw[offset + 1]])
}
