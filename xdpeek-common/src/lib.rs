//! # Shared Data Structures (eBPF ↔ Userspace)
//!
//! Defines the packet record and constants shared between the kernel-side XDP
//! program and the userspace tracer. The record uses `#[repr(C)]` so both sides
//! agree on the byte layout across the ring buffer.
//!
//! ## Key Items
//!
//! - [`PacketEvent`] - Per-packet metadata record written to the `events` ring buffer
//! - [`PAYLOAD_CAPACITY`] - Size of the inline payload buffer
//! - [`CONFIG_CAPTURE_PAYLOAD`] - `CONFIG` map key toggling payload capture
//! - [`EVENT_SIZE_SYMBOL`] - Name of the layout marker exported by the eBPF object

#![no_std]

// ============================================================================
// Protocol Numbers (IANA)
// ============================================================================

pub const IPPROTO_ICMP: u8 = 1;
pub const IPPROTO_TCP: u8 = 6;
pub const IPPROTO_UDP: u8 = 17;

// ============================================================================
// Configuration
// ============================================================================

/// Maximum number of payload bytes copied into a single record
///
/// Bounded by the eBPF stack/verifier budget: the producer copies byte-by-byte
/// with a constant loop bound.
pub const PAYLOAD_CAPACITY: usize = 128;

/// `CONFIG` map key: capture payload bytes when set to 1
pub const CONFIG_CAPTURE_PAYLOAD: u32 = 0;

/// `DROPPED_EVENTS` per-CPU array index holding the count of records that
/// could not be reserved in the ring buffer
pub const DROPPED_EVENTS_KEY: u32 = 0;

/// Name of the ring buffer map carrying [`PacketEvent`] records
pub const EVENTS_MAP: &str = "events";

/// Name of the XDP entry function
pub const PROGRAM_NAME: &str = "trace_packet";

/// Symbol exported by the eBPF object holding `size_of::<PacketEvent>()` as
/// compiled into the producer. Checked by userspace before loading.
pub const EVENT_SIZE_SYMBOL: &str = "XDPEEK_EVENT_SIZE";

// ============================================================================
// Shared Data Structures
// ============================================================================

/// Packet metadata emitted once per observed IPv4 packet
///
/// **Memory Layout**: `#[repr(C)]`, 160 bytes, 8-byte aligned.
///
/// | offset | field |
/// |-------:|-------|
/// | 0  | `timestamp_ns` |
/// | 8  | `saddr` |
/// | 12 | `daddr` |
/// | 16 | `sport` |
/// | 18 | `dport` |
/// | 20 | `proto` |
/// | 24 | `pkt_size` |
/// | 28 | `payload_len` |
/// | 32 | `payload` |
#[repr(C)]
#[derive(Clone, Copy)]
pub struct PacketEvent {
    /// Nanoseconds since boot (from `bpf_ktime_get_boot_ns()`)
    ///
    /// Monotonic and boot-relative, not wall-clock time. Userspace adds a
    /// clock offset computed once at startup.
    pub timestamp_ns: u64,

    /// IPv4 source address, header bytes stored as-is in a host `u32`
    ///
    /// On little-endian hosts the first octet lands in the least significant byte.
    pub saddr: u32,

    /// IPv4 destination address, same encoding as `saddr`
    pub daddr: u32,

    /// Source port in network byte order (ICMP: echo identifier)
    pub sport: u16,

    /// Destination port in network byte order (ICMP: echo sequence)
    pub dport: u16,

    /// IANA protocol number from the IPv4 header
    pub proto: u8,

    /// Padding for 4-byte alignment
    #[allow(clippy::pub_underscore_fields)]
    pub _padding: [u8; 3],

    /// Total packet length seen by XDP (`data_end - data`)
    pub pkt_size: u32,

    /// Number of valid bytes in `payload` (0 when capture is disabled)
    pub payload_len: u32,

    /// Leading bytes of the L4 payload
    pub payload: [u8; PAYLOAD_CAPACITY],
}

impl PacketEvent {
    /// Size of the record in bytes
    pub const SIZE: usize = core::mem::size_of::<PacketEvent>();

    pub const OFFSET_TIMESTAMP: usize = 0;
    pub const OFFSET_SADDR: usize = 8;
    pub const OFFSET_DADDR: usize = 12;
    pub const OFFSET_SPORT: usize = 16;
    pub const OFFSET_DPORT: usize = 18;
    pub const OFFSET_PROTO: usize = 20;
    pub const OFFSET_PKT_SIZE: usize = 24;
    pub const OFFSET_PAYLOAD_LEN: usize = 28;
    pub const OFFSET_PAYLOAD: usize = 32;

    /// An all-zero record
    #[must_use]
    pub const fn zeroed() -> Self {
        Self {
            timestamp_ns: 0,
            saddr: 0,
            daddr: 0,
            sport: 0,
            dport: 0,
            proto: 0,
            _padding: [0; 3],
            pkt_size: 0,
            payload_len: 0,
            payload: [0; PAYLOAD_CAPACITY],
        }
    }
}

// Compile-time layout checks: the userspace decoder reads fields by offset.
const _: () = assert!(PacketEvent::SIZE == 160);
const _: () = assert!(core::mem::offset_of!(PacketEvent, saddr) == PacketEvent::OFFSET_SADDR);
const _: () = assert!(core::mem::offset_of!(PacketEvent, daddr) == PacketEvent::OFFSET_DADDR);
const _: () = assert!(core::mem::offset_of!(PacketEvent, sport) == PacketEvent::OFFSET_SPORT);
const _: () = assert!(core::mem::offset_of!(PacketEvent, dport) == PacketEvent::OFFSET_DPORT);
const _: () = assert!(core::mem::offset_of!(PacketEvent, proto) == PacketEvent::OFFSET_PROTO);
const _: () = assert!(core::mem::offset_of!(PacketEvent, pkt_size) == PacketEvent::OFFSET_PKT_SIZE);
const _: () =
    assert!(core::mem::offset_of!(PacketEvent, payload_len) == PacketEvent::OFFSET_PAYLOAD_LEN);
const _: () = assert!(core::mem::offset_of!(PacketEvent, payload) == PacketEvent::OFFSET_PAYLOAD);

#[cfg(feature = "user")]
use aya::Pod;

// Pod lets userspace read/write the record through aya maps as plain bytes
#[cfg(feature = "user")]
#[allow(unsafe_code)]
unsafe impl Pod for PacketEvent {}
