//! # eBPF Kernel-Side Packet Inspection
//!
//! XDP program that runs at the earliest receive hook of an interface and
//! publishes per-packet metadata to userspace.
//!
//! ## Programs
//!
//! - **XDP**: `trace_packet` - Parse Ethernet/IPv4 and TCP/UDP/ICMP headers
//!
//! ## Maps (Shared with Userspace)
//!
//! - `events` - Ring buffer (256KB) of `PacketEvent` records
//! - `CONFIG` - Runtime configuration (payload capture toggle)
//! - `DROPPED_EVENTS` - Records lost because the ring buffer was full
//!
//! ## Build
//!
//! Always compiled in release mode:
//! ```bash
//! cargo xtask build-ebpf --release
//! ```

#![no_std]
#![no_main]
#![allow(unused_unsafe)]

use aya_ebpf::{
    bindings::xdp_action,
    helpers::bpf_ktime_get_boot_ns,
    macros::{map, xdp},
    maps::{HashMap, PerCpuArray, RingBuf},
    programs::XdpContext,
};
use aya_log_ebpf::warn;
use core::mem;
use network_types::{
    eth::{EthHdr, EtherType},
    ip::{IpProto, Ipv4Hdr},
    tcp::TcpHdr,
    udp::UdpHdr,
};
use xdpeek_common::{
    PacketEvent, CONFIG_CAPTURE_PAYLOAD, DROPPED_EVENTS_KEY, PAYLOAD_CAPACITY,
};

// ============================================================================
// Layout Marker
// ============================================================================

/// Record size compiled into this object, read by userspace before loading
#[no_mangle]
#[used]
static XDPEEK_EVENT_SIZE: u32 = PacketEvent::SIZE as u32;

// ============================================================================
// eBPF Maps
// ============================================================================

/// Ring buffer for sending packet records to userspace
///
/// Bounded and lossy: when full, `reserve` fails and the record is counted in
/// `DROPPED_EVENTS` instead of blocking the packet path.
#[map(name = "events")]
static EVENTS: RingBuf = RingBuf::with_byte_size(256 * 1024, 0);

/// Map: Config key → Config value
///
/// - **Key 0**: capture payload bytes (1) or not (0)
#[map]
static CONFIG: HashMap<u32, u64> = HashMap::with_max_entries(16, 0);

/// Number of records dropped because the ring buffer had no room
///
/// One slot per CPU: drops on different RX queues never race. Userspace sums them.
#[map]
static DROPPED_EVENTS: PerCpuArray<u64> = PerCpuArray::with_max_entries(1, 0);

/// ICMP echo header prefix (type, code, checksum, identifier, sequence)
#[repr(C)]
struct IcmpEcho {
    kind: u8,
    code: u8,
    checksum: [u8; 2],
    id: [u8; 2],
    sequence: [u8; 2],
}

const UDP_HDR_LEN: usize = 8;

// ============================================================================
// XDP Program
// ============================================================================

#[xdp]
pub fn trace_packet(ctx: XdpContext) -> u32 {
    match try_trace_packet(&ctx) {
        Ok(()) | Err(()) => xdp_action::XDP_PASS,
    }
}

fn try_trace_packet(ctx: &XdpContext) -> Result<(), ()> {
    let eth: *const EthHdr = ptr_at(ctx, 0)?;
    if unsafe { (*eth).ether_type } != EtherType::Ipv4 as u16 {
        return Ok(());
    }

    let ip: *const Ipv4Hdr = ptr_at(ctx, EthHdr::LEN)?;
    let proto = unsafe { (*ip).proto };
    let ip_len = unsafe { (*ip).ihl() } as usize * 4;
    let l4_offset = EthHdr::LEN + ip_len;

    let Some(mut entry) = EVENTS.reserve::<PacketEvent>(0) else {
        count_dropped();
        warn!(ctx, "events ring buffer full, record dropped");
        return Ok(());
    };

    let mut event = PacketEvent::zeroed();
    event.timestamp_ns = unsafe { bpf_ktime_get_boot_ns() };
    // Raw header bytes: the first octet ends up in the low byte on little-endian
    event.saddr = u32::from_ne_bytes(unsafe { (*ip).src_addr });
    event.daddr = u32::from_ne_bytes(unsafe { (*ip).dst_addr });
    event.proto = proto as u8;
    event.pkt_size = (ctx.data_end() - ctx.data()) as u32;

    let mut payload_offset = 0usize;
    match proto {
        IpProto::Tcp => {
            if let Ok(tcp) = ptr_at::<TcpHdr>(ctx, l4_offset) {
                event.sport = u16::from_ne_bytes(unsafe { (*tcp).source });
                event.dport = u16::from_ne_bytes(unsafe { (*tcp).dest });
                payload_offset = l4_offset + unsafe { (*tcp).doff() } as usize * 4;
            }
        }
        IpProto::Udp => {
            if let Ok(udp) = ptr_at::<UdpHdr>(ctx, l4_offset) {
                event.sport = u16::from_ne_bytes(unsafe { (*udp).src });
                event.dport = u16::from_ne_bytes(unsafe { (*udp).dst });
                payload_offset = l4_offset + UDP_HDR_LEN;
            }
        }
        IpProto::Icmp => {
            if let Ok(icmp) = ptr_at::<IcmpEcho>(ctx, l4_offset) {
                event.sport = u16::from_ne_bytes(unsafe { (*icmp).id });
                event.dport = u16::from_ne_bytes(unsafe { (*icmp).sequence });
            }
        }
        _ => {}
    }

    if payload_offset > 0 && capture_payload() {
        event.payload_len = copy_payload(ctx, payload_offset, &mut event.payload);
    }

    entry.write(event);
    entry.submit(0);
    Ok(())
}

fn capture_payload() -> bool {
    unsafe { CONFIG.get(&CONFIG_CAPTURE_PAYLOAD).copied().unwrap_or(0) == 1 }
}

fn count_dropped() {
    if let Some(count) = DROPPED_EVENTS.get_ptr_mut(DROPPED_EVENTS_KEY) {
        unsafe { *count += 1 };
    }
}

/// Copy up to `PAYLOAD_CAPACITY` bytes starting at `offset`, stopping at `data_end`
#[inline(always)]
fn copy_payload(ctx: &XdpContext, offset: usize, payload: &mut [u8; PAYLOAD_CAPACITY]) -> u32 {
    let start = ctx.data();
    let end = ctx.data_end();
    let mut copied = 0u32;

    for (i, slot) in payload.iter_mut().enumerate() {
        let addr = start + offset + i;
        if addr + 1 > end {
            break;
        }
        *slot = unsafe { *(addr as *const u8) };
        copied += 1;
    }

    copied
}

/// Bounds-checked pointer into packet data
#[inline(always)]
fn ptr_at<T>(ctx: &XdpContext, offset: usize) -> Result<*const T, ()> {
    let start = ctx.data();
    let end = ctx.data_end();
    let len = mem::size_of::<T>();

    if start + offset + len > end {
        return Err(());
    }

    Ok((start + offset) as *const T)
}

#[cfg(all(not(test), target_os = "none"))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    unsafe { core::hint::unreachable_unchecked() }
}
