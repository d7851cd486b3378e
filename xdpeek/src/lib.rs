//! # xdpeek - Live XDP Packet Tracer
//!
//! xdpeek attaches a small XDP program to a network interface and prints one
//! line per IPv4 packet that arrives on it, until interrupted. The program only
//! observes: every packet is passed on to the normal network stack.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │              XDP program (kernel, xdpeek-ebpf)           │
//! │  Ethernet → IPv4 → TCP/UDP/ICMP, optional payload copy   │
//! └──────────────────────┬───────────────────────────────────┘
//!                        │ "events" ring buffer (PacketEvent)
//!                        ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                  xdpeek (this crate)                     │
//! │                                                          │
//! │  RingBufSource ──▶ EventDecoder ──▶ format_event ──▶ stdout
//! │                        ▲                                 │
//! │                   ClockOffset                            │
//! │                                                          │
//! │  HookLifecycle: clear stale → attach → … → detach once   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`tracer`]: the pipeline
//!   - `clock`: boot-relative to wall-clock offset, computed once at startup
//!   - `decoder` / `formatter`: raw record → [`tracer::DecodedEvent`] → trace line
//!   - `hook` / `xdp_hook`: attaching and detaching the XDP program
//!   - `event_loop` / `session`: streaming records until shutdown
//!   - `layout` / `object`: finding the compiled object and checking its record layout
//! - [`preflight`]: root, kernel version and interface checks
//! - [`cli`]: command-line arguments
//! - [`domain`]: protocol names and error types
//!
//! ## Typical Usage
//!
//! ```bash
//! cargo xtask build-ebpf --release
//! sudo ./target/release/xdpeek --iface eth0 --payload
//! ```

pub mod cli;
pub mod domain;
pub mod preflight;
pub mod tracer;
