//! # Clock Reconciliation
//!
//! Packet records carry `bpf_ktime_get_boot_ns()` timestamps: nanoseconds since
//! boot, monotonic, unaffected by wall-clock changes. To display them as local
//! time the tracer computes a single offset between that clock and the
//! wall clock at startup, then adds it to every record.
//!
//! The offset is computed once and passed by value into the decoder. Recomputing
//! it mid-run would shift later timestamps relative to earlier ones.

#![allow(unsafe_code)] // clock_gettime() requires unsafe

use std::fmt;

/// Source of the two clocks being reconciled
pub trait Clock {
    /// Nanoseconds since boot (`CLOCK_BOOTTIME`)
    fn boot_ns(&self) -> u64;

    /// Nanoseconds since the Unix epoch
    fn wall_ns(&self) -> u64;
}

/// Host clocks
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn boot_ns(&self) -> u64 {
        // CLOCK_BOOTTIME is the clock behind bpf_ktime_get_boot_ns()
        read_clock(libc::CLOCK_BOOTTIME)
    }

    fn wall_ns(&self) -> u64 {
        read_clock(libc::CLOCK_REALTIME)
    }
}

fn read_clock(id: libc::clockid_t) -> u64 {
    let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
    let rc = unsafe { libc::clock_gettime(id, &mut ts) };
    debug_assert_eq!(rc, 0, "clock_gettime({id}) failed");
    timespec_to_ns(&ts)
}

#[allow(clippy::cast_sign_loss)]
fn timespec_to_ns(ts: &libc::timespec) -> u64 {
    (ts.tv_sec.max(0) as u64)
        .saturating_mul(1_000_000_000)
        .saturating_add(ts.tv_nsec.max(0) as u64)
}

/// Clock with fixed readings, for tests and replay
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    boot_ns: u64,
    wall_ns: u64,
}

impl FixedClock {
    #[must_use]
    pub fn new(boot_ns: u64, wall_ns: u64) -> Self {
        Self { boot_ns, wall_ns }
    }
}

impl Clock for FixedClock {
    fn boot_ns(&self) -> u64 {
        self.boot_ns
    }

    fn wall_ns(&self) -> u64 {
        self.wall_ns
    }
}

/// Wall-clock time of boot, in nanoseconds since the Unix epoch
///
/// `absolute = offset + boot_relative`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockOffset(u64);

impl ClockOffset {
    /// Reconcile the boot and wall clocks of `clock`
    ///
    /// The wall clock is read between two boot-clock reads and paired with
    /// their midpoint, so the error is at most half the time between reads.
    pub fn compute(clock: &impl Clock) -> Self {
        let boot_before = clock.boot_ns();
        let wall = clock.wall_ns();
        let boot_after = clock.boot_ns();

        let boot_mid = boot_before + boot_after.saturating_sub(boot_before) / 2;
        Self(wall.saturating_sub(boot_mid))
    }

    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Convert a boot-relative timestamp to nanoseconds since the Unix epoch
    #[must_use]
    pub const fn to_absolute_ns(self, boot_relative_ns: u64) -> u64 {
        self.0.saturating_add(boot_relative_ns)
    }
}

impl fmt::Display for ClockOffset {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.0 as f64 / 1_000_000_000.0)
    }
}
