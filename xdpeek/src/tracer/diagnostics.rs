//! Kernel-side loss accounting
//!
//! The ring buffer between the XDP program and userspace is bounded. When it is
//! full the producer cannot reserve a record, drops it, and bumps its CPU's slot
//! of the `DROPPED_EVENTS` per-CPU array. The tracer sums the slots at shutdown
//! and reports the total, so loss under overload is visible rather than silent.

use aya::maps::{MapData, MapError, PerCpuArray};
use xdpeek_common::DROPPED_EVENTS_KEY;

use super::event_loop::LoopStats;

/// Handle on the `DROPPED_EVENTS` map
pub struct DropCounter {
    map: PerCpuArray<MapData, u64>,
}

impl DropCounter {
    #[must_use]
    pub fn new(map: PerCpuArray<MapData, u64>) -> Self {
        Self { map }
    }

    /// Records the producer had to drop so far, across all CPUs
    ///
    /// # Errors
    /// Returns an error if the per-CPU lookup fails
    pub fn dropped(&self) -> Result<u64, MapError> {
        let values = self.map.get(&DROPPED_EVENTS_KEY, 0)?;
        Ok(sum_per_cpu(&values))
    }
}

/// Total of one per-CPU counter
#[must_use]
pub fn sum_per_cpu(values: &[u64]) -> u64 {
    values.iter().fold(0, |total, &n| total.saturating_add(n))
}

/// One-line end-of-run summary
#[must_use]
pub fn format_summary(stats: &LoopStats, dropped: Option<u64>) -> String {
    let mut line = format!("{} packets traced", stats.records);
    if stats.decode_errors > 0 {
        line.push_str(&format!(", {} malformed records skipped", stats.decode_errors));
    }
    match dropped {
        Some(0) => line.push_str(", no events dropped"),
        Some(n) => line.push_str(&format!(", {n} events dropped by the kernel ring buffer")),
        None => line.push_str(", drop count unavailable"),
    }
    line
}
