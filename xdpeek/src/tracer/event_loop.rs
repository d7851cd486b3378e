//! # Event Loop
//!
//! Drains raw records from a [`RecordSource`], decodes and prints each one, and
//! stops when shutdown is requested.
//!
//! ## Ordering and Cancellation
//!
//! - Records are printed in the order the source delivers them.
//! - Shutdown is checked before every wait and before every record, so nothing
//!   is printed once the signal has been observed.
//! - A record that is already being decoded finishes; decoding never awaits.
//!
//! The loop keeps no queue of its own. The kernel ring buffer bounds how many
//! records can wait, and what it cannot hold is counted by the producer.

use std::io::{self, Write};
use std::ops::ControlFlow;

use log::{debug, warn};

use super::decoder::EventDecoder;
use super::formatter::format_event;
use super::shutdown::ShutdownSignal;
use super::source::RecordSource;

/// Counters for one run of the loop
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    /// Records decoded and printed
    pub records: u64,
    /// Records skipped because they were malformed
    pub decode_errors: u64,
}

/// Run until `shutdown` fires or the source fails
///
/// # Errors
/// Returns an error if the source fails or writing to `out` fails
pub async fn run_event_loop<S, W>(
    source: &mut S,
    decoder: &EventDecoder,
    out: &mut W,
    shutdown: &mut ShutdownSignal,
) -> io::Result<LoopStats>
where
    S: RecordSource,
    W: Write,
{
    let mut stats = LoopStats::default();
    let mut write_error: Option<io::Error> = None;
    let stop = shutdown.clone();

    while !stop.is_triggered() {
        let mut sink = |raw: &[u8]| {
            if stop.is_triggered() {
                return ControlFlow::Break(());
            }

            match decoder.decode(raw) {
                Ok(event) => {
                    if let Err(e) = writeln!(out, "{}", format_event(&event)) {
                        write_error = Some(e);
                        return ControlFlow::Break(());
                    }
                    stats.records += 1;
                }
                Err(e) => {
                    warn!("{e}");
                    stats.decode_errors += 1;
                }
            }
            ControlFlow::Continue(())
        };

        tokio::select! {
            biased;
            () = shutdown.triggered() => break,
            drained = source.drain(&mut sink) => {
                let count = drained?;
                debug!("drained {count} records");
            }
        }

        if let Some(e) = write_error.take() {
            return Err(e);
        }
    }

    out.flush()?;
    Ok(stats)
}
