//! One tracing session: attach, stream, detach
//!
//! Ties the hook lifecycle to the event loop. Whatever way the loop ends
//! (interrupt, source failure, output failure) the shutdown notice is printed
//! and the program is detached before the result is returned.

use std::io::Write;

use log::info;

use super::decoder::EventDecoder;
use super::event_loop::{run_event_loop, LoopStats};
use super::hook::{AttachMode, HookLifecycle, PacketHook};
use super::shutdown::ShutdownSignal;
use super::source::RecordSource;
use crate::domain::TracerError;

/// Session settings
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    pub mode: AttachMode,
    /// Suppress the startup banner
    pub quiet: bool,
}

/// Attach the hook, run the event loop until shutdown, then detach
///
/// # Errors
/// Returns an error if attaching fails, the loop fails, or detaching fails.
/// A loop error takes precedence over a detach error.
pub async fn run_session<H, S, W>(
    lifecycle: &mut HookLifecycle<H>,
    options: SessionOptions,
    source: &mut S,
    decoder: &EventDecoder,
    out: &mut W,
    shutdown: &mut ShutdownSignal,
) -> Result<LoopStats, TracerError>
where
    H: PacketHook,
    S: RecordSource,
    W: Write,
{
    lifecycle.prepare();
    let attachment = lifecycle.attach(options.mode)?;
    let iface = attachment.iface().to_string();

    if !options.quiet {
        writeln!(out, "Starting packet tracing on {iface}... Press Ctrl-C to end.\n")?;
    }

    let result = run_event_loop(source, decoder, out, shutdown).await;

    // Best effort: the detach below must run even if stdout is gone
    let _ = writeln!(out, "\nRemoving filter from interface {iface}");
    let _ = out.flush();
    let detached = attachment.detach();

    let stats = result?;
    detached?;
    info!("session on {iface} ended after {} records", stats.records);
    Ok(stats)
}
