//! # xdpeek - Main Entry Point
//!
//! Startup order:
//! 1. Pre-flight checks (root, kernel, interface)
//! 2. Locate and read the eBPF object, verify its record layout
//! 3. Compute the boot → wall clock offset
//! 4. Load the object, write `CONFIG`, take the ring buffer and drop counter
//! 5. Clear stale programs, attach, stream until Ctrl-C/SIGTERM, detach

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::Stylize;
use log::{info, warn};

use xdpeek::cli::Args;
use xdpeek::domain::TracerError;
use xdpeek::preflight::run_preflight_checks;
use xdpeek::tracer::{
    format_summary, read_object, resolve_object_path, run_session, shutdown_channel,
    verify_object_layout, ClockOffset, EventDecoder, HookLifecycle, InterruptListener,
    RingBufSource, SessionOptions, SystemClock, XdpHook,
};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_NOPERM: i32 = 77;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("{} {e:#}", "error:".red().bold());
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<TracerError>() {
        Some(TracerError::PermissionDenied(_)) => EXIT_NOPERM,
        Some(TracerError::InterfaceNotFound(_)) => EXIT_USAGE,
        _ => EXIT_ERROR,
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    let args = Args::parse();
    let quiet = args.quiet;

    run_preflight_checks(&args.iface)?;

    let object_path = resolve_object_path(args.object.as_deref())?;
    let object_bytes = read_object(&object_path)?;
    verify_object_layout(&object_bytes)?;

    let offset = ClockOffset::compute(&SystemClock);
    info!("Clock offset (wall - boot): {offset}");

    let mut hook = XdpHook::load(&object_bytes)?;
    hook.configure(args.payload)?;
    let mut source =
        RingBufSource::new(hook.take_ring_buf()?).context("Failed to poll the events ring buffer")?;
    let drop_counter = hook.take_drop_counter()?;
    let decoder = EventDecoder::new(offset, args.payload);

    let interrupts = InterruptListener::install().context("Failed to install signal handlers")?;
    let (trigger, mut shutdown) = shutdown_channel();
    tokio::spawn(async move {
        interrupts.wait().await;
        trigger.trigger();
    });

    let mut lifecycle = HookLifecycle::new(hook, args.iface);
    let options = SessionOptions { quiet, ..SessionOptions::default() };
    let stats = {
        let mut stdout = io::stdout().lock();
        run_session(&mut lifecycle, options, &mut source, &decoder, &mut stdout, &mut shutdown)
            .await?
    };

    let dropped = match drop_counter.dropped() {
        Ok(n) => Some(n),
        Err(e) => {
            warn!("Failed to read DROPPED_EVENTS: {e}");
            None
        }
    };
    if !quiet {
        println!("{}", format_summary(&stats, dropped));
    }

    Ok(())
}
