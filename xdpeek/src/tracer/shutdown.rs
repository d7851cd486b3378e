//! Shutdown signalling for the event loop
//!
//! [`shutdown_channel`] returns a trigger and a signal. `main` fires the trigger
//! when [`InterruptListener`] sees SIGINT/SIGTERM; the event loop observes the
//! signal both while waiting for records and between records of a batch.

use std::io;

use log::info;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::watch;

/// Create a linked trigger/signal pair
#[must_use]
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, ShutdownSignal { rx })
}

/// Requests shutdown
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Observes shutdown requests; cheap to clone
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Whether shutdown has been requested
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested
    ///
    /// Never resolves if the trigger is dropped without firing.
    pub async fn triggered(&mut self) {
        if self.rx.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// SIGINT/SIGTERM handlers, registered as soon as this is constructed
///
/// Build it before attaching so a signal arriving during setup is queued
/// instead of killing the process before teardown can run.
#[derive(Debug)]
pub struct InterruptListener {
    interrupt: Signal,
    terminate: Signal,
}

impl InterruptListener {
    /// Register the handlers
    ///
    /// # Errors
    /// Returns an error if a handler can't be installed
    pub fn install() -> io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for Ctrl-C or SIGTERM, including one delivered before this was polled
    pub async fn wait(mut self) {
        tokio::select! {
            _ = self.interrupt.recv() => info!("received SIGINT"),
            _ = self.terminate.recv() => info!("received SIGTERM"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_signal_initially_clear() {
        let (_trigger, signal) = shutdown_channel();
        assert!(!signal.is_triggered());
    }

    #[test]
    fn test_trigger_visible_to_clones() {
        let (trigger, signal) = shutdown_channel();
        let other = signal.clone();
        trigger.trigger();
        assert!(signal.is_triggered());
        assert!(other.is_triggered());
    }

    #[tokio::test]
    async fn test_triggered_resolves() {
        let (trigger, mut signal) = shutdown_channel();
        let waiter = tokio::spawn(async move { signal.triggered().await });
        trigger.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_triggered_after_the_fact() {
        let (trigger, mut signal) = shutdown_channel();
        trigger.trigger();
        tokio::time::timeout(Duration::from_secs(1), signal.triggered()).await.unwrap();
    }

    #[tokio::test]
    #[allow(unsafe_code)]
    async fn test_signal_before_wait_is_not_lost() {
        let listener = InterruptListener::install().unwrap();
        // Delivered while nothing is polling the listener yet
        assert_eq!(unsafe { libc::raise(libc::SIGTERM) }, 0);
        tokio::time::timeout(Duration::from_secs(1), listener.wait()).await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_trigger_never_fires() {
        let (trigger, mut signal) = shutdown_channel();
        drop(trigger);
        let result = tokio::time::timeout(Duration::from_millis(50), signal.triggered()).await;
        assert!(result.is_err());
    }
}
