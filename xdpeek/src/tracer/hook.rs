//! # Hook Lifecycle
//!
//! Owns the attachment of the packet-inspection program to one interface.
//!
//! ```text
//! DETACHED ──attach()──▶ ATTACHED ──detach()/drop──▶ DETACHED
//! ```
//!
//! [`HookLifecycle::attach`] hands out an [`Attachment`] guard. Calling
//! [`Attachment::detach`] performs the teardown explicitly; if the guard is
//! dropped instead (early return, `?`, panic unwinding) the program is detached
//! from `Drop`. Either way detach runs once.

use log::{debug, info, warn};

use crate::domain::TracerError;

/// Processing context the program runs in on the interface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AttachMode {
    /// Generic (SKB) mode: works on any driver, slower
    #[default]
    Generic,
    /// Native driver mode
    Driver,
    /// Offloaded to the NIC
    Hardware,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentState {
    Detached,
    Attached,
}

/// Control operations on an interface packet hook
pub trait PacketHook {
    /// Remove any program currently attached to `iface`
    ///
    /// Must succeed when nothing is attached.
    ///
    /// # Errors
    /// Implementations may report failures; [`HookLifecycle::prepare`] logs and ignores them
    fn clear(&mut self, iface: &str) -> Result<(), TracerError>;

    /// Load the program if needed and attach it to `iface`
    ///
    /// # Errors
    /// Returns an error if the program can't be resolved, loaded, or attached
    fn attach(&mut self, iface: &str, mode: AttachMode) -> Result<(), TracerError>;

    /// Remove the program attached by [`PacketHook::attach`]
    ///
    /// # Errors
    /// Returns an error if the kernel rejects the detach
    fn detach(&mut self, iface: &str) -> Result<(), TracerError>;
}

/// Sole owner of the hook and its binding to `iface`
pub struct HookLifecycle<H: PacketHook> {
    hook: H,
    iface: String,
    state: AttachmentState,
}

impl<H: PacketHook> HookLifecycle<H> {
    pub fn new(hook: H, iface: impl Into<String>) -> Self {
        Self { hook, iface: iface.into(), state: AttachmentState::Detached }
    }

    #[must_use]
    pub fn iface(&self) -> &str {
        &self.iface
    }

    #[must_use]
    pub fn state(&self) -> AttachmentState {
        self.state
    }

    #[must_use]
    pub fn hook(&self) -> &H {
        &self.hook
    }

    /// Clear whatever a previous run left on the interface
    ///
    /// Failures are logged and ignored so a clean interface behaves the same as
    /// one with a stale program.
    pub fn prepare(&mut self) {
        match self.hook.clear(&self.iface) {
            Ok(()) => debug!("cleared existing XDP program on {}", self.iface),
            Err(e) => warn!("could not clear existing XDP program on {}: {e}", self.iface),
        }
    }

    /// Attach the program, returning a guard that detaches it
    ///
    /// # Errors
    /// Returns an error if the hook fails to attach; the state stays `Detached`
    pub fn attach(&mut self, mode: AttachMode) -> Result<Attachment<'_, H>, TracerError> {
        self.hook.attach(&self.iface, mode)?;
        self.state = AttachmentState::Attached;
        info!("✓ Attached XDP program to {} ({mode:?} mode)", self.iface);
        Ok(Attachment { lifecycle: self })
    }

    fn release(&mut self) -> Result<(), TracerError> {
        if self.state == AttachmentState::Detached {
            return Ok(());
        }
        // Marked detached first: a failed detach is not retried from Drop
        self.state = AttachmentState::Detached;
        self.hook.detach(&self.iface)?;
        info!("✓ Detached XDP program from {}", self.iface);
        Ok(())
    }
}

/// Live attachment; detaches on [`Attachment::detach`] or drop
pub struct Attachment<'a, H: PacketHook> {
    lifecycle: &'a mut HookLifecycle<H>,
}

impl<H: PacketHook> Attachment<'_, H> {
    #[must_use]
    pub fn iface(&self) -> &str {
        self.lifecycle.iface()
    }

    /// Detach now and report the outcome
    ///
    /// # Errors
    /// Returns an error if the hook fails to detach
    pub fn detach(self) -> Result<(), TracerError> {
        self.lifecycle.release()
    }
}

impl<H: PacketHook> Drop for Attachment<'_, H> {
    fn drop(&mut self) {
        if let Err(e) = self.lifecycle.release() {
            warn!("failed to detach XDP program from {}: {e}", self.lifecycle.iface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingHook {
        calls: Vec<&'static str>,
        fail_clear: bool,
        fail_attach: bool,
    }

    impl PacketHook for RecordingHook {
        fn clear(&mut self, _iface: &str) -> Result<(), TracerError> {
            self.calls.push("clear");
            if self.fail_clear {
                return Err(TracerError::DetachFailed {
                    iface: "eth0".to_string(),
                    error: "nothing attached".to_string(),
                });
            }
            Ok(())
        }

        fn attach(&mut self, iface: &str, _mode: AttachMode) -> Result<(), TracerError> {
            self.calls.push("attach");
            if self.fail_attach {
                return Err(TracerError::AttachFailed {
                    iface: iface.to_string(),
                    error: "rejected".to_string(),
                });
            }
            Ok(())
        }

        fn detach(&mut self, _iface: &str) -> Result<(), TracerError> {
            self.calls.push("detach");
            Ok(())
        }
    }

    #[test]
    fn test_explicit_detach_runs_once() {
        let mut lifecycle = HookLifecycle::new(RecordingHook::default(), "eth0");
        let attachment = lifecycle.attach(AttachMode::Generic).unwrap();
        attachment.detach().unwrap();

        assert_eq!(lifecycle.state(), AttachmentState::Detached);
        assert_eq!(lifecycle.hook().calls, ["attach", "detach"]);
    }

    #[test]
    fn test_drop_detaches() {
        let mut lifecycle = HookLifecycle::new(RecordingHook::default(), "eth0");
        {
            let _attachment = lifecycle.attach(AttachMode::Generic).unwrap();
        }
        assert_eq!(lifecycle.state(), AttachmentState::Detached);
        assert_eq!(lifecycle.hook().calls, ["attach", "detach"]);
    }

    #[test]
    fn test_failed_attach_stays_detached() {
        let hook = RecordingHook { fail_attach: true, ..Default::default() };
        let mut lifecycle = HookLifecycle::new(hook, "eth0");

        assert!(lifecycle.attach(AttachMode::Generic).is_err());
        assert_eq!(lifecycle.state(), AttachmentState::Detached);
        assert_eq!(lifecycle.hook().calls, ["attach"]);
    }

    #[test]
    fn test_prepare_tolerates_clear_failure() {
        let hook = RecordingHook { fail_clear: true, ..Default::default() };
        let mut lifecycle = HookLifecycle::new(hook, "eth0");

        lifecycle.prepare();
        let attachment = lifecycle.attach(AttachMode::Generic).unwrap();
        attachment.detach().unwrap();

        assert_eq!(lifecycle.hook().calls, ["clear", "attach", "detach"]);
    }

    #[test]
    fn test_prepare_on_clean_interface() {
        let mut lifecycle = HookLifecycle::new(RecordingHook::default(), "lo");
        lifecycle.prepare();
        lifecycle.prepare();
        assert_eq!(lifecycle.state(), AttachmentState::Detached);

        let attachment = lifecycle.attach(AttachMode::Generic).unwrap();
        assert_eq!(attachment.iface(), "lo");
    }

    #[test]
    fn test_default_mode_is_generic() {
        assert_eq!(AttachMode::default(), AttachMode::Generic);
    }
}
