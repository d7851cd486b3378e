//! # eBPF Program Loading and XDP Attachment
//!
//! Loads the compiled `trace_packet` object with aya and implements
//! [`PacketHook`] over it.
//!
//! ## Functions
//!
//! - [`XdpHook::load()`] - Load the object and start forwarding eBPF logs
//! - [`XdpHook::configure()`] - Write runtime settings into the `CONFIG` map
//! - [`XdpHook::take_ring_buf()`] - Take the `events` ring buffer for the event loop
//! - [`XdpHook::take_drop_counter()`] - Take the `DROPPED_EVENTS` counter
//!
//! Stale programs left by an earlier run are removed with
//! `ip link set dev <iface> xdp off`, which succeeds whether or not anything
//! is attached.

use std::process::Command;

use aya::{
    maps::{HashMap, MapData, PerCpuArray, RingBuf},
    programs::{xdp::XdpLinkId, ProgramError, Xdp, XdpFlags},
    Ebpf,
};
use aya_log::EbpfLogger;
use log::{debug, info, warn};
use xdpeek_common::{CONFIG_CAPTURE_PAYLOAD, EVENTS_MAP, PROGRAM_NAME};

use super::diagnostics::DropCounter;
use super::hook::{AttachMode, PacketHook};
use crate::domain::TracerError;

impl AttachMode {
    #[must_use]
    pub fn flags(self) -> XdpFlags {
        match self {
            Self::Generic => XdpFlags::SKB_MODE,
            Self::Driver => XdpFlags::DRV_MODE,
            Self::Hardware => XdpFlags::HW_MODE,
        }
    }
}

/// XDP hook backed by an aya-loaded eBPF object
pub struct XdpHook {
    bpf: Ebpf,
    link: Option<XdpLinkId>,
}

impl XdpHook {
    /// Load the eBPF object bytes
    ///
    /// # Errors
    /// Returns an error if the kernel rejects the object (maps, BTF, relocation)
    pub fn load(object_bytes: &[u8]) -> Result<Self, TracerError> {
        let mut bpf = Ebpf::load(object_bytes)?;
        if let Err(e) = EbpfLogger::init(&mut bpf) {
            // The program doesn't have to log anything
            warn!("Failed to initialize eBPF logger: {e}");
        }
        Ok(Self { bpf, link: None })
    }

    /// Write runtime configuration into the `CONFIG` map
    ///
    /// # Errors
    /// Returns an error if the map is missing or the update fails
    pub fn configure(&mut self, capture_payload: bool) -> Result<(), TracerError> {
        let mut config: HashMap<_, u32, u64> =
            HashMap::try_from(self.bpf.map_mut("CONFIG").ok_or(TracerError::MapNotFound("CONFIG"))?)?;
        config.insert(CONFIG_CAPTURE_PAYLOAD, u64::from(capture_payload), 0)?;
        info!("✓ Payload capture: {}", if capture_payload { "on" } else { "off" });
        Ok(())
    }

    /// Take ownership of the `events` ring buffer
    ///
    /// # Errors
    /// Returns an error if the map is missing or isn't a ring buffer
    pub fn take_ring_buf(&mut self) -> Result<RingBuf<MapData>, TracerError> {
        let map = self.bpf.take_map(EVENTS_MAP).ok_or(TracerError::MapNotFound(EVENTS_MAP))?;
        Ok(RingBuf::try_from(map)?)
    }

    /// Take ownership of the kernel-side drop counter
    ///
    /// # Errors
    /// Returns an error if the map is missing or has the wrong type
    pub fn take_drop_counter(&mut self) -> Result<DropCounter, TracerError> {
        let map =
            self.bpf.take_map("DROPPED_EVENTS").ok_or(TracerError::MapNotFound("DROPPED_EVENTS"))?;
        Ok(DropCounter::new(PerCpuArray::try_from(map)?))
    }

    fn program(&mut self) -> Result<&mut Xdp, TracerError> {
        let program: &mut Xdp = self
            .bpf
            .program_mut(PROGRAM_NAME)
            .ok_or(TracerError::ProgramNotFound(PROGRAM_NAME))?
            .try_into()?;
        Ok(program)
    }
}

impl PacketHook for XdpHook {
    fn clear(&mut self, iface: &str) -> Result<(), TracerError> {
        match Command::new("ip").args(["link", "set", "dev", iface, "xdp", "off"]).output() {
            Ok(output) if output.status.success() => {
                debug!("ip link set dev {iface} xdp off: ok");
            }
            Ok(output) => {
                debug!(
                    "ip link set dev {iface} xdp off: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            Err(e) => {
                warn!("Could not run `ip` to clear stale XDP programs: {e}");
            }
        }
        Ok(())
    }

    fn attach(&mut self, iface: &str, mode: AttachMode) -> Result<(), TracerError> {
        let program = self.program()?;
        match program.load() {
            Ok(()) | Err(ProgramError::AlreadyLoaded) => {}
            Err(e) => return Err(e.into()),
        }

        let link = program.attach(iface, mode.flags()).map_err(|e| TracerError::AttachFailed {
            iface: iface.to_string(),
            error: e.to_string(),
        })?;
        self.link = Some(link);
        Ok(())
    }

    fn detach(&mut self, iface: &str) -> Result<(), TracerError> {
        let Some(link) = self.link.take() else {
            return Ok(());
        };
        self.program()?.detach(link).map_err(|e| TracerError::DetachFailed {
            iface: iface.to_string(),
            error: e.to_string(),
        })
    }
}
