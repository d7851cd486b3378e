//! Pre-flight checks for xdpeek
//!
//! Validates system requirements before the eBPF object is loaded, so the
//! common failures (not root, old kernel, typo in the interface name) come
//! back as one clear message instead of a verifier or netlink error.

#![allow(unsafe_code)] // geteuid(), if_nametoindex() and setrlimit() require unsafe

use std::ffi::CString;

use log::{debug, warn};

use crate::domain::TracerError;

/// Ring buffer maps and `bpf_ktime_get_boot_ns` both arrived in 5.8
const MIN_KERNEL_VERSION: (u32, u32) = (5, 8);

/// Run all pre-flight checks before eBPF loading
///
/// # Errors
/// Returns the first requirement that isn't met
pub fn run_preflight_checks(iface: &str) -> Result<(), TracerError> {
    check_privileges()?;
    check_kernel_version()?;
    check_interface_exists(iface)?;
    raise_memlock_rlimit();
    Ok(())
}

/// Check if running with sufficient privileges to load and attach XDP programs
///
/// # Errors
/// Returns [`TracerError::PermissionDenied`] when the effective uid isn't 0
pub fn check_privileges() -> Result<(), TracerError> {
    if unsafe { libc::geteuid() } == 0 {
        return Ok(());
    }

    // CAP_BPF + CAP_NET_ADMIN would also do, but checking them needs more
    // than libc; require root like the kernel docs do.
    Err(TracerError::PermissionDenied(
        "xdpeek requires root privileges to load and attach XDP programs.\n\n\
         Run with: sudo xdpeek ..."
            .to_string(),
    ))
}

/// Check if the kernel version is sufficient for the ring buffer
///
/// # Errors
/// Returns [`TracerError::KernelTooOld`] when the running kernel predates 5.8
pub fn check_kernel_version() -> Result<(), TracerError> {
    let release = std::fs::read_to_string("/proc/sys/kernel/osrelease")?;
    let release = release.trim();

    let Some(version) = parse_kernel_release(release) else {
        // Can't parse, assume it's fine
        debug!("unrecognised kernel release {release:?}, skipping version check");
        return Ok(());
    };

    if version < MIN_KERNEL_VERSION {
        return Err(TracerError::KernelTooOld {
            found: release.to_string(),
            required: format!("{}.{}", MIN_KERNEL_VERSION.0, MIN_KERNEL_VERSION.1),
        });
    }
    Ok(())
}

/// Parse `major.minor` from a release string like `6.1.0-arch1-1`
#[must_use]
pub fn parse_kernel_release(release: &str) -> Option<(u32, u32)> {
    let mut parts = release.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor: String = parts.next()?.chars().take_while(char::is_ascii_digit).collect();
    Some((major, minor.parse().ok()?))
}

/// Check that the network interface exists
///
/// # Errors
/// Returns [`TracerError::InterfaceNotFound`] if the kernel has no such interface
pub fn check_interface_exists(iface: &str) -> Result<(), TracerError> {
    let name = CString::new(iface).map_err(|_| TracerError::InterfaceNotFound(iface.to_string()))?;
    if unsafe { libc::if_nametoindex(name.as_ptr()) } == 0 {
        return Err(TracerError::InterfaceNotFound(iface.to_string()));
    }
    Ok(())
}

/// Lift the memlock limit for map allocation
///
/// Kernels from 5.11 account eBPF memory to the cgroup instead, so a failure
/// here is only worth a warning.
pub fn raise_memlock_rlimit() {
    let rlimit = libc::rlimit { rlim_cur: libc::RLIM_INFINITY, rlim_max: libc::RLIM_INFINITY };
    if unsafe { libc::setrlimit(libc::RLIMIT_MEMLOCK, &rlimit) } != 0 {
        warn!("Failed to remove limit on locked memory: {}", std::io::Error::last_os_error());
    }
}
