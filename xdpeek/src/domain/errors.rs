//! Structured error types for xdpeek
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration and lifecycle errors
///
/// None of these are retried: each means the environment cannot run the tracer.
#[derive(Error, Debug)]
pub enum TracerError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Kernel {found} is too old, Linux {required} or newer is required")]
    KernelTooOld { found: String, required: String },

    #[error("Network interface {0} not found")]
    InterfaceNotFound(String),

    #[error("eBPF object not found: {}", .path.display())]
    ObjectNotFound { path: PathBuf },

    #[error("Failed to read eBPF object {}: {source}", .path.display())]
    ObjectUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("eBPF object is not a valid ELF file: {0}")]
    ObjectInvalid(String),

    #[error("eBPF object does not export the {0} layout marker")]
    LayoutMarkerMissing(&'static str),

    #[error("Packet record layout mismatch: tracer expects {expected} bytes, program emits {found}")]
    LayoutMismatch { expected: usize, found: usize },

    #[error("Program {0} not found in eBPF object")]
    ProgramNotFound(&'static str),

    #[error("Map {0} not found in eBPF object")]
    MapNotFound(&'static str),

    #[error("Failed to attach XDP program to {iface}: {error}")]
    AttachFailed { iface: String, error: String },

    #[error("Failed to detach XDP program from {iface}: {error}")]
    DetachFailed { iface: String, error: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Aya(#[from] aya::EbpfError),

    #[error(transparent)]
    Program(#[from] aya::programs::ProgramError),

    #[error(transparent)]
    Map(#[from] aya::maps::MapError),
}

/// Per-record decode failures (the loop logs and moves on)
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Truncated packet record: got {len} bytes, expected {expected}")]
    Truncated { len: usize, expected: usize },
}
