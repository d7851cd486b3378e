//! Locating and reading the compiled XDP object
//!
//! The object is built separately (`cargo xtask build-ebpf --release`) and read
//! at runtime. Without `--object`, the release and then debug outputs under
//! `target/bpfel-unknown-none/` are tried.

use std::path::{Path, PathBuf};

use log::info;

use crate::domain::TracerError;

/// Build outputs searched when no explicit path is given, in order
pub const DEFAULT_OBJECT_PATHS: [&str; 2] = [
    "target/bpfel-unknown-none/release/xdpeek",
    "target/bpfel-unknown-none/debug/xdpeek",
];

/// Pick the object file to load
///
/// # Errors
/// Returns [`TracerError::ObjectNotFound`] naming the explicit path, or the
/// first default path if none of them exist
pub fn resolve_object_path(explicit: Option<&Path>) -> Result<PathBuf, TracerError> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(TracerError::ObjectNotFound { path: path.to_path_buf() });
    }

    DEFAULT_OBJECT_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
        .ok_or_else(|| TracerError::ObjectNotFound { path: PathBuf::from(DEFAULT_OBJECT_PATHS[0]) })
}

/// Read the object file into memory
///
/// # Errors
/// Returns [`TracerError::ObjectUnreadable`] with the path and I/O cause
pub fn read_object(path: &Path) -> Result<Vec<u8>, TracerError> {
    let bytes = std::fs::read(path)
        .map_err(|source| TracerError::ObjectUnreadable { path: path.to_path_buf(), source })?;
    info!("Loaded eBPF object {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}
