//! Startup check that the eBPF object emits the record layout this tracer decodes
//!
//! The producer exports `XDPEEK_EVENT_SIZE`, a `u32` holding
//! `size_of::<PacketEvent>()` as it was compiled. A stale object built against
//! an older `xdpeek-common` would misalign every field, so a mismatch is fatal
//! before anything is attached.

use object::{Object, ObjectSection, ObjectSymbol};
use xdpeek_common::{PacketEvent, EVENT_SIZE_SYMBOL};

use crate::domain::TracerError;

/// Verify the layout marker in a compiled eBPF object
///
/// # Errors
/// Returns an error if the object can't be parsed, lacks the marker, or
/// declares a record size different from [`PacketEvent::SIZE`]
pub fn verify_object_layout(object_bytes: &[u8]) -> Result<(), TracerError> {
    let declared = read_declared_size(object_bytes)?;
    check_record_size(declared as usize)
}

/// Compare a declared record size with the decoder's
///
/// # Errors
/// Returns [`TracerError::LayoutMismatch`] if the sizes differ
pub fn check_record_size(found: usize) -> Result<(), TracerError> {
    if found == PacketEvent::SIZE {
        Ok(())
    } else {
        Err(TracerError::LayoutMismatch { expected: PacketEvent::SIZE, found })
    }
}

fn read_declared_size(object_bytes: &[u8]) -> Result<u32, TracerError> {
    let file =
        object::File::parse(object_bytes).map_err(|e| TracerError::ObjectInvalid(e.to_string()))?;

    let symbol = file
        .symbol_by_name(EVENT_SIZE_SYMBOL)
        .ok_or(TracerError::LayoutMarkerMissing(EVENT_SIZE_SYMBOL))?;
    let section_index =
        symbol.section_index().ok_or(TracerError::LayoutMarkerMissing(EVENT_SIZE_SYMBOL))?;
    let section = file
        .section_by_index(section_index)
        .map_err(|e| TracerError::ObjectInvalid(e.to_string()))?;
    let data = section.data().map_err(|e| TracerError::ObjectInvalid(e.to_string()))?;

    let start = usize::try_from(symbol.address().saturating_sub(section.address()))
        .map_err(|e| TracerError::ObjectInvalid(e.to_string()))?;
    let bytes = data
        .get(start..start + 4)
        .ok_or(TracerError::LayoutMarkerMissing(EVENT_SIZE_SYMBOL))?;

    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    Ok(u32::from_le_bytes(buf))
}
