//! Domain model for xdpeek
//!
//! This module contains core domain types and errors that provide:
//! - A total mapping from IANA protocol numbers to display names
//! - Structured error handling for fatal and per-record failures

pub mod errors;
pub mod types;

pub use types::Protocol;

pub use errors::{DecodeError, TracerError};
