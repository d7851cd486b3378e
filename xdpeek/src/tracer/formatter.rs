//! Trace line rendering
//!
//! ```text
//! 2024-05-01 12:00:00.123456 TCP 10.0.0.1:51234 -> 10.0.0.2:443 74 bytes
//! Payload: GET / HTTP/1.1
//! ```

use std::fmt;

use chrono::{DateTime, Local, TimeZone};

use super::decoder::DecodedEvent;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Render an event in local time: one line, plus a `Payload:` line when the
/// event carries payload text
#[must_use]
pub fn format_event(event: &DecodedEvent) -> String {
    format_event_in(event, &Local)
}

/// Render an event in the given time zone
#[must_use]
pub fn format_event_in<Tz>(event: &DecodedEvent, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut out = format!(
        "{} {} {}:{} -> {}:{} {} bytes",
        format_timestamp(event.timestamp_ns, tz),
        event.protocol,
        event.source,
        event.source_port,
        event.destination,
        event.dest_port,
        event.packet_size,
    );

    if let Some(payload) = event.payload.as_deref().filter(|p| !p.is_empty()) {
        out.push_str("\nPayload: ");
        out.push_str(payload);
    }

    out
}

/// Microsecond-precision timestamp from nanoseconds since the Unix epoch
#[must_use]
pub fn format_timestamp<Tz>(timestamp_ns: u64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let secs = i64::try_from(timestamp_ns / 1_000_000_000).unwrap_or(i64::MAX);
    #[allow(clippy::cast_possible_truncation)]
    let nanos = (timestamp_ns % 1_000_000_000) as u32;

    match DateTime::from_timestamp(secs, nanos) {
        Some(utc) => utc.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string(),
        // Out of chrono's range; fall back to raw seconds
        None => format!("{secs}.{:06}", nanos / 1_000),
    }
}
