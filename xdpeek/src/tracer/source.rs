//! Raw record sources
//!
//! [`RecordSource`] is the seam between the event loop and the kernel: it waits
//! for records and hands each raw byte slice to a sink. [`RingBufSource`] reads
//! the `events` ring buffer; tests drive the loop with scripted sources.

use std::future::Future;
use std::io;
use std::ops::ControlFlow;

use aya::maps::{MapData, RingBuf};
use tokio::io::unix::AsyncFd;

/// Producer of fixed-size raw records
pub trait RecordSource {
    /// Wait until at least one record is available, then pass every available
    /// record to `sink` in arrival order
    ///
    /// Stops early when `sink` returns `ControlFlow::Break`. Resolves to the
    /// number of records handed to `sink`.
    fn drain(
        &mut self,
        sink: &mut dyn FnMut(&[u8]) -> ControlFlow<()>,
    ) -> impl Future<Output = io::Result<usize>>;
}

/// Event-driven reader over the kernel ring buffer
///
/// The ring buffer fd becomes readable when the producer submits records, so
/// waiting costs nothing between packets.
pub struct RingBufSource {
    ring: AsyncFd<RingBuf<MapData>>,
}

impl RingBufSource {
    /// # Errors
    /// Returns an error if the fd can't be registered with the tokio reactor
    pub fn new(ring: RingBuf<MapData>) -> io::Result<Self> {
        Ok(Self { ring: AsyncFd::new(ring)? })
    }
}

impl RecordSource for RingBufSource {
    async fn drain(&mut self, sink: &mut dyn FnMut(&[u8]) -> ControlFlow<()>) -> io::Result<usize> {
        let mut guard = self.ring.readable_mut().await?;
        let ring = guard.get_inner_mut();

        let mut count = 0;
        while let Some(item) = ring.next() {
            count += 1;
            if sink(&*item).is_break() {
                break;
            }
        }

        guard.clear_ready();
        Ok(count)
    }
}
