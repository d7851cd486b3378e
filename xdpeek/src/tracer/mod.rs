//! Tracing pipeline
//!
//! - Clock reconciliation (boot-relative → wall-clock)
//! - Record decoding and trace line formatting
//! - XDP program loading, attachment and teardown
//! - The event loop and its shutdown signal

pub mod clock;
pub mod decoder;
pub mod diagnostics;
pub mod event_loop;
pub mod formatter;
pub mod hook;
pub mod layout;
pub mod object;
pub mod session;
pub mod shutdown;
pub mod source;
pub mod xdp_hook;

pub use clock::{Clock, ClockOffset, FixedClock, SystemClock};
pub use decoder::{DecodedEvent, EventDecoder};
pub use diagnostics::{format_summary, DropCounter};
pub use event_loop::{run_event_loop, LoopStats};
pub use formatter::{format_event, format_event_in};
pub use hook::{AttachMode, Attachment, AttachmentState, HookLifecycle, PacketHook};
pub use layout::verify_object_layout;
pub use object::{read_object, resolve_object_path};
pub use session::{run_session, SessionOptions};
pub use shutdown::{shutdown_channel, InterruptListener, ShutdownSignal, ShutdownTrigger};
pub use source::{RecordSource, RingBufSource};
pub use xdp_hook::XdpHook;
