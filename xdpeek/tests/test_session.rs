//! Attach → stream → interrupt → detach, with a fake hook and a scripted producer

use std::collections::VecDeque;
use std::io;
use std::ops::ControlFlow;

use xdpeek::domain::TracerError;
use xdpeek::tracer::{
    run_session, shutdown_channel, AttachMode, AttachmentState, ClockOffset, EventDecoder,
    HookLifecycle, LoopStats, PacketHook, RecordSource, SessionOptions, ShutdownTrigger,
};
use xdpeek_common::PacketEvent;

#[derive(Default)]
struct FakeHook {
    calls: Vec<String>,
    attached: bool,
    reject_attach: bool,
}

impl PacketHook for FakeHook {
    fn clear(&mut self, iface: &str) -> Result<(), TracerError> {
        // Clearing an interface with nothing attached is fine
        self.calls.push(format!("clear {iface}"));
        self.attached = false;
        Ok(())
    }

    fn attach(&mut self, iface: &str, mode: AttachMode) -> Result<(), TracerError> {
        self.calls.push(format!("attach {iface} {mode:?}"));
        if self.reject_attach {
            return Err(TracerError::AttachFailed {
                iface: iface.to_string(),
                error: "Device or resource busy".to_string(),
            });
        }
        self.attached = true;
        Ok(())
    }

    fn detach(&mut self, iface: &str) -> Result<(), TracerError> {
        self.calls.push(format!("detach {iface}"));
        self.attached = false;
        Ok(())
    }
}

/// Hands out one batch per drain; fires the trigger after `interrupt_after` batches
struct ScriptedProducer {
    batches: VecDeque<Vec<Vec<u8>>>,
    interrupt_after: usize,
    trigger: Option<ShutdownTrigger>,
}

impl RecordSource for ScriptedProducer {
    async fn drain(&mut self, sink: &mut dyn FnMut(&[u8]) -> ControlFlow<()>) -> io::Result<usize> {
        let Some(batch) = self.batches.pop_front() else {
            return std::future::pending().await;
        };
        let mut handed = 0;
        for raw in &batch {
            handed += 1;
            if sink(raw).is_break() {
                break;
            }
        }
        self.interrupt_after = self.interrupt_after.saturating_sub(1);
        if self.interrupt_after == 0 {
            if let Some(trigger) = self.trigger.take() {
                trigger.trigger();
            }
        }
        Ok(handed)
    }
}

/// Single batch; the interrupt lands right after the first record is handed out
struct InterruptAfterFirstRecord {
    batch: Vec<Vec<u8>>,
    trigger: Option<ShutdownTrigger>,
}

impl RecordSource for InterruptAfterFirstRecord {
    async fn drain(&mut self, sink: &mut dyn FnMut(&[u8]) -> ControlFlow<()>) -> io::Result<usize> {
        if self.batch.is_empty() {
            return std::future::pending().await;
        }
        let mut handed = 0;
        for raw in std::mem::take(&mut self.batch) {
            handed += 1;
            if sink(&raw).is_break() {
                break;
            }
            if let Some(trigger) = self.trigger.take() {
                trigger.trigger();
            }
        }
        Ok(handed)
    }
}

fn udp_record(sport: u16) -> Vec<u8> {
    let mut raw = vec![0u8; PacketEvent::SIZE];
    raw[PacketEvent::OFFSET_SADDR..][..4].copy_from_slice(&[10, 1, 1, 1]);
    raw[PacketEvent::OFFSET_DADDR..][..4].copy_from_slice(&[10, 1, 1, 2]);
    raw[PacketEvent::OFFSET_SPORT..][..2].copy_from_slice(&sport.to_be_bytes());
    raw[PacketEvent::OFFSET_DPORT..][..2].copy_from_slice(&53u16.to_be_bytes());
    raw[PacketEvent::OFFSET_PROTO] = 17;
    raw[PacketEvent::OFFSET_PKT_SIZE..][..4].copy_from_slice(&64u32.to_le_bytes());
    raw
}

fn decoder() -> EventDecoder {
    EventDecoder::new(ClockOffset::from_nanos(1_700_000_000_000_000_000), false)
}

#[tokio::test]
async fn test_interrupt_detaches_exactly_once() {
    let (trigger, mut shutdown) = shutdown_channel();
    let mut producer = ScriptedProducer {
        batches: VecDeque::from([vec![udp_record(1111)], vec![udp_record(2222)]]),
        interrupt_after: 1,
        trigger: Some(trigger),
    };
    let mut lifecycle = HookLifecycle::new(FakeHook::default(), "lo");
    let mut out = Vec::new();

    let stats = run_session(
        &mut lifecycle,
        SessionOptions::default(),
        &mut producer,
        &decoder(),
        &mut out,
        &mut shutdown,
    )
    .await
    .unwrap();

    assert_eq!(stats, LoopStats { records: 1, decode_errors: 0 });
    assert_eq!(lifecycle.state(), AttachmentState::Detached);
    assert_eq!(lifecycle.hook().calls, ["clear lo", "attach lo Generic", "detach lo"]);
    assert!(!lifecycle.hook().attached);

    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Starting packet tracing on lo... Press Ctrl-C to end.\n"));
    assert!(text.contains("UDP 10.1.1.1:1111 -> 10.1.1.2:53 64 bytes"));
    assert!(!text.contains(":2222 -> "), "record after the interrupt was printed");
    assert!(text.ends_with("\nRemoving filter from interface lo\n"));
}

#[tokio::test]
async fn test_quiet_session_skips_banner() {
    let (trigger, mut shutdown) = shutdown_channel();
    let mut producer = ScriptedProducer {
        batches: VecDeque::from([vec![udp_record(1), udp_record(2)]]),
        interrupt_after: 1,
        trigger: Some(trigger),
    };
    let mut lifecycle = HookLifecycle::new(FakeHook::default(), "eth0");
    let mut out = Vec::new();

    let stats = run_session(
        &mut lifecycle,
        SessionOptions { quiet: true, ..SessionOptions::default() },
        &mut producer,
        &decoder(),
        &mut out,
        &mut shutdown,
    )
    .await
    .unwrap();

    // The whole first batch was handed out before the trigger fired
    assert_eq!(stats.records, 2);
    let text = String::from_utf8(out).unwrap();
    assert!(!text.contains("Starting packet tracing"));
    assert_eq!(lifecycle.hook().calls.iter().filter(|c| c.starts_with("detach")).count(), 1);
}

#[tokio::test]
async fn test_attach_failure_never_detaches() {
    let (_trigger, mut shutdown) = shutdown_channel();
    let mut producer =
        ScriptedProducer { batches: VecDeque::new(), interrupt_after: 0, trigger: None };
    let hook = FakeHook { reject_attach: true, ..FakeHook::default() };
    let mut lifecycle = HookLifecycle::new(hook, "eth0");
    let mut out = Vec::new();

    let err = run_session(
        &mut lifecycle,
        SessionOptions::default(),
        &mut producer,
        &decoder(),
        &mut out,
        &mut shutdown,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, TracerError::AttachFailed { .. }));
    assert_eq!(lifecycle.hook().calls, ["clear eth0", "attach eth0 Generic"]);
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_clear_on_clean_interface_then_attach() {
    let mut lifecycle = HookLifecycle::new(FakeHook::default(), "lo");
    lifecycle.prepare();
    lifecycle.prepare();

    let attachment = lifecycle.attach(AttachMode::Generic).unwrap();
    attachment.detach().unwrap();

    assert_eq!(
        lifecycle.hook().calls,
        ["clear lo", "clear lo", "attach lo Generic", "detach lo"]
    );
}

#[tokio::test]
async fn test_second_session_reattaches() {
    let mut lifecycle = HookLifecycle::new(FakeHook::default(), "lo");

    for round in 0..2u16 {
        let (trigger, mut shutdown) = shutdown_channel();
        let mut producer = ScriptedProducer {
            batches: VecDeque::from([vec![udp_record(round)]]),
            interrupt_after: 1,
            trigger: Some(trigger),
        };
        let mut out = Vec::new();
        run_session(
            &mut lifecycle,
            SessionOptions::default(),
            &mut producer,
            &decoder(),
            &mut out,
            &mut shutdown,
        )
        .await
        .unwrap();
    }

    assert_eq!(lifecycle.hook().calls.iter().filter(|c| c.starts_with("attach")).count(), 2);
    assert_eq!(lifecycle.hook().calls.iter().filter(|c| c.starts_with("detach")).count(), 2);
}

#[tokio::test]
async fn test_interrupt_mid_batch_prints_nothing_after_signal() {
    let (trigger, mut shutdown) = shutdown_channel();
    let mut producer = InterruptAfterFirstRecord {
        batch: vec![udp_record(1000), udp_record(1001), udp_record(1002)],
        trigger: Some(trigger),
    };
    let mut lifecycle = HookLifecycle::new(FakeHook::default(), "lo");
    let mut out = Vec::new();

    let stats = run_session(
        &mut lifecycle,
        SessionOptions::default(),
        &mut producer,
        &decoder(),
        &mut out,
        &mut shutdown,
    )
    .await
    .unwrap();

    assert_eq!(stats.records, 1);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("10.1.1.1:1000 -> 10.1.1.2:53"));
    assert!(!text.contains(":1001 -> "));
    assert!(!text.contains(":1002 -> "));
    assert_eq!(lifecycle.hook().calls, ["clear lo", "attach lo Generic", "detach lo"]);
}
