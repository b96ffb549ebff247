//! The console monitor and the acquisition worker sharing one shutdown signal.

use jlink_visu::{
    Acquisition, AcquisitionOptions, FrameGeometry, MonitorOutcome, MonitorPatterns, NullPreview,
    ReplayTransport, SerialLineReader, SerialMonitor, ShutdownSignal,
};
use std::io::{self, Cursor, ErrorKind, Read};
use std::time::Duration;

fn options() -> AcquisitionOptions {
    AcquisitionOptions {
        stream_name: "image".to_string(),
        read_timeout: Duration::from_millis(5),
        poll_interval: Duration::from_millis(1),
    }
}

fn console(text: &str) -> SerialLineReader {
    SerialLineReader::from_reader(Cursor::new(text.as_bytes().to_vec()), "fixture").unwrap()
}

fn monitor_for(
    lines: SerialLineReader,
    shutdown: &ShutdownSignal,
) -> SerialMonitor<SerialLineReader> {
    SerialMonitor::new(lines, MonitorPatterns::defaults().unwrap(), shutdown.clone())
        .with_timing(Duration::from_millis(20), Duration::from_millis(1))
}

/// A connected console that never prints anything.
struct SilentPort;

impl Read for SilentPort {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        std::thread::sleep(Duration::from_millis(5));
        Err(io::Error::new(ErrorKind::TimedOut, "no data"))
    }
}

#[test]
fn test_failure_line_stops_replayed_acquisition() {
    let dir = tempfile::tempdir().unwrap();
    let recording = dir.path().join("capture.raw");
    std::fs::write(&recording, vec![42u8; 20 * 16 * 3]).unwrap();

    let shutdown = ShutdownSignal::new();
    let geometry = FrameGeometry::resolve("20x16", "8x8").unwrap();
    let worker = Acquisition::new(
        ReplayTransport::new("image", &recording),
        NullPreview::new(),
        geometry,
        options(),
    )
    .spawn(shutdown.clone())
    .unwrap();

    let lines = console("boot rom v2\r\nImage Classifier ready\r\nHardFault at 0x0800\r\n");
    let mut monitor = monitor_for(lines, &shutdown);

    assert_eq!(monitor.wait_until_ready(), MonitorOutcome::Ready);
    assert!(!shutdown.is_triggered());

    let outcome = monitor.watch();
    assert_eq!(outcome, MonitorOutcome::Failed("HardFault at 0x0800".to_string()));
    assert!(shutdown.is_triggered());

    let stats = worker.join().unwrap();
    assert!(stats.frames_completed <= 3);
    assert_eq!(stats.stream_losses, 0);
}

#[test]
fn test_failure_before_ready_is_reported_once() {
    let shutdown = ShutdownSignal::new();
    let lines = console("assert failed: model.c:12\nerror: second fault\nImage Classifier\n");
    let mut monitor = monitor_for(lines, &shutdown);

    let outcome = monitor.wait_until_ready();

    assert_eq!(outcome, MonitorOutcome::Failed("assert failed: model.c:12".to_string()));
    assert_eq!(monitor.error_message(), Some("assert failed: model.c:12"));
    assert!(!monitor.is_started());
    // The monitor already claimed the one-shot trigger
    assert!(!shutdown.trigger());
}

#[test]
fn test_ctrl_c_interrupts_a_silent_console() {
    let shutdown = ShutdownSignal::new();
    let silent = SerialLineReader::from_reader(SilentPort, "silent").unwrap();
    let mut monitor = monitor_for(silent, &shutdown);

    let signal = shutdown.clone();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        signal.trigger()
    });

    assert_eq!(monitor.wait_until_ready(), MonitorOutcome::Interrupted);
    assert!(stopper.join().unwrap());
}

#[test]
fn test_unplugged_console_ends_the_wait() {
    let shutdown = ShutdownSignal::new();
    let mut monitor = monitor_for(console("boot rom v2\r\n"), &shutdown);

    assert_eq!(monitor.wait_until_ready(), MonitorOutcome::Interrupted);
    assert!(monitor.error_message().is_none());
    assert!(!shutdown.is_triggered());
}
