mod monitor;
mod port;

pub use monitor::{
    MonitorOutcome, MonitorPatterns, SerialMonitor, DEFAULT_FAIL_PATTERNS, DEFAULT_START_PATTERN,
};
pub use port::{
    resolve_port, SerialLineReader, DEFAULT_BAUD_RATE, NO_PORT, REGEX_PREFIX, SERIAL_BY_ID_DIR,
};

use std::time::Duration;

/// A source of text lines, such as a board's serial console.
pub trait LineSource {
    /// Wait up to `timeout` for the next line.
    fn read_line(&mut self, timeout: Duration) -> Option<String>;

    /// Whether the source has ended and will never yield another line.
    fn is_closed(&self) -> bool {
        false
    }
}
