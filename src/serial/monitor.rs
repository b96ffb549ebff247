use super::LineSource;
use crate::error::Result;
use crate::shutdown::ShutdownSignal;
use log::{debug, error, info};
use regex::{Regex, RegexBuilder};
use std::thread;
use std::time::Duration;

pub const DEFAULT_START_PATTERN: &str = r".*Image Classifier.*";
pub const DEFAULT_FAIL_PATTERNS: [&str; 3] = [r".*hardfault.*", r".*assert.*", r".*error.*"];

/// Case-insensitive patterns for the "ready" line and failure lines.
#[derive(Debug, Clone)]
pub struct MonitorPatterns {
    start: Regex,
    fail: Vec<Regex>,
}

impl MonitorPatterns {
    pub fn new<S: AsRef<str>>(start: &str, fail: &[S]) -> Result<Self> {
        let compile = |pattern: &str| RegexBuilder::new(pattern).case_insensitive(true).build();
        Ok(Self {
            start: compile(start)?,
            fail: fail
                .iter()
                .map(|p| compile(p.as_ref()))
                .collect::<std::result::Result<_, _>>()?,
        })
    }

    /// The ready/failure patterns of the image classifier firmware.
    pub fn defaults() -> Result<Self> {
        Self::new(DEFAULT_START_PATTERN, &DEFAULT_FAIL_PATTERNS)
    }

    pub fn is_start(&self, line: &str) -> bool {
        self.start.is_match(line)
    }

    pub fn is_failure(&self, line: &str) -> bool {
        self.fail.iter().any(|re| re.is_match(line))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// The ready pattern was seen.
    Ready,
    /// A failure pattern was seen; carries the offending line.
    Failed(String),
    /// Shutdown was requested elsewhere, e.g. by Ctrl+C.
    Interrupted,
}

/// Watches a board's console for the ready line or a failure line.
///
/// A failure line stops the acquisition worker through the shared
/// [`ShutdownSignal`] before it is reported to the caller.
pub struct SerialMonitor<L: LineSource> {
    source: L,
    patterns: MonitorPatterns,
    shutdown: ShutdownSignal,
    poll_timeout: Duration,
    idle: Duration,
    started: bool,
    error_message: Option<String>,
}

impl<L: LineSource> SerialMonitor<L> {
    pub fn new(source: L, patterns: MonitorPatterns, shutdown: ShutdownSignal) -> Self {
        Self {
            source,
            patterns,
            shutdown,
            poll_timeout: Duration::from_millis(10),
            idle: Duration::from_millis(100),
            started: false,
            error_message: None,
        }
    }

    pub fn with_timing(mut self, poll_timeout: Duration, idle: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self.idle = idle;
        self
    }

    /// The first line that matched a failure pattern, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Consume every line available within `timeout`.
    ///
    /// Returns `true` once the ready line or a failure line has been seen.
    pub fn read(&mut self, timeout: Duration) -> bool {
        let was_started = self.started;
        let mut wait = timeout;
        while let Some(line) = self.source.read_line(wait) {
            self.process_line(&line);
            if self.error_message.is_some() || self.started != was_started {
                break;
            }
            wait = Duration::ZERO;
        }
        self.started || self.error_message.is_some()
    }

    fn process_line(&mut self, line: &str) {
        info!(target: "device", "{}", line);

        if self.error_message.is_some() {
            return;
        }
        if self.patterns.is_failure(line) {
            error!("Device reported a failure: {}", line);
            self.error_message = Some(line.to_string());
            if self.shutdown.trigger() {
                debug!("Requested acquisition shutdown");
            }
        } else if !self.started && self.patterns.is_start(line) {
            info!("Device application started");
            self.started = true;
        }
    }

    /// Poll until the ready line, a failure line, an external shutdown, or
    /// the console closing.
    pub fn wait_until_ready(&mut self) -> MonitorOutcome {
        while !self.read(self.poll_timeout) {
            if self.shutdown.is_triggered() || self.console_closed() {
                return MonitorOutcome::Interrupted;
            }
            thread::sleep(self.idle);
        }
        self.outcome()
    }

    /// Keep watching for failure lines until shutdown is requested or the
    /// console closes.
    pub fn watch(&mut self) -> MonitorOutcome {
        loop {
            self.read(self.poll_timeout);
            if let Some(message) = self.error_message.clone() {
                return MonitorOutcome::Failed(message);
            }
            if self.shutdown.is_triggered() || self.console_closed() {
                return MonitorOutcome::Interrupted;
            }
            thread::sleep(self.idle);
        }
    }

    fn console_closed(&self) -> bool {
        let closed = self.source.is_closed();
        if closed {
            error!("Device console closed, stopping");
        }
        closed
    }

    fn outcome(&self) -> MonitorOutcome {
        match &self.error_message {
            Some(message) => MonitorOutcome::Failed(message.clone()),
            None => MonitorOutcome::Ready,
        }
    }
}
