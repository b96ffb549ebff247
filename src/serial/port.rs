use super::LineSource;
use crate::error::{AppError, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use log::{debug, info, trace, warn};
use regex::{Regex, RegexBuilder};
use serialport::{SerialPortInfo, SerialPortType};
use std::fs;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Prefix marking a port argument as a pattern over device names.
pub const REGEX_PREFIX: &str = "regex:";

/// Port value that disables console monitoring.
pub const NO_PORT: &str = "none";

/// Directory of stable, descriptive serial device links on Linux.
pub const SERIAL_BY_ID_DIR: &str = "/dev/serial/by-id";

/// Line rate of the board's console UART.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// How long a single read on the port may block the reader thread.
const PORT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Resolve a port argument to a device path.
///
/// `regex:<pattern>` is matched case-insensitively against the entries of
/// `search_dir` first; the first match in name order wins. When none match,
/// the enumerated serial ports are searched by name and USB description, so
/// a pattern like `JLink CDC UART` finds the probe's console too. Anything
/// else is used as a path.
pub fn resolve_port(port: &str, search_dir: &Path) -> Result<PathBuf> {
    let Some(pattern) = port.strip_prefix(REGEX_PREFIX) else {
        return Ok(PathBuf::from(port));
    };
    let matcher = RegexBuilder::new(pattern).case_insensitive(true).build()?;

    if let Some(path) = match_link_names(&matcher, search_dir) {
        return Ok(path);
    }

    let ports = serialport::available_ports().unwrap_or_else(|e| {
        debug!("Serial port enumeration unavailable: {}", e);
        Vec::new()
    });
    match_port_info(&matcher, &ports).ok_or_else(|| {
        AppError::serial(format!(
            "No serial port in {} or the system port list matches {:?}",
            search_dir.display(),
            pattern
        ))
    })
}

fn match_link_names(matcher: &Regex, search_dir: &Path) -> Option<PathBuf> {
    let entries = match fs::read_dir(search_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot list {}: {}", search_dir.display(), e);
            return None;
        }
    };

    let mut names: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    names.sort();

    names.into_iter().find(|path| {
        path.file_name()
            .map(|name| matcher.is_match(&name.to_string_lossy()))
            .unwrap_or(false)
    })
}

/// First port whose name, USB product or USB manufacturer matches.
fn match_port_info(matcher: &Regex, ports: &[SerialPortInfo]) -> Option<PathBuf> {
    ports
        .iter()
        .find(|port| {
            if matcher.is_match(&port.port_name) {
                return true;
            }
            match &port.port_type {
                SerialPortType::UsbPort(usb) => [&usb.product, &usb.manufacturer]
                    .into_iter()
                    .flatten()
                    .any(|text| matcher.is_match(text)),
                _ => false,
            }
        })
        .map(|port| PathBuf::from(&port.port_name))
}

/// Reads text lines from a serial device on a background thread.
pub struct SerialLineReader {
    lines: Receiver<String>,
    path: PathBuf,
    closed: bool,
}

impl SerialLineReader {
    /// Open the console at `baud_rate`, 8N1, in raw mode.
    pub fn open(path: impl Into<PathBuf>, baud_rate: u32) -> Result<Self> {
        let path = path.into();
        let port = serialport::new(path.to_string_lossy(), baud_rate)
            .timeout(PORT_READ_TIMEOUT)
            .open()
            .map_err(|e| AppError::serial(format!("Failed to open {}: {}", path.display(), e)))?;
        info!("Opened serial port {} at {} baud", path.display(), baud_rate);
        Self::from_reader(port, path)
    }

    /// Pump lines from any reader, for example a pipe or a test fixture.
    ///
    /// Read timeouts are retried; a line split across them is kept whole.
    pub fn from_reader<R>(reader: R, path: impl Into<PathBuf>) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        let path = path.into();
        let (tx, rx) = unbounded();
        let label = path.display().to_string();
        thread::Builder::new()
            .name("serial-reader".to_string())
            .spawn(move || {
                let mut reader = BufReader::new(reader);
                let mut raw = Vec::new();
                loop {
                    match reader.read_until(b'\n', &mut raw) {
                        Ok(0) => {
                            debug!("Serial port {} reached end of input", label);
                            break;
                        }
                        Ok(_) => {
                            let line = String::from_utf8_lossy(&raw)
                                .trim_end_matches(['\r', '\n'])
                                .to_string();
                            raw.clear();
                            trace!("serial <- {:?}", line);
                            if tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(e)
                            if matches!(
                                e.kind(),
                                ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                            ) => {}
                        Err(e) => {
                            warn!("Serial port {} read failed: {}", label, e);
                            break;
                        }
                    }
                }
            })?;
        Ok(Self {
            lines: rx,
            path,
            closed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LineSource for SerialLineReader {
    fn read_line(&mut self, timeout: Duration) -> Option<String> {
        match self.lines.recv_timeout(timeout) {
            Ok(line) => Some(line),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
