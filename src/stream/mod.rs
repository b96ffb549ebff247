//! Byte-stream transports for reading data pushed by the board's firmware.
//!
//! The firmware registers named streams (for example `"image"`) on the debug
//! interface. A [`StreamTransport`] opens those streams by name and hands out
//! [`DataStream`] handles that the acquisition loop reads from with a bounded
//! wait.

mod replay;
mod tcp;

pub use replay::ReplayTransport;
pub use tcp::{TcpDataStream, TcpTransport, DEFAULT_RTT_ADDRESS};

use crate::error::StreamError;
use std::fmt;
use std::time::Duration;

/// Direction of a stream as seen from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    Read,
    Write,
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamMode::Read => f.write_str("read"),
            StreamMode::Write => f.write_str("write"),
        }
    }
}

pub trait DataStream: Send {
    /// Read up to `max_bytes`, waiting at most `timeout` for the first byte.
    ///
    /// An empty vector means no data arrived in time; it is not an error.
    fn read_up_to(&mut self, max_bytes: usize, timeout: Duration) -> Result<Vec<u8>, StreamError>;
}

pub trait StreamTransport: Send {
    type Stream: DataStream;

    /// Open the named stream. Fails with [`StreamError::Unavailable`] when the
    /// device does not (yet) expose it.
    fn open(&mut self, name: &str, mode: StreamMode) -> Result<Self::Stream, StreamError>;

    /// Release the connection to the device.
    fn disconnect(&mut self);
}
