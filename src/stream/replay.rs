use super::{DataStream, StreamMode, StreamTransport};
use crate::error::StreamError;
use log::{debug, info};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

/// Serves a raw capture file as a read-only stream.
///
/// Useful for exercising the preview without a board attached. Once the file
/// is exhausted, reads behave like an idle device.
pub struct ReplayTransport {
    name: String,
    path: PathBuf,
}

impl ReplayTransport {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl StreamTransport for ReplayTransport {
    type Stream = ReplayStream;

    fn open(&mut self, name: &str, mode: StreamMode) -> Result<Self::Stream, StreamError> {
        if name != self.name {
            return Err(StreamError::unavailable(name));
        }
        if mode != StreamMode::Read {
            return Err(StreamError::Unsupported(name.to_string(), "write"));
        }
        let file = File::open(&self.path).map_err(|source| StreamError::Connect {
            name: name.to_string(),
            source,
        })?;
        info!("Replaying {} as stream {:?}", self.path.display(), name);
        Ok(ReplayStream {
            reader: BufReader::new(file),
            exhausted: false,
        })
    }

    fn disconnect(&mut self) {
        debug!("Replay of {} finished", self.path.display());
    }
}

pub struct ReplayStream {
    reader: BufReader<File>,
    exhausted: bool,
}

impl DataStream for ReplayStream {
    fn read_up_to(&mut self, max_bytes: usize, timeout: Duration) -> Result<Vec<u8>, StreamError> {
        if !self.exhausted {
            let mut buf = vec![0u8; max_bytes];
            let n = self.reader.read(&mut buf)?;
            if n > 0 || max_bytes == 0 {
                buf.truncate(n);
                return Ok(buf);
            }
            self.exhausted = true;
            info!("Replay reached end of file");
        }
        thread::sleep(timeout);
        Ok(Vec::new())
    }
}
