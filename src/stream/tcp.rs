use super::{DataStream, StreamMode, StreamTransport};
use crate::error::StreamError;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::io::{self, Read};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Telnet port the J-Link GDB server and commander expose RTT channel 0 on.
pub const DEFAULT_RTT_ADDRESS: &str = "127.0.0.1:19021";

/// Streams served over TCP sockets, one address per stream name.
///
/// Keeps one handle per stream name so `disconnect` can close the socket a
/// reader is blocked on. Reopening a name replaces its handle.
pub struct TcpTransport {
    endpoints: HashMap<String, String>,
    connect_timeout: Duration,
    open: HashMap<String, TcpStream>,
}

impl TcpTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            endpoints: HashMap::new(),
            connect_timeout,
            open: HashMap::new(),
        }
    }

    pub fn with_endpoint(mut self, name: impl Into<String>, address: impl Into<String>) -> Self {
        self.endpoints.insert(name.into(), address.into());
        self
    }

    fn resolve(&self, name: &str) -> Result<SocketAddr, StreamError> {
        let address = self
            .endpoints
            .get(name)
            .ok_or_else(|| StreamError::unavailable(name))?;
        address
            .to_socket_addrs()
            .map_err(|source| StreamError::Connect {
                name: name.to_string(),
                source,
            })?
            .next()
            .ok_or_else(|| StreamError::unavailable(name))
    }
}

impl StreamTransport for TcpTransport {
    type Stream = TcpDataStream;

    fn open(&mut self, name: &str, mode: StreamMode) -> Result<Self::Stream, StreamError> {
        let addr = self.resolve(name)?;
        debug!("Connecting to {} stream {:?} at {}", mode, name, addr);

        let connect_err = |source| StreamError::Connect {
            name: name.to_string(),
            source,
        };
        let socket = TcpStream::connect_timeout(&addr, self.connect_timeout).map_err(connect_err)?;
        socket.set_nodelay(true).map_err(connect_err)?;
        let handle = socket.try_clone().map_err(connect_err)?;
        if let Some(stale) = self.open.insert(name.to_string(), handle) {
            // The previous reader is gone; close its side too
            let _ = stale.shutdown(Shutdown::Both);
            debug!("Replaced stale handle for stream {:?}", name);
        }

        info!("Stream {:?} connected to {}", name, addr);
        Ok(TcpDataStream {
            name: name.to_string(),
            socket,
        })
    }

    fn disconnect(&mut self) {
        for (name, socket) in self.open.drain() {
            match socket.shutdown(Shutdown::Both) {
                Ok(()) => debug!("Closed stream {:?}", name),
                Err(e) if e.kind() == io::ErrorKind::NotConnected => {}
                Err(e) => warn!("Failed to close stream {:?}: {}", name, e),
            }
        }
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

pub struct TcpDataStream {
    name: String,
    socket: TcpStream,
}

impl DataStream for TcpDataStream {
    fn read_up_to(&mut self, max_bytes: usize, timeout: Duration) -> Result<Vec<u8>, StreamError> {
        if max_bytes == 0 {
            return Ok(Vec::new());
        }
        // A zero read timeout means "block forever" to the socket API
        self.socket
            .set_read_timeout(Some(timeout.max(Duration::from_millis(1))))?;

        let mut buf = vec![0u8; max_bytes];
        match self.socket.read(&mut buf) {
            Ok(0) => Err(StreamError::closed(&self.name)),
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(Vec::new())
            }
            Err(e) => Err(StreamError::Read(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_unknown_stream_is_unavailable() {
        let mut transport = TcpTransport::new(Duration::from_millis(50));
        let err = transport.open("image", StreamMode::Read).err().unwrap();
        assert!(matches!(err, StreamError::Unavailable(name) if name == "image"));
    }

    #[test]
    fn test_refused_connection_is_reported() {
        // Bind then drop to get a port nothing listens on
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let mut transport = TcpTransport::new(Duration::from_millis(200))
            .with_endpoint("image", format!("127.0.0.1:{}", port));
        let err = transport.open("image", StreamMode::Read).err().unwrap();
        assert!(matches!(err, StreamError::Connect { .. }));
    }

    #[test]
    fn test_reads_bytes_and_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            conn.write_all(&[1, 2, 3, 4, 5]).unwrap();
            thread::sleep(Duration::from_millis(300));
        });

        let mut transport =
            TcpTransport::new(Duration::from_secs(1)).with_endpoint("image", addr.to_string());
        let mut stream = transport.open("image", StreamMode::Read).unwrap();

        let mut received = Vec::new();
        while received.len() < 5 {
            let chunk = stream.read_up_to(5 - received.len(), Duration::from_millis(200)).unwrap();
            received.extend(chunk);
        }
        assert_eq!(received, vec![1, 2, 3, 4, 5]);

        let empty = stream.read_up_to(16, Duration::from_millis(20)).unwrap();
        assert!(empty.is_empty());

        transport.disconnect();
        server.join().unwrap();
    }

    #[test]
    fn test_reconnects_keep_one_handle_per_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            for _ in 0..20 {
                let (conn, _) = listener.accept().unwrap();
                drop(conn);
            }
        });

        let mut transport =
            TcpTransport::new(Duration::from_secs(1)).with_endpoint("image", addr.to_string());
        for _ in 0..20 {
            let mut stream = transport.open("image", StreamMode::Read).unwrap();
            assert!(stream.read_up_to(8, Duration::from_millis(500)).is_err());
            drop(stream);
            assert_eq!(transport.open.len(), 1);
        }
        server.join().unwrap();

        transport.disconnect();
        assert!(transport.open.is_empty());
    }

    #[test]
    fn test_remote_close_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (conn, _) = listener.accept().unwrap();
            drop(conn);
        });

        let mut transport =
            TcpTransport::new(Duration::from_secs(1)).with_endpoint("image", addr.to_string());
        let mut stream = transport.open("image", StreamMode::Read).unwrap();
        server.join().unwrap();

        let err = stream.read_up_to(8, Duration::from_millis(500)).err().unwrap();
        assert!(matches!(err, StreamError::Closed(_) | StreamError::Read(_)));
    }
}
