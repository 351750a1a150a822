//! Connection management.

use crate::error::ClientError;
use crate::platform::{self, RawHandle, INVALID_HANDLE};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::fmt;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Default connect timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Broker host name or address literal.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Upper bound on connection establishment.
    pub connect_timeout: Duration,
    /// Receive deadline per read call. `None` or zero blocks indefinitely.
    pub read_timeout: Option<Duration>,
    /// Send deadline per write call. `None` or zero blocks indefinitely.
    pub write_timeout: Option<Duration>,
    /// Disable Nagle's algorithm on the socket.
    pub nodelay: bool,
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: None,
            write_timeout: None,
            nodelay: true,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the receive deadline. A zero duration clears it.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = deadline(timeout);
        self
    }

    /// Sets the send deadline. A zero duration clears it.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = deadline(timeout);
        self
    }

    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }
}

// The OS rejects a zero socket timeout; zero means no deadline here.
fn deadline(timeout: Duration) -> Option<Duration> {
    Some(timeout).filter(|t| !t.is_zero())
}

/// Lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed, never opened.
    Uninitialized,
    /// Socket connected.
    Open,
    /// Closed explicitly, or the last open attempt failed after a close.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Uninitialized => write!(f, "uninitialized"),
            ConnectionState::Open => write!(f, "open"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

/// A blocking TCP connection to one broker.
///
/// Owns the socket and the resolved address list. Both are acquired by
/// [`open`](Connection::open) and released by [`close`](Connection::close),
/// which also runs on drop.
///
/// Reads are complete-or-error: [`read`](Connection::read) only returns `Ok`
/// once the whole buffer is filled. Writes follow the same contract through
/// [`write`](Connection::write); [`send_once`](Connection::send_once) is the
/// single-attempt primitive.
pub struct Connection {
    config: ConnectionConfig,
    stream: Option<TcpStream>,
    addrs: Option<Vec<SocketAddr>>,
    state: ConnectionState,
}

impl Connection {
    /// Creates a connection with default settings. No I/O is performed.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_config(ConnectionConfig::new(host, port))
    }

    /// Creates a connection from a configuration. No I/O is performed.
    pub fn with_config(config: ConnectionConfig) -> Self {
        Self {
            config,
            stream: None,
            addrs: None,
            state: ConnectionState::Uninitialized,
        }
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Raw descriptor of the open socket, or [`INVALID_HANDLE`].
    pub fn raw_handle(&self) -> RawHandle {
        self.stream
            .as_ref()
            .map(platform::raw_handle)
            .unwrap_or(INVALID_HANDLE)
    }

    /// Addresses resolved by the last successful [`open`](Connection::open).
    pub fn addresses(&self) -> Option<&[SocketAddr]> {
        self.addrs.as_deref()
    }

    pub fn peer_addr(&self) -> Result<SocketAddr, ClientError> {
        Ok(self.stream()?.peer_addr()?)
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ClientError> {
        Ok(self.stream()?.local_addr()?)
    }

    /// Resolves the host and connects to the first candidate address.
    ///
    /// Connection establishment is bounded by the configured connect
    /// timeout; expiry is reported as [`ClientError::ConnectTimeout`]. Any
    /// previously open socket is closed first. On failure nothing is held.
    ///
    /// Returns the raw socket descriptor.
    pub fn open(&mut self) -> Result<RawHandle, ClientError> {
        if self.stream.is_some() || self.addrs.is_some() {
            tracing::debug!("Reopening {}, closing previous socket", self);
            self.close();
        }

        platform::init();

        let addrs = self.resolve()?;
        let addr = addrs[0];
        let stream = self.connect(addr)?;

        let handle = platform::raw_handle(&stream);
        tracing::debug!("Connected to {} via {} (handle {})", self, addr, handle);

        self.stream = Some(stream);
        self.addrs = Some(addrs);
        self.state = ConnectionState::Open;
        Ok(handle)
    }

    fn resolve(&self) -> Result<Vec<SocketAddr>, ClientError> {
        let host = self.config.host.as_str();
        let port = self.config.port;
        tracing::debug!("Resolving {}...", self);

        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|source| {
                tracing::error!("Failed to resolve {}: {}", self, source);
                ClientError::Resolve {
                    host: host.to_string(),
                    port,
                    source,
                }
            })?
            .collect();

        if addrs.is_empty() {
            tracing::error!("No addresses found for {}", self);
            return Err(ClientError::NoAddresses {
                host: host.to_string(),
                port,
            });
        }

        tracing::debug!("Resolved {} to {:?}", self, addrs);
        Ok(addrs)
    }

    fn connect(&self, addr: SocketAddr) -> Result<TcpStream, ClientError> {
        let timeout = self.config.connect_timeout;

        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
            .map_err(|e| {
                tracing::error!("Failed to create socket for {}: {}", addr, e);
                ClientError::Socket(e)
            })?;

        // Non-blocking connect, poll for write readiness, then back to blocking.
        tracing::debug!("Connecting to {} (timeout {:?})...", addr, timeout);
        socket
            .connect_timeout(&SockAddr::from(addr), timeout)
            .map_err(|source| {
                if source.kind() == io::ErrorKind::TimedOut {
                    tracing::error!("Connect to {} timed out after {:?}", addr, timeout);
                    ClientError::ConnectTimeout { addr, timeout }
                } else {
                    tracing::error!("Connect to {} failed: {}", addr, source);
                    ClientError::Connect { addr, source }
                }
            })?;

        let stream: TcpStream = socket.into();
        if self.config.nodelay {
            stream.set_nodelay(true).ok();
        }
        stream.set_read_timeout(self.config.read_timeout.and_then(deadline))?;
        stream.set_write_timeout(self.config.write_timeout.and_then(deadline))?;
        Ok(stream)
    }

    /// Releases the socket and the address list. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(addrs) = self.addrs.take() {
            tracing::debug!("Releasing {} resolved address(es)", addrs.len());
        }
        if let Some(stream) = self.stream.take() {
            tracing::debug!(
                "Closing connection to {} (handle {})",
                self,
                platform::raw_handle(&stream)
            );
            drop(stream);
        }
        self.state = ConnectionState::Closed;
    }

    /// Fills `buf` completely from the socket.
    ///
    /// Returns `buf.len()` on success. If the peer closes the connection or a
    /// receive fails first, returns [`ClientError::ShortRead`] carrying the
    /// number of bytes gathered so far.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, ClientError> {
        let expected = buf.len();
        let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;
        let mut read = 0;

        while read < expected {
            match stream.read(&mut buf[read..]) {
                Ok(0) => {
                    tracing::warn!("Peer closed connection after {}/{} bytes", read, expected);
                    return Err(ClientError::ShortRead {
                        read,
                        expected,
                        source: None,
                    });
                }
                Ok(n) => {
                    read += n;
                    tracing::trace!("Read {} bytes ({}/{})", n, read, expected);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("Receive failed after {}/{} bytes: {}", read, expected, e);
                    return Err(ClientError::ShortRead {
                        read,
                        expected,
                        source: Some(e),
                    });
                }
            }
        }

        tracing::debug!("Received {} bytes", read);
        Ok(read)
    }

    /// Reads exactly `len` bytes into a new buffer.
    pub fn read_exact_vec(&mut self, len: usize) -> Result<Vec<u8>, ClientError> {
        let mut buf = vec![0u8; len];
        self.read(&mut buf)?;
        Ok(buf)
    }

    /// Sends all of `buf`.
    ///
    /// Returns `buf.len()` on success. If a send fails part-way, returns
    /// [`ClientError::ShortWrite`] carrying the number of bytes the kernel
    /// accepted; the connection should be reopened before further use.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize, ClientError> {
        let expected = buf.len();
        let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;
        let mut written = 0;

        while written < expected {
            match stream.write(&buf[written..]) {
                Ok(0) => {
                    tracing::warn!("Send accepted 0 bytes after {}/{}", written, expected);
                    return Err(ClientError::ShortWrite {
                        written,
                        expected,
                        source: Some(io::ErrorKind::WriteZero.into()),
                    });
                }
                Ok(n) => {
                    written += n;
                    tracing::trace!("Wrote {} bytes ({}/{})", n, written, expected);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("Send failed after {}/{} bytes: {}", written, expected, e);
                    return Err(ClientError::ShortWrite {
                        written,
                        expected,
                        source: Some(e),
                    });
                }
            }
        }

        tracing::debug!("Sent {} bytes", written);
        Ok(written)
    }

    /// Issues a single send and returns how many bytes the kernel accepted,
    /// which may be fewer than `buf.len()`.
    pub fn send_once(&mut self, buf: &[u8]) -> Result<usize, ClientError> {
        let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;
        loop {
            match stream.write(buf) {
                Ok(n) => {
                    tracing::debug!("Sent {}/{} bytes", n, buf.len());
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("Send failed: {}", e);
                    return Err(ClientError::Io(e));
                }
            }
        }
    }

    fn stream(&self) -> Result<&TcpStream, ClientError> {
        self.stream.as_ref().ok_or(ClientError::NotConnected)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.config.host.contains(':') {
            write!(f, "[{}]:{}", self.config.host, self.config.port)
        } else {
            write!(f, "{}:{}", self.config.host, self.config.port)
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("state", &self.state)
            .field("handle", &self.raw_handle())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[test]
    fn test_config_defaults() {
        let config = ConnectionConfig::new("localhost", 9092);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 9092);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.read_timeout, None);
        assert_eq!(config.write_timeout, None);
        assert!(config.nodelay);
    }

    #[test]
    fn test_config_builder() {
        let config = ConnectionConfig::new("broker-1", 9093)
            .with_connect_timeout(Duration::from_millis(250))
            .with_read_timeout(Duration::from_secs(1))
            .with_write_timeout(Duration::from_secs(2))
            .with_nodelay(false);
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert_eq!(config.read_timeout, Some(Duration::from_secs(1)));
        assert_eq!(config.write_timeout, Some(Duration::from_secs(2)));
        assert!(!config.nodelay);
    }

    #[test]
    fn test_zero_timeouts_clear_deadlines() {
        let config = ConnectionConfig::new("broker-1", 9093)
            .with_read_timeout(Duration::from_secs(1))
            .with_read_timeout(Duration::ZERO)
            .with_write_timeout(Duration::ZERO);
        assert_eq!(config.read_timeout, None);
        assert_eq!(config.write_timeout, None);
    }

    #[test]
    fn test_open_with_zero_timeouts() {
        let (_listener, port) = listener();
        let mut config = ConnectionConfig::new("127.0.0.1", port).with_read_timeout(Duration::ZERO);
        config.write_timeout = Some(Duration::ZERO);
        let mut conn = Connection::with_config(config);

        conn.open().unwrap();
        assert_eq!(conn.state(), ConnectionState::Open);
        let stream = conn.stream.as_ref().unwrap();
        assert_eq!(stream.read_timeout().unwrap(), None);
        assert_eq!(stream.write_timeout().unwrap(), None);
    }

    #[test]
    fn test_new_performs_no_io() {
        let conn = Connection::new("broker.invalid", 9092);
        assert_eq!(conn.state(), ConnectionState::Uninitialized);
        assert!(!conn.is_open());
        assert_eq!(conn.raw_handle(), INVALID_HANDLE);
        assert!(conn.addresses().is_none());
    }

    #[test]
    fn test_close_before_open_is_safe() {
        let mut conn = Connection::new("127.0.0.1", 9092);
        conn.close();
        conn.close();
        conn.close();
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert_eq!(conn.raw_handle(), INVALID_HANDLE);
    }

    #[test]
    fn test_io_requires_open() {
        let mut conn = Connection::new("127.0.0.1", 9092);
        let mut buf = [0u8; 4];
        assert!(matches!(conn.read(&mut buf), Err(ClientError::NotConnected)));
        assert!(matches!(conn.write(b"ping"), Err(ClientError::NotConnected)));
        assert!(matches!(conn.send_once(b"ping"), Err(ClientError::NotConnected)));
        assert!(matches!(conn.peer_addr(), Err(ClientError::NotConnected)));
    }

    #[test]
    fn test_open_close_lifecycle() {
        let (listener, port) = listener();
        let mut conn = Connection::new("127.0.0.1", port);

        let handle = conn.open().unwrap();
        assert!(handle >= 0);
        assert_eq!(conn.raw_handle(), handle);
        assert_eq!(conn.state(), ConnectionState::Open);
        assert_eq!(conn.addresses().map(|a| a.len()), Some(1));
        assert_eq!(conn.peer_addr().unwrap(), listener.local_addr().unwrap());

        conn.close();
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert!(!conn.is_open());
        assert!(conn.addresses().is_none());
        conn.close();
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_reopen_replaces_socket() {
        let (listener, port) = listener();
        let mut conn = Connection::new("127.0.0.1", port);

        conn.open().unwrap();
        let first = conn.local_addr().unwrap();
        conn.open().unwrap();
        let second = conn.local_addr().unwrap();
        assert_ne!(first, second);
        assert_eq!(conn.state(), ConnectionState::Open);

        conn.close();
        conn.open().unwrap();
        assert!(conn.is_open());
        drop(listener);
    }

    #[test]
    fn test_empty_buffers() {
        let (_listener, port) = listener();
        let mut conn = Connection::new("127.0.0.1", port);
        conn.open().unwrap();
        let mut empty: [u8; 0] = [];
        assert_eq!(conn.read(&mut empty).unwrap(), 0);
        assert_eq!(conn.write(&empty).unwrap(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Connection::new("broker-1", 9092).to_string(), "broker-1:9092");
        assert_eq!(Connection::new("::1", 9092).to_string(), "[::1]:9092");
        assert_eq!(ConnectionState::Open.to_string(), "open");
        assert!(format!("{:?}", Connection::new("b", 1)).contains("Uninitialized"));
    }
}
