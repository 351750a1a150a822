//! Berkeley sockets.

use super::RawHandle;
use std::net::TcpStream;
use std::os::unix::io::AsRawFd;

pub(super) const NAME: &str = "bsd";

/// Nothing to start; descriptors are usable as soon as the process runs.
pub(super) fn startup() {}

pub(super) fn raw_handle(stream: &TcpStream) -> RawHandle {
    RawHandle::from(stream.as_raw_fd())
}
