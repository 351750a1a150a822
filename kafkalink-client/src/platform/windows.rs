//! Winsock.

use super::RawHandle;
use std::net::{Ipv4Addr, TcpStream, UdpSocket};
use std::os::windows::io::AsRawSocket;

pub(super) const NAME: &str = "winsock";

/// Brings Winsock up through the standard library.
///
/// std calls `WSAStartup` on first socket use and `WSACleanup` once at
/// process exit, so binding a throwaway socket is enough to run start-up
/// ahead of the first connect.
pub(super) fn startup() {
    if let Err(e) = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)) {
        tracing::warn!("winsock start-up failed: {}", e);
    }
}

pub(super) fn raw_handle(stream: &TcpStream) -> RawHandle {
    // SOCKET values fit in the positive range of i64
    stream.as_raw_socket() as RawHandle
}
