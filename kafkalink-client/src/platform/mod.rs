//! Platform socket support.
//!
//! Socket creation, connect and I/O go through `socket2` and `std::net`, which
//! already hide the Berkeley/Winsock split. What remains platform-specific is
//! process-wide socket library start-up and extracting the raw descriptor.

use std::net::TcpStream;
use std::sync::Once;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use unix as imp;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use windows as imp;

/// Raw OS socket descriptor widened to a signed integer.
///
/// Non-negative for a live socket on every platform.
pub type RawHandle = i64;

/// Sentinel meaning "no valid connection".
pub const INVALID_HANDLE: RawHandle = -1;

static INIT: Once = Once::new();

/// Initializes the native socket library for this process.
///
/// Idempotent and thread-safe. Called before the first socket is created.
pub fn init() {
    INIT.call_once(|| {
        imp::startup();
        tracing::debug!("socket library initialized ({})", imp::NAME);
    });
}

#[cfg(test)]
fn is_initialized() -> bool {
    INIT.is_completed()
}

/// Returns the raw descriptor backing `stream`.
pub fn raw_handle(stream: &TcpStream) -> RawHandle {
    imp::raw_handle(stream)
}
