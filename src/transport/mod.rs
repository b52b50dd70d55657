//! Transport primitives for byte-level I/O
//!
//! Separates I/O concerns from the framed exchange protocol:
//! - **Transport**: How bytes flow (Serial, TCP, UDP...)
//! - **Channel**: Lifecycle, eot marker, terminator scanning (see `crate::channel`)
//!
//! Every transport is synchronous and blocking. Timeouts are configured once
//! at `open()` and apply to every subsequent read and write.
//!
//! # Adding a new transport
//!
//! 1. Create `transport/my_transport.rs`
//! 2. Implement the `Transport` trait
//! 3. Add `pub mod my_transport;` here
//! 4. `Channel<MyTransport>` gets the whole protocol for free

pub mod serial;
pub mod socket;

pub use serial::{SerialSettings, SerialTransport};
pub use socket::{SocketKind, SocketTransport};

use bytes::Bytes;
use std::fmt;
use std::io::ErrorKind;
use std::time::Duration;

use crate::error::Result;

/// Primitive operations a medium must offer to carry a channel
///
/// A transport does NOT handle:
/// - Appending the eot marker or scanning for terminators
/// - Tracking last use or validity
/// - Reporting failures (errors are returned, the channel reports them)
///
/// `Display` renders the device description (port settings, host:port)
/// used in connect-failure reports.
pub trait Transport: fmt::Display + Send {
    /// Component name used to identify the channel in failure reports
    fn component(&self) -> &'static str;

    /// Open a fresh handle to the medium
    ///
    /// `timeout` bounds connection establishment and every later read/write.
    /// `None` means block indefinitely.
    fn open(&mut self, timeout: Option<Duration>) -> Result<()>;

    /// Whether a handle is currently held
    fn is_open(&self) -> bool;

    /// Write all bytes and flush them to the medium
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read one chunk of at most `max` bytes
    ///
    /// Serial lines return whatever arrived before the timeout, possibly an
    /// empty chunk. Sockets return an expired timeout as `UniComError::Read`,
    /// which the channel handles like any other failed read.
    fn read(&mut self, max: usize) -> Result<Bytes>;

    /// Drop the handle. Safe to call when already closed.
    fn close(&mut self);

    /// Discard any input received but not yet read
    fn clear_input(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Whether an I/O error is just an expired serial read timeout
pub(crate) fn is_timeout(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_kinds() {
        assert!(is_timeout(ErrorKind::TimedOut));
        assert!(is_timeout(ErrorKind::WouldBlock));
        assert!(!is_timeout(ErrorKind::ConnectionReset));
        assert!(!is_timeout(ErrorKind::BrokenPipe));
    }
}
