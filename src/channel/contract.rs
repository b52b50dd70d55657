//! Capability contract shared by every channel
//!
//! Callers that must not care about the medium hold a
//! `Box<dyn Communication>`; socket channels additionally offer `Validated`.

use super::{Channel, Reply};
use crate::transport::{SocketTransport, Transport};
use bytes::Bytes;

/// What every channel can do, regardless of transport
pub trait Communication: Send {
    /// Current liveness of the underlying transport
    fn is_connected(&self) -> bool;

    /// Seconds since the Unix epoch of the most recent operation attempt
    fn last_use(&self) -> f64;

    /// Open the transport; failures are reported, never returned
    fn connect(&mut self);

    /// Send `data` and optionally read a reply (see `Channel::send_bytes`)
    fn send_bytes(&mut self, data: &[u8], reply: &Reply) -> Bytes;

    /// Read a reply (see `Channel::receive_bytes`)
    fn receive_bytes(&mut self, size: usize, terminator: Option<&[u8]>) -> Bytes;

    /// Close the transport. Idempotent.
    fn disconnect(&mut self);
}

/// Caller-driven acknowledgment flag, orthogonal to liveness
pub trait Validated: Communication {
    fn is_valid(&self) -> bool;
    fn set_validation(&mut self, status: bool);
}

impl<T: Transport> Communication for Channel<T> {
    fn is_connected(&self) -> bool {
        Channel::is_connected(self)
    }

    fn last_use(&self) -> f64 {
        Channel::last_use(self)
    }

    fn connect(&mut self) {
        Channel::connect(self)
    }

    fn send_bytes(&mut self, data: &[u8], reply: &Reply) -> Bytes {
        Channel::send_bytes(self, data, reply)
    }

    fn receive_bytes(&mut self, size: usize, terminator: Option<&[u8]>) -> Bytes {
        Channel::receive_bytes(self, size, terminator)
    }

    fn disconnect(&mut self) {
        Channel::disconnect(self)
    }
}

impl Validated for Channel<SocketTransport> {
    fn is_valid(&self) -> bool {
        Channel::is_valid(self)
    }

    fn set_validation(&mut self, status: bool) {
        Channel::set_validation(self, status)
    }
}
