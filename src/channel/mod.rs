//! Framed byte channels over any transport
//!
//! A `Channel` wraps exactly one `Transport` and owns the whole exchange
//! discipline:
//! - appending the end-of-transmission marker on send
//! - looping chunked reads until a terminator (or one fixed-size read)
//! - tracking liveness, last use and the caller-driven validity flag
//! - turning every transport error into disconnect + report + empty result
//!
//! No public operation ever returns an error or panics on I/O failure.
//! Callers observe failures through the returned bytes, `is_connected()`
//! flipping to false, or the injected `Reporter`.

mod contract;
pub mod frame;

pub use contract::{Communication, Validated};

use crate::logging::{default_reporter, Reporter};
use crate::transport::{SerialSettings, SerialTransport, SocketTransport, Transport};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Construction-time channel options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelOptions {
    /// Connect/read/write timeout. `None` blocks indefinitely.
    pub timeout: Option<Duration>,
    /// End-of-transmission marker appended to every outgoing payload
    pub eot: Option<Bytes>,
}

impl ChannelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn eot(mut self, eot: impl AsRef<[u8]>) -> Self {
        self.eot = Some(Bytes::copy_from_slice(eot.as_ref()));
        self
    }
}

/// What to read back after a send
///
/// ```ignore
/// // Fire and forget
/// channel.send_bytes(b"RST", &Reply::none());
/// // Read up to 64-byte chunks until "\r\n", after giving the device 50ms
/// let reply = channel.send_bytes(
///     b"MEAS?",
///     &Reply::size(64).until(b"\r\n").after(Duration::from_millis(50)),
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// Chunk size. `None` or zero means no receive.
    pub size: Option<usize>,
    /// Frame terminator. `None` means a single chunk read.
    pub terminator: Option<Bytes>,
    /// Pause between a successful write and the first read
    pub await_receive: Duration,
}

impl Reply {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn size(size: usize) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    pub fn until(mut self, terminator: impl AsRef<[u8]>) -> Self {
        self.terminator = Some(Bytes::copy_from_slice(terminator.as_ref()));
        self
    }

    pub fn after(mut self, await_receive: Duration) -> Self {
        self.await_receive = await_receive;
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Connect,
    Send,
    Receive,
    Clear,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "Connect",
            Self::Send => "Send",
            Self::Receive => "Receive",
            Self::Clear => "Clear",
        };
        f.write_str(name)
    }
}

/// Byte rendering used in failure reports (`b"PING\r\n"`)
fn escaped(data: &[u8]) -> String {
    format!("b\"{}\"", data.escape_ascii())
}

/// One logical connection over one exclusively owned transport
///
/// Not synchronized: one transaction at a time per instance. Wrap the
/// channel in a mutex if several threads must share it.
pub struct Channel<T: Transport> {
    transport: T,
    options: ChannelOptions,
    reporter: Arc<dyn Reporter>,
    last_use: DateTime<Utc>,
    valid: bool,
}

/// Serial line channel
pub type SerialChannel = Channel<SerialTransport>;

/// TCP or UDP channel
pub type SocketChannel = Channel<SocketTransport>;

impl<T: Transport> Channel<T> {
    /// Create a channel. No I/O happens until `connect()`.
    pub fn new(transport: T, options: ChannelOptions) -> Self {
        Self {
            transport,
            options,
            reporter: default_reporter(),
            last_use: Utc::now(),
            valid: false,
        }
    }

    /// Replace the failure sink
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn options(&self) -> &ChannelOptions {
        &self.options
    }

    /// Whether the transport currently holds an open handle
    pub fn is_connected(&self) -> bool {
        self.transport.is_open()
    }

    /// Seconds since the Unix epoch of the last operation attempt
    pub fn last_use(&self) -> f64 {
        self.last_use.timestamp_micros() as f64 / 1_000_000.0
    }

    pub fn last_use_at(&self) -> DateTime<Utc> {
        self.last_use
    }

    /// Open the transport
    ///
    /// Never fails loudly: on error the failure is reported and the channel
    /// stays disconnected. Calling it on an open channel only marks use.
    pub fn connect(&mut self) {
        self.touch();
        if self.transport.is_open() {
            return;
        }
        match self.transport.open(self.options.timeout) {
            Ok(()) => {
                self.valid = true;
                debug!("{} connected to {}", self.transport.component(), self.transport);
            }
            Err(e) => {
                self.disconnect();
                let device = self.transport.to_string();
                self.report(Operation::Connect, &e, &device);
            }
        }
    }

    /// Close the transport. Idempotent.
    pub fn disconnect(&mut self) {
        self.valid = false;
        if self.transport.is_open() {
            debug!("{} disconnecting from {}", self.transport.component(), self.transport);
        }
        self.transport.close();
    }

    /// Write `data` (plus the eot marker) and optionally read a reply
    ///
    /// Returns the reply bytes, or empty bytes when no reply was requested,
    /// the channel is not connected, or the write failed.
    pub fn send_bytes(&mut self, data: &[u8], reply: &Reply) -> Bytes {
        if !self.transport.is_open() {
            return Bytes::new();
        }
        self.touch();

        let payload = self.wire_payload(data);
        if let Err(e) = self.transport.write(&payload) {
            let context = escaped(&payload);
            self.fail(Operation::Send, &e, &context);
            return Bytes::new();
        }
        trace!("{} sent {}", self.transport.component(), escaped(&payload));

        let size = match reply.size {
            Some(size) if size > 0 => size,
            _ => return Bytes::new(),
        };
        if !reply.await_receive.is_zero() {
            std::thread::sleep(reply.await_receive);
        }
        self.receive_bytes(size, reply.terminator.as_deref())
    }

    /// Read a reply
    ///
    /// Without a terminator: one chunk of up to `size` bytes, verbatim.
    /// With a terminator: chunks of up to `size` bytes until the terminator
    /// appears, trimmed before its last occurrence. A failed or empty chunk
    /// ends the loop early; the partial frame is still returned.
    pub fn receive_bytes(&mut self, size: usize, terminator: Option<&[u8]>) -> Bytes {
        if !self.transport.is_open() {
            return Bytes::new();
        }
        let frame = match terminator.filter(|t| !t.is_empty()) {
            None => self.read_chunk(size, &[]).unwrap_or_default(),
            Some(terminator) => frame::collect(terminator, |acc| self.read_chunk(size, acc)),
        };
        trace!("{} received {}", self.transport.component(), escaped(&frame));
        frame
    }

    /// Discard input received but not yet read
    pub fn clear_buffer(&mut self) {
        if !self.transport.is_open() {
            return;
        }
        self.touch();
        if let Err(e) = self.transport.clear_input() {
            let device = self.transport.to_string();
            self.fail(Operation::Clear, &e, &device);
        }
    }

    /// One primitive read. `None` means the read failed and the channel is down.
    fn read_chunk(&mut self, size: usize, partial: &[u8]) -> Option<Bytes> {
        if !self.transport.is_open() {
            return None;
        }
        self.touch();
        match self.transport.read(size) {
            Ok(chunk) => Some(chunk),
            Err(e) => {
                let context = escaped(partial);
                self.fail(Operation::Receive, &e, &context);
                None
            }
        }
    }

    fn wire_payload<'a>(&self, data: &'a [u8]) -> Cow<'a, [u8]> {
        match &self.options.eot {
            Some(eot) => {
                let mut payload = Vec::with_capacity(data.len() + eot.len());
                payload.extend_from_slice(data);
                payload.extend_from_slice(eot);
                Cow::Owned(payload)
            }
            None => Cow::Borrowed(data),
        }
    }

    /// Last use never moves backwards, even if the wall clock does
    fn touch(&mut self) {
        self.last_use = self.last_use.max(Utc::now());
    }

    fn fail(&mut self, operation: Operation, error: &dyn fmt::Display, context: &str) {
        self.disconnect();
        self.report(operation, error, context);
    }

    fn report(&self, operation: Operation, error: &dyn fmt::Display, context: &str) {
        let message = format!("{}: {}, {}", operation, error, context);
        self.reporter.report(self.transport.component(), &message);
    }
}

impl Channel<SerialTransport> {
    /// Serial line channel
    pub fn serial(settings: SerialSettings, options: ChannelOptions) -> Self {
        Self::new(SerialTransport::new(settings), options)
    }
}

impl Channel<SocketTransport> {
    /// TCP stream channel to `host:port`
    pub fn tcp(host: impl Into<String>, port: u16, options: ChannelOptions) -> Self {
        Self::new(SocketTransport::tcp(host, port), options)
    }

    /// UDP datagram channel to `host:port`
    pub fn udp(host: impl Into<String>, port: u16, options: ChannelOptions) -> Self {
        Self::new(SocketTransport::udp(host, port), options)
    }

    /// Whether the caller accepted the last exchanged payload
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Mark the last exchanged payload as accepted or rejected
    pub fn set_validation(&mut self, status: bool) {
        self.valid = status;
    }
}
