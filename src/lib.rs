//! Uniform framed byte channels over serial lines, TCP and UDP sockets
//!
//! ```ignore
//! use unicom::{Channel, ChannelOptions, Reply};
//!
//! let mut channel = Channel::tcp("192.168.1.20", 5025, ChannelOptions::new().eot(b"\n"));
//! channel.connect();
//! let idn = channel.send_bytes(b"*IDN?", &Reply::size(256).until(b"\n"));
//! channel.disconnect();
//! ```

pub mod channel;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod transport;

pub use channel::{
    Channel, ChannelOptions, Communication, Reply, SerialChannel, SocketChannel, Validated,
};
pub use error::{Result, UniComError};
pub use logging::{FailureReport, MemoryReporter, Reporter};
pub use transport::{SerialSettings, SerialTransport, SocketKind, SocketTransport, Transport};
