//! Socket transport for TCP streams and UDP datagrams
//!
//! Both kinds share one implementation built on `socket2`; they differ only
//! in the socket type and protocol. The address family follows the resolved
//! peer address. Datagram sockets are connected to their peer so that plain
//! send/recv are bound to it, just like a stream.
//!
//! The OS socket is created at `open()`, so a socket channel can reconnect
//! after `disconnect()`.

use super::Transport;
use crate::error::{Result, UniComError};
use bytes::Bytes;
use socket2::{Domain, Protocol, Socket, Type};
use std::fmt;
use std::io::{Read, Write};
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;
use tracing::debug;

/// Socket flavour carried by a `SocketTransport`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketKind {
    /// TCP stream
    Stream,
    /// UDP datagram
    Datagram,
}

impl SocketKind {
    fn socket_type(self) -> Type {
        match self {
            Self::Stream => Type::STREAM,
            Self::Datagram => Type::DGRAM,
        }
    }

    fn protocol(self) -> Protocol {
        match self {
            Self::Stream => Protocol::TCP,
            Self::Datagram => Protocol::UDP,
        }
    }
}

/// Socket transport to a fixed `host:port` peer
pub struct SocketTransport {
    host: String,
    port: u16,
    kind: SocketKind,
    socket: Option<Socket>,
}

impl SocketTransport {
    pub fn new(host: impl Into<String>, port: u16, kind: SocketKind) -> Self {
        Self {
            host: host.into(),
            port,
            kind,
            socket: None,
        }
    }

    /// TCP stream transport
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, SocketKind::Stream)
    }

    /// UDP datagram transport
    pub fn udp(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, SocketKind::Datagram)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn kind(&self) -> SocketKind {
        self.kind
    }

    /// Local address of the open socket, if any
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket
            .as_ref()
            .and_then(|s| s.local_addr().ok())
            .and_then(|a| a.as_socket())
    }

    fn resolve(&self) -> Result<SocketAddr> {
        let map_err = |source| UniComError::Resolve {
            target: self.to_string(),
            source,
        };
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(map_err)?
            .next()
            .ok_or_else(|| {
                map_err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no addresses found",
                ))
            })
    }

    fn socket_mut(&mut self) -> Result<&mut Socket> {
        self.socket.as_mut().ok_or(UniComError::NotOpen)
    }
}

impl fmt::Display for SocketTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl Transport for SocketTransport {
    fn component(&self) -> &'static str {
        match self.kind {
            SocketKind::Stream => "TcpChannel",
            SocketKind::Datagram => "UdpChannel",
        }
    }

    fn open(&mut self, timeout: Option<Duration>) -> Result<()> {
        let addr = self.resolve()?;
        let map_err = |source| UniComError::SocketConnect {
            target: self.to_string(),
            source,
        };

        // A zero duration is rejected by setsockopt; treat it as "no timeout"
        let timeout = timeout.filter(|t| !t.is_zero());

        let socket = Socket::new(
            Domain::for_address(addr),
            self.kind.socket_type(),
            Some(self.kind.protocol()),
        )
        .map_err(map_err)?;
        socket.set_read_timeout(timeout).map_err(map_err)?;
        socket.set_write_timeout(timeout).map_err(map_err)?;

        let connected = match (self.kind, timeout) {
            (SocketKind::Stream, Some(t)) => socket.connect_timeout(&addr.into(), t),
            _ => socket.connect(&addr.into()),
        };
        connected.map_err(map_err)?;

        debug!("Connected {:?} socket to {}", self.kind, addr);
        self.socket = Some(socket);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let socket = self.socket_mut()?;
        socket
            .write_all(data)
            .and_then(|_| socket.flush())
            .map_err(|source| UniComError::Write { source })
    }

    fn read(&mut self, max: usize) -> Result<Bytes> {
        let socket = self.socket_mut()?;
        if max == 0 {
            return Ok(Bytes::new());
        }
        let mut buf = vec![0u8; max];
        // An expired timeout (WouldBlock/TimedOut) is a failed read too
        let n = socket
            .read(&mut buf)
            .map_err(|source| UniComError::Read { source })?;
        buf.truncate(n);
        Ok(Bytes::from(buf))
    }

    fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            if self.kind == SocketKind::Stream {
                let _ = socket.shutdown(std::net::Shutdown::Both);
            }
            debug!("Closed socket to {}", self);
        }
    }
}
