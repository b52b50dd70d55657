//! Integration tests for framed channels
//!
//! Exercises the public API against a mock transport and against real
//! loopback TCP/UDP echo peers.

use bytes::Bytes;
use std::collections::VecDeque;
use std::fmt;
use std::io::{Read, Write};
use std::net::{TcpListener, UdpSocket};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use unicom::{
    Channel, ChannelOptions, Communication, MemoryReporter, Reply, Result, Transport,
    UniComError, Validated,
};

// =============================================================================
// Mock Transport
// =============================================================================

/// Mock transport that replays canned chunks and captures writes
#[derive(Default)]
pub struct MockTransport {
    open: bool,
    chunks: VecDeque<Bytes>,
    captured: Vec<Bytes>,
    broken: bool,
}

impl MockTransport {
    pub fn new(chunks: &[&'static [u8]]) -> Self {
        Self {
            chunks: chunks.iter().copied().map(Bytes::from_static).collect(),
            ..Self::default()
        }
    }

    /// Every write fails after open
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }
}

impl fmt::Display for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mock")
    }
}

impl Transport for MockTransport {
    fn component(&self) -> &'static str {
        "MockChannel"
    }

    fn open(&mut self, _timeout: Option<Duration>) -> Result<()> {
        self.open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.broken {
            return Err(UniComError::Write {
                source: std::io::Error::from(std::io::ErrorKind::BrokenPipe),
            });
        }
        self.captured.push(Bytes::copy_from_slice(data));
        Ok(())
    }

    fn read(&mut self, max: usize) -> Result<Bytes> {
        match self.chunks.pop_front() {
            Some(mut chunk) if chunk.len() > max => {
                let head = chunk.split_to(max);
                self.chunks.push_front(chunk);
                Ok(head)
            }
            Some(chunk) => Ok(chunk),
            None => Ok(Bytes::new()),
        }
    }

    fn close(&mut self) {
        self.open = false;
    }
}

// =============================================================================
// Loopback peers
// =============================================================================

/// TCP echo server handling a single client; returns its port
fn spawn_tcp_echo() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 1024];
            loop {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if stream.write_all(&buf[..n]).is_err() {
                            break;
                        }
                    }
                }
            }
        }
    });
    port
}

/// UDP echo peer answering `count` datagrams; returns its port
fn spawn_udp_echo(count: usize) -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let port = socket.local_addr().unwrap().port();
    thread::spawn(move || {
        let mut buf = [0u8; 1024];
        for _ in 0..count {
            match socket.recv_from(&mut buf) {
                Ok((n, from)) => {
                    let _ = socket.send_to(&buf[..n], from);
                }
                Err(_) => break,
            }
        }
    });
    port
}

fn options() -> ChannelOptions {
    ChannelOptions::new().timeout(Duration::from_secs(2))
}

// =============================================================================
// Mock-backed tests
// =============================================================================

#[test]
fn test_mock_exchange_with_eot_and_terminator() {
    let reporter = Arc::new(MemoryReporter::new());
    let mut channel = Channel::new(
        MockTransport::new(&[b"+1.25", b"0E+00\r", b"\n"]),
        ChannelOptions::new().eot(b"\n"),
    )
    .with_reporter(reporter.clone());

    channel.connect();
    let reply = channel.send_bytes(b"MEAS:VOLT?", &Reply::size(4).until(b"\r\n"));

    assert_eq!(reply.as_ref(), b"+1.250E+00");
    assert_eq!(channel.transport().captured, vec![Bytes::from_static(b"MEAS:VOLT?\n")]);
    assert!(reporter.is_empty());
}

#[test]
fn test_mock_failure_never_escapes() {
    let reporter = Arc::new(MemoryReporter::new());
    let mut channel: Box<dyn Communication> = Box::new(
        Channel::new(MockTransport::broken(), ChannelOptions::new().eot(b"\r\n"))
            .with_reporter(reporter.clone()),
    );

    channel.connect();
    assert!(channel.is_connected());
    let before = channel.last_use();

    let reply = channel.send_bytes(b"PING", &Reply::size(4));

    assert!(reply.is_empty());
    assert!(!channel.is_connected());
    assert!(channel.last_use() >= before);

    let entries = reporter.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].component, "MockChannel");
    assert_eq!(
        entries[0].to_string(),
        "EXCEPTION in MockChannel, Send: Write failed: broken pipe, b\"PING\\r\\n\""
    );
}

// =============================================================================
// TCP
// =============================================================================

#[test]
fn test_tcp_echo_end_to_end() {
    let port = spawn_tcp_echo();
    let reporter = Arc::new(MemoryReporter::new());
    let mut channel = Channel::tcp("127.0.0.1", port, options()).with_reporter(reporter.clone());

    channel.connect();
    assert!(channel.is_connected());
    assert!(channel.is_valid());

    let reply = channel.send_bytes(b"hello", &Reply::size(5));
    assert_eq!(reply.as_ref(), b"hello");

    channel.disconnect();
    assert!(!channel.is_connected());
    assert!(!channel.is_valid());

    let reply = channel.send_bytes(b"hello", &Reply::size(5));
    assert!(reply.is_empty());
    assert!(!channel.is_connected());
    assert!(reporter.is_empty());
}

#[test]
fn test_tcp_terminated_reply() {
    let port = spawn_tcp_echo();
    let mut channel = Channel::tcp("127.0.0.1", port, options().eot(b"\r\n"))
        .with_reporter(Arc::new(MemoryReporter::new()));

    channel.connect();
    // Terminator-like bytes inside the payload survive; only the last one ends the frame
    let reply = channel.send_bytes(b"A\r\nB", &Reply::size(64).until(b"\r\n"));
    assert_eq!(reply.as_ref(), b"A\r\nB");
    channel.disconnect();
}

#[test]
fn test_tcp_validation_flag() {
    let port = spawn_tcp_echo();
    let mut channel = Channel::tcp("127.0.0.1", port, options())
        .with_reporter(Arc::new(MemoryReporter::new()));

    channel.connect();
    let reply = channel.send_bytes(b"BAD", &Reply::size(3));
    if reply.as_ref() != b"OK!" {
        channel.set_validation(false);
    }
    assert!(!Validated::is_valid(&channel));
    assert!(channel.is_connected());
    channel.disconnect();
}

#[test]
fn test_tcp_connect_refused_reports() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let reporter = Arc::new(MemoryReporter::new());
    let mut channel = Channel::tcp("127.0.0.1", port, options()).with_reporter(reporter.clone());

    // A stale validity flag must not survive a failed connect
    channel.set_validation(true);
    channel.connect();

    assert!(!channel.is_connected());
    assert!(!channel.is_valid());
    let entries = reporter.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].component, "TcpChannel");
    assert_eq!(entries[0].operation(), "Connect");
    assert!(entries[0].message.ends_with(&format!("127.0.0.1:{}", port)));
}

#[test]
fn test_tcp_read_timeout_disconnects_and_reports() {
    // Accepts but never answers
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let conn = listener.accept();
        thread::sleep(Duration::from_millis(300));
        drop(conn);
    });

    let reporter = Arc::new(MemoryReporter::new());
    let mut channel = Channel::tcp(
        "127.0.0.1",
        port,
        ChannelOptions::new().timeout(Duration::from_millis(50)),
    )
    .with_reporter(reporter.clone());

    channel.connect();
    assert!(channel.is_connected());
    let reply = channel.receive_bytes(8, None);

    assert!(reply.is_empty());
    assert!(!channel.is_connected());
    assert!(!channel.is_valid());
    let entries = reporter.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].component, "TcpChannel");
    assert_eq!(entries[0].operation(), "Receive");
    handle.join().unwrap();
}

#[test]
fn test_tcp_timeout_mid_frame_reports_partial() {
    // Answers without the terminator, then goes quiet
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 16];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(b"+1.2");
            thread::sleep(Duration::from_millis(300));
        }
    });

    let reporter = Arc::new(MemoryReporter::new());
    let mut channel = Channel::tcp(
        "127.0.0.1",
        port,
        ChannelOptions::new().timeout(Duration::from_millis(100)),
    )
    .with_reporter(reporter.clone());

    channel.connect();
    let reply = channel.send_bytes(b"?", &Reply::size(8).until(b"\n"));

    assert_eq!(reply.as_ref(), b"+1.2");
    assert!(!channel.is_connected());
    let entries = reporter.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].operation(), "Receive");
    assert!(entries[0].message.ends_with("b\"+1.2\""));
    handle.join().unwrap();
}

// =============================================================================
// UDP
// =============================================================================

#[test]
fn test_udp_echo_end_to_end() {
    let port = spawn_udp_echo(2);
    let reporter = Arc::new(MemoryReporter::new());
    let mut channel = Channel::udp("127.0.0.1", port, options()).with_reporter(reporter.clone());

    channel.connect();
    assert!(channel.is_connected());

    assert_eq!(channel.send_bytes(b"hello", &Reply::size(64)).as_ref(), b"hello");
    assert_eq!(
        channel
            .send_bytes(b"v=1;v=2;", &Reply::size(64).until(b";"))
            .as_ref(),
        b"v=1;v=2"
    );

    channel.disconnect();
    assert!(channel.send_bytes(b"hello", &Reply::size(64)).is_empty());
    assert!(reporter.is_empty());
}
