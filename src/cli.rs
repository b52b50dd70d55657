//! Command-line interface definition using clap
//!
//! Provides structured argument parsing with automatic help generation.

use crate::config::TransportKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

// =============================================================================
// CLI Definition
// =============================================================================

/// Framed request/reply over serial lines, TCP and UDP sockets
#[derive(Parser, Debug)]
#[command(name = "unicom")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports present on this machine
    Ports,

    /// Send one payload and print the reply
    Send(SendArgs),
}

/// Transport selector on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportArg {
    Serial,
    Tcp,
    Udp,
}

impl From<TransportArg> for TransportKind {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Serial => TransportKind::Serial,
            TransportArg::Tcp => TransportKind::Tcp,
            TransportArg::Udp => TransportKind::Udp,
        }
    }
}

/// Flags override values from `--config`
#[derive(Args, Debug)]
pub struct SendArgs {
    /// TOML config file describing the channel and exchange
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Transport to use
    #[arg(short, long, value_enum)]
    pub transport: Option<TransportArg>,

    /// Serial port name, or HOST:PORT for sockets
    #[arg(long, value_name = "TARGET")]
    pub target: Option<String>,

    /// Serial baud rate
    #[arg(long, value_name = "BAUD")]
    pub baud: Option<u32>,

    /// Connect/read timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// End-of-transmission marker (escapes: \r \n \t \\ \xNN)
    #[arg(long, value_name = "BYTES")]
    pub eot: Option<String>,

    /// Read a reply in chunks of SIZE bytes
    #[arg(long, value_name = "SIZE")]
    pub size: Option<usize>,

    /// Read until this terminator (escapes as for --eot)
    #[arg(long, value_name = "BYTES")]
    pub terminator: Option<String>,

    /// Wait before reading the reply, in milliseconds
    #[arg(long, value_name = "MS")]
    pub await_ms: Option<u64>,

    /// Print the reply as hex instead of text
    #[arg(long)]
    pub hex: bool,

    /// Payload to send (escapes as for --eot)
    pub payload: String,
}

/// Expand `\r`, `\n`, `\t`, `\0`, `\\` and `\xNN` escapes
pub fn unescape(input: &str) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(input.len());
    let mut bytes = input.bytes();
    while let Some(b) = bytes.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }
        match bytes.next() {
            Some(b'r') => out.push(b'\r'),
            Some(b'n') => out.push(b'\n'),
            Some(b't') => out.push(b'\t'),
            Some(b'0') => out.push(0),
            Some(b'\\') => out.push(b'\\'),
            Some(b'x') => {
                let hex: Vec<u8> = bytes.by_ref().take(2).collect();
                let value = std::str::from_utf8(&hex)
                    .ok()
                    .filter(|h| h.len() == 2)
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| format!("invalid \\x escape in {:?}", input))?;
                out.push(value);
            }
            Some(other) => return Err(format!("unknown escape \\{} in {:?}", other as char, input)),
            None => return Err(format!("dangling backslash in {:?}", input)),
        }
    }
    Ok(out)
}

/// Split `HOST:PORT` (IPv6 hosts may be bracketed)
pub fn split_host_port(target: &str) -> Result<(String, u16), String> {
    let (host, port) = target
        .rsplit_once(':')
        .ok_or_else(|| format!("expected HOST:PORT, got {:?}", target))?;
    let port = port
        .parse()
        .map_err(|_| format!("invalid port in {:?}", target))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    Ok((host.to_string(), port))
}

// =============================================================================
// Tests
// =============================================================================
