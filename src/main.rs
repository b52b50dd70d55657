//! unicom - one framed request/reply over a serial line, TCP or UDP socket
//!
//! Usage:
//!   unicom ports
//!   unicom send --transport serial --target /dev/ttyUSB0 --baud 115200 --eot '\r\n' --size 64 --terminator '\r\n' '*IDN?'
//!   unicom send --transport tcp --target 192.168.1.20:5025 --size 256 --terminator '\n' 'MEAS:VOLT?'
//!   unicom send --config bench.toml 'MEAS:VOLT?'

use anyhow::{anyhow, bail, Result};
use bytes::Bytes;
use clap::Parser;
use std::fmt::Write as _;
use tracing::debug;
use unicom::cli::{self, Cli, Command, SendArgs};
use unicom::config::{self, Config, TransportKind};
use unicom::constants::DEFAULT_CHUNK_SIZE;
use unicom::logging::{self, default_reporter};
use unicom::transport::serial;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    match cli.command {
        Command::Ports => run_ports(),
        Command::Send(args) => run_send(args),
    }
}

fn run_ports() -> Result<()> {
    let ports = serial::available_ports()?;
    if ports.is_empty() {
        eprintln!("No serial ports found.");
    }
    for port in ports {
        match port.port_type {
            serialport::SerialPortType::UsbPort(usb) => println!(
                "{}\tusb {:04x}:{:04x}\t{}",
                port.port_name,
                usb.vid,
                usb.pid,
                usb.product.unwrap_or_default()
            ),
            other => println!("{}\t{:?}", port.port_name, other),
        }
    }
    Ok(())
}

fn run_send(args: SendArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    config.validate()?;
    debug!("Resolved config: {:?}", config);

    let payload = cli::unescape(&args.payload).map_err(|e| anyhow!(e))?;
    let reply = config.exchange.reply();

    let mut channel = config.channel.build(default_reporter())?;
    channel.connect();
    if !channel.is_connected() {
        bail!("Could not connect ({:?})", config.channel.transport);
    }

    let response = channel.send_bytes(&payload, &reply);
    let still_connected = channel.is_connected();
    channel.disconnect();

    if !still_connected {
        bail!("Channel failed during the exchange");
    }
    if reply.size.is_some() {
        println!("{}", render(&response, args.hex));
    }
    Ok(())
}

/// Config file (if any) with command-line flags layered on top
fn resolve_config(args: &SendArgs) -> Result<Config> {
    let mut cfg = match &args.config {
        Some(path) => config::load(path)?,
        None => Config::default(),
    };

    if let Some(transport) = args.transport {
        cfg.channel.transport = transport.into();
    }
    if let Some(target) = &args.target {
        match cfg.channel.transport {
            TransportKind::Serial => cfg.channel.serial.port = target.clone(),
            TransportKind::Tcp | TransportKind::Udp => {
                let (host, port) = cli::split_host_port(target).map_err(|e| anyhow!(e))?;
                cfg.channel.host = host;
                cfg.channel.port = port;
            }
        }
    }
    if let Some(baud) = args.baud {
        cfg.channel.serial.baud_rate = baud;
    }
    if let Some(timeout) = args.timeout {
        cfg.channel.timeout_secs = Some(timeout);
    }
    if let Some(eot) = &args.eot {
        cfg.channel.eot = Some(cli::unescape(eot).map_err(|e| anyhow!(e))?);
    }
    if let Some(terminator) = &args.terminator {
        cfg.exchange.terminator = Some(cli::unescape(terminator).map_err(|e| anyhow!(e))?);
        if cfg.exchange.receive_size.is_none() {
            cfg.exchange.receive_size = Some(DEFAULT_CHUNK_SIZE);
        }
    }
    if let Some(size) = args.size {
        cfg.exchange.receive_size = Some(size);
    }
    if let Some(ms) = args.await_ms {
        cfg.exchange.await_receive_ms = ms;
    }
    Ok(cfg)
}

fn render(data: &Bytes, hex: bool) -> String {
    if hex {
        let mut out = String::with_capacity(data.len() * 3);
        for (i, byte) in data.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{:02x}", byte);
        }
        out
    } else {
        String::from_utf8_lossy(data).into_owned()
    }
}
