//! Configuration management
//!
//! A TOML file describes one channel and the default exchange performed on
//! it. Every section is `#[serde(default)]` so partial files are fine.
//!
//! ```toml
//! [channel]
//! transport = "tcp"
//! host = "192.168.1.20"
//! port = 5025
//! timeout_secs = 2.0
//! eot = "\n"
//!
//! [exchange]
//! receive_size = 256
//! terminator = "\n"
//! ```
//!
//! Markers (`eot`, `terminator`) are byte sequences: either a TOML string or
//! an array of byte values such as `eot = [0xff, 0x0a]`.

use crate::channel::{Channel, ChannelOptions, Communication, Reply};
use crate::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_DATA_BITS, DEFAULT_HOST, DEFAULT_SOCKET_PORT, DEFAULT_STOP_BITS,
};
use crate::error::{Result, UniComError};
use crate::logging::Reporter;
use crate::transport::SerialSettings;
use serde::{Deserialize, Serialize};
use serialport::{DataBits, FlowControl, Parity, StopBits};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Application Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub channel: ChannelConfig,
    pub exchange: ExchangeConfig,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.channel.validate()?;
        self.exchange.validate()
    }
}

// =============================================================================
// Channel Configuration
// =============================================================================

/// Medium carrying the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Serial,
    Tcp,
    Udp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub transport: TransportKind,

    /// Peer host (tcp/udp only)
    pub host: String,

    /// Peer port (tcp/udp only)
    pub port: u16,

    /// Connect/read/write timeout in seconds (absent = block indefinitely)
    pub timeout_secs: Option<f64>,

    /// End-of-transmission marker appended to every payload
    #[serde(with = "marker", skip_serializing_if = "Option::is_none")]
    pub eot: Option<Vec<u8>>,

    /// Line settings (serial only)
    pub serial: SerialConfig,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Serial,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_SOCKET_PORT,
            timeout_secs: None,
            eot: None,
            serial: SerialConfig::default(),
        }
    }
}

impl ChannelConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(secs) = self.timeout_secs {
            if !secs.is_finite() || secs < 0.0 {
                return Err(UniComError::ConfigValidation {
                    field: "timeout_secs",
                    reason: format!("must be a non-negative number, got {}", secs),
                });
            }
        }
        match self.transport {
            TransportKind::Serial => self.serial.validate(),
            TransportKind::Tcp | TransportKind::Udp => {
                if self.host.is_empty() {
                    return Err(UniComError::ConfigValidation {
                        field: "host",
                        reason: "must not be empty".into(),
                    });
                }
                if self.port == 0 {
                    return Err(UniComError::ConfigValidation {
                        field: "port",
                        reason: "must not be 0".into(),
                    });
                }
                Ok(())
            }
        }
    }

    pub fn options(&self) -> ChannelOptions {
        ChannelOptions {
            timeout: self.timeout_secs.map(Duration::from_secs_f64),
            eot: self.eot.as_deref().map(bytes::Bytes::copy_from_slice),
        }
    }

    /// Validate and construct the configured channel (not yet connected)
    pub fn build(&self, reporter: Arc<dyn Reporter>) -> Result<Box<dyn Communication>> {
        self.validate()?;
        let options = self.options();
        let channel: Box<dyn Communication> = match self.transport {
            TransportKind::Serial => Box::new(
                Channel::serial(self.serial.settings()?, options).with_reporter(reporter),
            ),
            TransportKind::Tcp => {
                Box::new(Channel::tcp(&self.host, self.port, options).with_reporter(reporter))
            }
            TransportKind::Udp => {
                Box::new(Channel::udp(&self.host, self.port, options).with_reporter(reporter))
            }
        };
        Ok(channel)
    }
}

// =============================================================================
// Serial Configuration
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParityConfig {
    #[default]
    None,
    Odd,
    Even,
}

/// Flow control: `software` = XON/XOFF, `hardware` = RTS/CTS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlowControlConfig {
    #[default]
    None,
    Software,
    Hardware,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// OS port name (e.g. "COM3", "/dev/ttyUSB0")
    pub port: String,
    pub baud_rate: u32,
    /// 5, 6, 7 or 8
    pub data_bits: u8,
    pub parity: ParityConfig,
    /// 1 or 2
    pub stop_bits: u8,
    pub flow_control: FlowControlConfig,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DEFAULT_DATA_BITS,
            parity: ParityConfig::None,
            stop_bits: DEFAULT_STOP_BITS,
            flow_control: FlowControlConfig::None,
        }
    }
}

impl SerialConfig {
    pub fn validate(&self) -> Result<()> {
        if self.port.is_empty() {
            return Err(UniComError::ConfigValidation {
                field: "serial.port",
                reason: "must not be empty".into(),
            });
        }
        if self.baud_rate == 0 {
            return Err(UniComError::ConfigValidation {
                field: "serial.baud_rate",
                reason: "must be greater than zero".into(),
            });
        }
        self.settings().map(|_| ())
    }

    /// Convert to serialport line settings
    pub fn settings(&self) -> Result<SerialSettings> {
        let data_bits = match self.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            8 => DataBits::Eight,
            n => {
                return Err(UniComError::ConfigValidation {
                    field: "serial.data_bits",
                    reason: format!("expected 5-8, got {}", n),
                })
            }
        };
        let stop_bits = match self.stop_bits {
            1 => StopBits::One,
            2 => StopBits::Two,
            n => {
                return Err(UniComError::ConfigValidation {
                    field: "serial.stop_bits",
                    reason: format!("expected 1 or 2, got {}", n),
                })
            }
        };
        let parity = match self.parity {
            ParityConfig::None => Parity::None,
            ParityConfig::Odd => Parity::Odd,
            ParityConfig::Even => Parity::Even,
        };
        let flow_control = match self.flow_control {
            FlowControlConfig::None => FlowControl::None,
            FlowControlConfig::Software => FlowControl::Software,
            FlowControlConfig::Hardware => FlowControl::Hardware,
        };

        Ok(SerialSettings::new(self.port.clone(), self.baud_rate)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(stop_bits)
            .flow_control(flow_control))
    }
}

// =============================================================================
// Exchange Configuration
// =============================================================================

/// Default reply handling for a send
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Chunk size to read after sending (absent = don't read)
    pub receive_size: Option<usize>,
    /// Reply terminator (absent = single chunk read)
    #[serde(with = "marker", skip_serializing_if = "Option::is_none")]
    pub terminator: Option<Vec<u8>>,
    /// Pause between send and first read, in milliseconds
    pub await_receive_ms: u64,
}

impl ExchangeConfig {
    pub fn validate(&self) -> Result<()> {
        if matches!(&self.terminator, Some(t) if t.is_empty()) {
            return Err(UniComError::ConfigValidation {
                field: "exchange.terminator",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    pub fn reply(&self) -> Reply {
        let mut reply = match self.receive_size {
            Some(size) => Reply::size(size),
            None => Reply::none(),
        };
        if let Some(terminator) = &self.terminator {
            reply = reply.until(terminator);
        }
        reply.after(Duration::from_millis(self.await_receive_ms))
    }
}

// =============================================================================
// Byte Markers
// =============================================================================

/// Serde adapter for byte markers: UTF-8 text or an array of byte values
mod marker {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Bytes(Vec<u8>),
    }

    pub fn serialize<S: Serializer>(
        value: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value.as_deref() {
            None => serializer.serialize_none(),
            Some(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => serializer.serialize_some(text),
                Err(_) => serializer.serialize_some(bytes),
            },
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        Ok(Option::<Repr>::deserialize(deserializer)?.map(|repr| match repr {
            Repr::Text(text) => text.into_bytes(),
            Repr::Bytes(bytes) => bytes,
        }))
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Parse config from TOML text
pub fn parse(content: &str, path: &Path) -> Result<Config> {
    toml::from_str(content).map_err(|e| UniComError::ConfigParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Load config from a TOML file
pub fn load(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| UniComError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse(&content, path)
}

/// Save config to a TOML file
pub fn save(config: &Config, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config).map_err(|e| UniComError::ConfigParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    fs::write(path, content).map_err(|e| UniComError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })
}

// ============================================================================
// Tests
// ============================================================================
