//! Serial transport for RS-232 / USB CDC lines
//!
//! Wraps a blocking `serialport` handle. The port is opened at `open()`,
//! never at construction, so a serial channel can be reopened after a
//! disconnect.

use super::{is_timeout, Transport};
use crate::constants::{DEFAULT_BAUD_RATE, INDEFINITE_SERIAL_TIMEOUT};
use crate::error::{Result, UniComError};
use bytes::Bytes;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortInfo, StopBits};
use std::fmt;
use std::io::{Read, Write};
use std::time::Duration;
use tracing::debug;

/// Line settings for a serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    /// OS port name (e.g. `COM3`, `/dev/ttyUSB0`)
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    /// Software (XON/XOFF) or hardware (RTS/CTS) flow control
    pub flow_control: FlowControl,
}

impl SerialSettings {
    /// 8N1 settings with no flow control
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
        }
    }

    pub fn data_bits(mut self, data_bits: DataBits) -> Self {
        self.data_bits = data_bits;
        self
    }

    pub fn parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    pub fn stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    pub fn flow_control(mut self, flow_control: FlowControl) -> Self {
        self.flow_control = flow_control;
        self
    }
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self::new(String::new(), DEFAULT_BAUD_RATE)
    }
}

impl fmt::Display for SerialSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        let flow = match self.flow_control {
            FlowControl::None => "",
            FlowControl::Software => " xon/xoff",
            FlowControl::Hardware => " rts/cts",
        };
        write!(
            f,
            "{} @ {} baud {}{}{}{}",
            self.port,
            self.baud_rate,
            u8::from(self.data_bits),
            parity,
            u8::from(self.stop_bits),
            flow
        )
    }
}

/// Serial transport
///
/// # Example
///
/// ```ignore
/// let mut transport = SerialTransport::new(SerialSettings::new("/dev/ttyUSB0", 115_200));
/// transport.open(Some(Duration::from_millis(500)))?;
/// transport.write(b"*IDN?\n")?;
/// let chunk = transport.read(64)?;
/// ```
pub struct SerialTransport {
    settings: SerialSettings,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Create a closed transport for the given line settings
    pub fn new(settings: SerialSettings) -> Self {
        Self {
            settings,
            port: None,
        }
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(UniComError::NotOpen)
    }
}

impl fmt::Display for SerialTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.settings, f)
    }
}

impl Transport for SerialTransport {
    fn component(&self) -> &'static str {
        "SerialChannel"
    }

    fn open(&mut self, timeout: Option<Duration>) -> Result<()> {
        let s = &self.settings;
        let port = serialport::new(&s.port, s.baud_rate)
            .data_bits(s.data_bits)
            .parity(s.parity)
            .stop_bits(s.stop_bits)
            .flow_control(s.flow_control)
            .timeout(timeout.unwrap_or(INDEFINITE_SERIAL_TIMEOUT))
            .open()
            .map_err(|e| UniComError::SerialOpen {
                port: s.port.clone(),
                source: std::io::Error::other(e.to_string()),
            })?;
        debug!("Opened serial port {}", self.settings);
        self.port = Some(port);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port_mut()?;
        port.write_all(data)
            .and_then(|_| port.flush())
            .map_err(|source| UniComError::Write { source })
    }

    fn read(&mut self, max: usize) -> Result<Bytes> {
        let port = self.port_mut()?;
        if max == 0 {
            return Ok(Bytes::new());
        }
        let mut buf = vec![0u8; max];
        match port.read(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Ok(Bytes::from(buf))
            }
            Err(e) if is_timeout(e.kind()) => Ok(Bytes::new()),
            Err(source) => Err(UniComError::Read { source }),
        }
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!("Closed serial port {}", self.settings.port);
        }
    }

    fn clear_input(&mut self) -> Result<()> {
        self.port_mut()?
            .clear(ClearBuffer::Input)
            .map_err(|e| UniComError::Clear {
                source: std::io::Error::other(e.to_string()),
            })
    }
}

/// List serial ports present on this machine
pub fn available_ports() -> Result<Vec<SerialPortInfo>> {
    serialport::available_ports().map_err(|e| UniComError::SerialOpen {
        port: "<enumerate>".to_string(),
        source: std::io::Error::other(e.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_settings_display() {
        let settings = SerialSettings::new("COM3", 115_200);
        assert_eq!(settings.to_string(), "COM3 @ 115200 baud 8N1");

        let settings = SerialSettings::new("/dev/ttyUSB0", 9600)
            .data_bits(DataBits::Seven)
            .parity(Parity::Even)
            .stop_bits(StopBits::Two)
            .flow_control(FlowControl::Hardware);
        assert_eq!(settings.to_string(), "/dev/ttyUSB0 @ 9600 baud 7E2 rts/cts");
    }

    #[test]
    fn test_serial_transport_starts_closed() {
        let transport = SerialTransport::new(SerialSettings::new("COM3", 9600));
        assert!(!transport.is_open());
        assert_eq!(transport.component(), "SerialChannel");
        assert_eq!(transport.settings().port, "COM3");
    }

    #[test]
    fn test_io_on_closed_port_is_not_open() {
        let mut transport = SerialTransport::new(SerialSettings::new("COM3", 9600));
        assert!(matches!(transport.write(b"x"), Err(UniComError::NotOpen)));
        assert!(matches!(transport.read(4), Err(UniComError::NotOpen)));
        transport.close();
        transport.close();
        assert!(!transport.is_open());
    }

    #[test]
    fn test_open_missing_port_fails() {
        let mut transport =
            SerialTransport::new(SerialSettings::new("/dev/unicom-does-not-exist", 9600));
        let err = transport.open(Some(Duration::from_millis(10))).unwrap_err();
        assert!(matches!(err, UniComError::SerialOpen { .. }));
        assert!(!transport.is_open());
    }
}
