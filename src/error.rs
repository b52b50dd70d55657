//! Centralized error types for transports and configuration
//!
//! Transport primitives and the config layer return `UniComError`.
//! Channels never propagate it: a failed transport call is turned into
//! disconnect + report + empty result at the channel boundary.

use std::fmt;
use std::path::PathBuf;

/// All unicom errors
#[derive(Debug)]
pub enum UniComError {
    // === Transport ===
    /// Failed to open serial port
    SerialOpen {
        port: String,
        source: std::io::Error,
    },
    /// Host/port did not resolve to any socket address
    Resolve {
        target: String,
        source: std::io::Error,
    },
    /// Failed to create or connect a socket
    SocketConnect {
        target: String,
        source: std::io::Error,
    },
    /// Operation on a transport that has no open handle
    NotOpen,
    /// Write or flush rejected by the transport
    Write { source: std::io::Error },
    /// Read failed (other than a plain timeout)
    Read { source: std::io::Error },
    /// Discarding pending input failed
    Clear { source: std::io::Error },

    // === Config ===
    /// Config file could not be read
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Config file is not valid TOML for our schema
    ConfigParse { path: PathBuf, reason: String },
    /// Invalid config value
    ConfigValidation { field: &'static str, reason: String },
}

impl std::error::Error for UniComError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SerialOpen { source, .. }
            | Self::Resolve { source, .. }
            | Self::SocketConnect { source, .. }
            | Self::Write { source }
            | Self::Read { source }
            | Self::Clear { source }
            | Self::ConfigRead { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for UniComError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SerialOpen { port, source } => {
                write!(f, "Cannot open serial port {}: {}", port, source)
            }
            Self::Resolve { target, source } => {
                write!(f, "Cannot resolve {}: {}", target, source)
            }
            Self::SocketConnect { target, source } => {
                write!(f, "Cannot connect to {}: {}", target, source)
            }
            Self::NotOpen => write!(f, "Transport is not open"),
            Self::Write { source } => write!(f, "Write failed: {}", source),
            Self::Read { source } => write!(f, "Read failed: {}", source),
            Self::Clear { source } => write!(f, "Clearing input failed: {}", source),
            Self::ConfigRead { path, source } => {
                write!(f, "Cannot read config {}: {}", path.display(), source)
            }
            Self::ConfigParse { path, reason } => {
                write!(f, "Invalid config {}: {}", path.display(), reason)
            }
            Self::ConfigValidation { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
        }
    }
}

/// Alias for Result with UniComError
pub type Result<T> = std::result::Result<T, UniComError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_includes_cause() {
        let err = UniComError::Write {
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"),
        };
        assert_eq!(err.to_string(), "Write failed: pipe closed");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_validation_has_no_source() {
        let err = UniComError::ConfigValidation {
            field: "baud_rate",
            reason: "must be greater than zero".into(),
        };
        assert_eq!(err.to_string(), "Invalid baud_rate: must be greater than zero");
        assert!(err.source().is_none());
    }
}
