//! Application-wide constants
//!
//! Centralized defaults shared by the config layer, the CLI and transports.

use std::time::Duration;

// =============================================================================
// Serial
// =============================================================================

/// Default baud rate when none is configured
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default number of data bits per character
pub const DEFAULT_DATA_BITS: u8 = 8;

/// Default number of stop bits
pub const DEFAULT_STOP_BITS: u8 = 1;

/// Read timeout used when a serial channel has no timeout configured.
///
/// serialport always needs a finite duration; one day is effectively blocking.
pub const INDEFINITE_SERIAL_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

// =============================================================================
// Network
// =============================================================================

/// Default host for socket channels
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port for socket channels
pub const DEFAULT_SOCKET_PORT: u16 = 5025;

// =============================================================================
// Exchange
// =============================================================================

/// Chunk size used by the CLI when a terminator is given without a size
pub const DEFAULT_CHUNK_SIZE: usize = 1024;
