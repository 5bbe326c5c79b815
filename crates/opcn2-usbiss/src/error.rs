//! Error types for USB-ISS operations

use thiserror::Error;

use crate::protocol::setup_error;

/// Error reported by the adapter in response to the setup frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterError {
    /// The adapter did not recognise the command
    UnknownCommand,
    /// Adapter internal error 1
    InternalError1,
    /// Adapter internal error 2
    InternalError2,
    /// Any other code
    Undocumented(u8),
}

impl AdapterError {
    /// Classify a raw setup error code
    pub fn from_code(code: u8) -> Self {
        match code {
            setup_error::UNKNOWN_COMMAND => AdapterError::UnknownCommand,
            setup_error::INTERNAL_ERROR_1 => AdapterError::InternalError1,
            setup_error::INTERNAL_ERROR_2 => AdapterError::InternalError2,
            other => AdapterError::Undocumented(other),
        }
    }

    /// Raw code as sent by the adapter
    pub fn code(&self) -> u8 {
        match self {
            AdapterError::UnknownCommand => setup_error::UNKNOWN_COMMAND,
            AdapterError::InternalError1 => setup_error::INTERNAL_ERROR_1,
            AdapterError::InternalError2 => setup_error::INTERNAL_ERROR_2,
            AdapterError::Undocumented(code) => *code,
        }
    }
}

impl core::fmt::Display for AdapterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let what = match self {
            AdapterError::UnknownCommand => "Unknown Command",
            AdapterError::InternalError1 => "Internal Error 1",
            AdapterError::InternalError2 => "Internal Error 2",
            AdapterError::Undocumented(_) => "Undocumented Error",
        };
        write!(f, "{} (0x{:02X})", what, self.code())
    }
}

/// USB-ISS specific errors
#[derive(Debug, Error)]
pub enum IssError {
    /// Requested SPI clock cannot be derived from the master clock
    #[error("Unsupported frequency: {0} Hz")]
    UnsupportedFrequency(u32),

    /// Adapter rejected the setup frame
    #[error("USB-ISS: {0}")]
    Adapter(AdapterError),

    /// Adapter reported a failed SPI transfer
    #[error("USB-ISS: Transmission Error")]
    Transmission,

    /// Fewer bytes than expected came back
    #[error("Short response: expected {expected} bytes, got {actual}")]
    ShortResponse { expected: usize, actual: usize },

    /// Caller passed an argument the adapter cannot act on
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// I/O error during communication
    #[error("I/O error: {0}")]
    Io(String),

    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

/// Result type for USB-ISS operations
pub type Result<T> = std::result::Result<T, IssError>;

impl From<std::io::Error> for IssError {
    fn from(e: std::io::Error) -> Self {
        IssError::Io(e.to_string())
    }
}
