//! Error types for OPC-N2 operations

use opcn2_usbiss::IssError;
use thiserror::Error;

/// OPC-N2 errors
#[derive(Debug, Error)]
pub enum Opcn2Error {
    /// Adapter or link failure (bad frequency, setup refused, transfer failed)
    #[error(transparent)]
    Iss(#[from] IssError),

    /// The sensor did not acknowledge a byte
    #[error("OPC-N2 Read Error: status 0x{status:02X} after sending 0x{sent:02X}")]
    ReadError { sent: u8, status: u8 },

    /// Firmware version matches none of the supported revisions
    #[error("Invalid OPC-N2 firmware version: {0:?}")]
    UnknownFirmware(String),

    /// Decoded PM values are not monotonic, so the record cannot be trusted
    #[error("PM values out of order: pm1={pm1} pm2.5={pm2_5} pm10={pm10}")]
    PmOutOfOrder { pm1: f32, pm2_5: f32, pm10: f32 },
}

/// Result type for OPC-N2 operations
pub type Result<T> = std::result::Result<T, Opcn2Error>;
