//! USB-ISS protocol constants and types
//!
//! Based on the USB-ISS technical documentation. The adapter enumerates as a
//! CDC serial port; every command is a short frame written to that port and
//! answered with a fixed-length response.

use crate::error::{IssError, Result};

/// Baud rate of the adapter's control port
///
/// The USB-ISS ignores the host baud setting for its own frames, but the
/// serial driver still needs one.
pub const CONTROL_BAUD: u32 = 57_600;

/// Fixed master clock the SPI divisor is derived from
pub const MASTER_CLOCK_HZ: u32 = 6_000_000;

// Command bytes
/// Adapter-internal command prefix
pub const ISS_CMD: u8 = 0x5A;
/// Sub-command: set operating mode
pub const ISS_SET_MODE: u8 = 0x02;
/// SPI transfer command (followed by the bytes to clock out)
pub const SPI_TRANSFER: u8 = 0x61;

/// Status byte of a successful SPI transfer
pub const SPI_ACK: u8 = 0xFF;
/// Status byte of a failed command
pub const ISS_NACK: u8 = 0x00;

/// SPI mode bytes accepted by `ISS_SET_MODE`
///
/// The adapter numbers its SPI modes from 0x90; the low two bits select the
/// clock phase/polarity combination in the adapter's own ordering.
pub mod spi_mode {
    /// TX on transition from active to idle, idle low
    pub const MODE_0: u8 = 0x90;
    /// TX on transition from active to idle, idle high
    pub const MODE_1: u8 = 0x91;
    /// TX on transition from idle to active, idle low
    pub const MODE_2: u8 = 0x92;
    /// TX on transition from idle to active, idle high
    pub const MODE_3: u8 = 0x93;
}

/// Setup response error codes (second byte when the first byte is NACK)
pub mod setup_error {
    /// Unknown command
    pub const UNKNOWN_COMMAND: u8 = 0x05;
    /// Internal error 1
    pub const INTERNAL_ERROR_1: u8 = 0x06;
    /// Internal error 2
    pub const INTERNAL_ERROR_2: u8 = 0x07;
}

/// SPI link parameters negotiated with the adapter at open time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// SPI mode byte (one of [`spi_mode`])
    pub mode: u8,
    /// Target SPI clock in Hz
    pub frequency: u32,
}

impl LinkConfig {
    /// Mode used by the OPC-N2
    pub const DEFAULT_MODE: u8 = spi_mode::MODE_2;
    /// Clock used by the OPC-N2
    pub const DEFAULT_FREQUENCY: u32 = 500_000;

    /// Create a link configuration
    pub const fn new(mode: u8, frequency: u32) -> Self {
        Self { mode, frequency }
    }

    /// Compute the clock divisor byte sent in the setup frame
    ///
    /// The frequency must divide the master clock exactly, and the resulting
    /// divisor has to fit in one byte.
    pub fn divisor(&self) -> Result<u8> {
        let freq = self.frequency;
        if freq == 0 || freq > MASTER_CLOCK_HZ || MASTER_CLOCK_HZ % freq != 0 {
            return Err(IssError::UnsupportedFrequency(freq));
        }
        u8::try_from(MASTER_CLOCK_HZ / freq - 1).map_err(|_| IssError::UnsupportedFrequency(freq))
    }

    /// Build the 4-byte setup frame
    pub fn setup_frame(&self) -> Result<[u8; 4]> {
        Ok([ISS_CMD, ISS_SET_MODE, self.mode, self.divisor()?])
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MODE, Self::DEFAULT_FREQUENCY)
    }
}

/// Response to an SPI transfer
///
/// `status` is the adapter's leading byte; `data` holds the bytes clocked in
/// from the slave, one per byte sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiResponse {
    /// Adapter status byte (never zero)
    pub status: u8,
    /// Bytes received from the SPI slave
    pub data: Vec<u8>,
}

impl SpiResponse {
    /// Whether the adapter acknowledged the transfer with [`SPI_ACK`]
    pub fn is_ack(&self) -> bool {
        self.status == SPI_ACK
    }
}
