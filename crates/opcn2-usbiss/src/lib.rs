//! opcn2-usbiss - USB-ISS serial-to-SPI bridge support
//!
//! This crate drives the USB-ISS adapter in SPI master mode.
//!
//! # Protocol Overview
//!
//! The adapter shows up as a serial port. A 4-byte setup frame selects the
//! SPI mode and clock divisor, after which every SPI transfer is a frame of
//! `0x61` followed by the bytes to clock out. The adapter answers with a
//! status byte followed by one received byte per byte sent.
//!
//! # Example
//!
//! ```no_run
//! use opcn2_usbiss::{LinkConfig, UsbIss};
//!
//! let mut iss = UsbIss::open_serial("/dev/ttyACM0", LinkConfig::default())?;
//! let response = iss.exchange(&[0xCF])?;
//! println!("status 0x{:02X}, data {:02X?}", response.status, response.data);
//! iss.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod device;
pub mod error;
pub mod protocol;
pub mod transport;

// Re-exports
pub use device::UsbIss;
pub use error::{AdapterError, IssError, Result};
pub use protocol::{spi_mode, LinkConfig, SpiResponse};
pub use transport::serial::SerialTransport;
pub use transport::Transport;
