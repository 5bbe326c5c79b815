//! Byte transport underneath the adapter protocol
//!
//! The adapter only needs blocking, exact-length reads and writes, so the
//! trait is deliberately small. The serial implementation is what real
//! hardware uses; tests and the emulator provide their own.

use crate::error::Result;

/// Transport trait for reading and writing bytes
pub trait Transport {
    /// Write all bytes to the transport
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read bytes from the transport
    ///
    /// Reads exactly `buf.len()` bytes into the buffer.
    /// Returns an error if not enough bytes are available.
    fn read(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read(buf)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read(buf)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

pub mod serial {
    //! Serial port transport implementation

    use super::*;
    use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
    use std::io::{Read, Write};
    use std::time::Duration;

    /// Default read timeout; a 256-byte block at 1 ms per byte fits easily
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

    /// Serial port transport
    pub struct SerialTransport {
        port: Box<dyn SerialPort>,
    }

    impl SerialTransport {
        /// Open a serial port with the specified baud rate
        pub fn open(device: &str, baud: u32) -> Result<Self> {
            let port = serialport::new(device, baud)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .timeout(DEFAULT_TIMEOUT)
                .open()?;

            log::info!("Opened serial port {} at {} baud", device, baud);

            Ok(Self { port })
        }
    }

    impl Transport for SerialTransport {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            self.port.write_all(data)?;
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<()> {
            self.port.read_exact(buf)?;
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            self.port.flush()?;
            Ok(())
        }
    }
}
