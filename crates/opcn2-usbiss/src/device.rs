//! USB-ISS adapter handle
//!
//! This module provides the `UsbIss` struct, which owns the transport for
//! the lifetime of the session and speaks the adapter's framing: a one-time
//! setup frame selecting SPI mode and clock, then SPI transfer frames.

use crate::error::{AdapterError, IssError, Result};
use crate::protocol::*;
use crate::transport::serial::SerialTransport;
use crate::transport::Transport;

/// USB-ISS adapter in SPI mode
///
/// The transport is released when this value is dropped, whether or not
/// [`UsbIss::close`] was called, so an error anywhere after `open` still
/// frees the port.
pub struct UsbIss<T: Transport> {
    /// Transport layer (serial port or emulator)
    transport: T,
    /// Link parameters the adapter was configured with
    config: LinkConfig,
}

impl UsbIss<SerialTransport> {
    /// Open the adapter on a serial port
    ///
    /// The frequency is validated before the port is touched.
    pub fn open_serial(device: &str, config: LinkConfig) -> Result<Self> {
        config.divisor()?;
        let transport = SerialTransport::open(device, CONTROL_BAUD)?;
        Self::open(transport, config)
    }
}

impl<T: Transport> UsbIss<T> {
    /// Configure the adapter over an already opened transport
    ///
    /// Sends `[ISS_CMD, ISS_SET_MODE, mode, divisor]` and checks the 2-byte
    /// reply. A zero first byte means the adapter refused, with the reason in
    /// the second byte; any other first byte is success.
    pub fn open(mut transport: T, config: LinkConfig) -> Result<Self> {
        let frame = config.setup_frame()?;
        log::debug!(
            "usbiss: Setup mode=0x{:02X} divisor={} ({} Hz)",
            frame[2],
            frame[3],
            config.frequency
        );

        transport.write(&frame)?;
        let mut response = [0u8; 2];
        transport.read(&mut response)?;

        if response[0] == ISS_NACK {
            let err = AdapterError::from_code(response[1]);
            log::error!("usbiss: Setup rejected: {}", err);
            return Err(IssError::Adapter(err));
        }

        log::info!(
            "usbiss: SPI mode 0x{:02X} at {} Hz",
            config.mode,
            config.frequency
        );

        Ok(Self { transport, config })
    }

    /// Link parameters in use
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Perform one SPI transfer
    ///
    /// Writes `[SPI_TRANSFER, payload...]` and reads back `1 + payload.len()`
    /// bytes. A zero status byte is a transmission error whatever follows it.
    pub fn exchange(&mut self, payload: &[u8]) -> Result<SpiResponse> {
        if payload.is_empty() {
            return Err(IssError::InvalidParameter("empty transfer".into()));
        }

        let mut frame = Vec::with_capacity(1 + payload.len());
        frame.push(SPI_TRANSFER);
        frame.extend_from_slice(payload);
        self.transport.write(&frame)?;

        let mut response = vec![0u8; 1 + payload.len()];
        self.transport.read(&mut response)?;

        let status = response[0];
        if status == ISS_NACK {
            return Err(IssError::Transmission);
        }

        log::trace!(
            "usbiss: SPI {:02X?} -> status 0x{:02X} {:02X?}",
            payload,
            status,
            &response[1..]
        );

        response.remove(0);
        Ok(SpiResponse {
            status,
            data: response,
        })
    }

    /// Release the adapter
    ///
    /// Consumes the handle so it cannot be used or closed again.
    pub fn close(mut self) -> Result<()> {
        let result = self.transport.flush();
        log::debug!("usbiss: Closed");
        result
    }

    /// Give back the transport without closing it
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Records writes and plays back canned response bytes
    #[derive(Default)]
    struct Scripted {
        written: Vec<u8>,
        replies: VecDeque<u8>,
    }

    impl Scripted {
        fn with_replies(replies: &[u8]) -> Self {
            Self {
                written: Vec::new(),
                replies: replies.iter().copied().collect(),
            }
        }
    }

    impl Transport for Scripted {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            self.written.extend_from_slice(data);
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<()> {
            if self.replies.len() < buf.len() {
                return Err(IssError::ShortResponse {
                    expected: buf.len(),
                    actual: self.replies.len(),
                });
            }
            for b in buf.iter_mut() {
                *b = self.replies.pop_front().unwrap_or_default();
            }
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_open_sends_setup_frame() {
        let iss = UsbIss::open(Scripted::with_replies(&[0xFF, 0x00]), LinkConfig::default())
            .unwrap();
        assert_eq!(iss.transport().written, vec![0x5A, 0x02, 0x92, 11]);
    }

    #[test]
    fn test_open_accepts_any_nonzero_status() {
        for second in [0x00, 0x05, 0xAB] {
            let iss = UsbIss::open(Scripted::with_replies(&[1, second]), LinkConfig::default());
            assert!(iss.is_ok());
        }
    }

    #[test]
    fn test_open_adapter_errors() {
        let cases = [
            (0x05, AdapterError::UnknownCommand),
            (0x06, AdapterError::InternalError1),
            (0x07, AdapterError::InternalError2),
            (0x10, AdapterError::Undocumented(0x10)),
        ];
        for (code, expected) in cases {
            let result = UsbIss::open(Scripted::with_replies(&[0, code]), LinkConfig::default());
            assert!(matches!(result, Err(IssError::Adapter(e)) if e == expected));
        }
    }

    #[test]
    fn test_open_rejects_frequency_before_io() {
        let mut transport = Scripted::default();
        let result = UsbIss::open(&mut transport, LinkConfig::new(0x92, 700_000));
        assert!(matches!(result, Err(IssError::UnsupportedFrequency(700_000))));
        assert!(transport.written.is_empty());
    }

    #[test]
    fn test_exchange() {
        let mut iss = UsbIss::open(
            Scripted::with_replies(&[0xFF, 0x00, 0xFF, 0xF3]),
            LinkConfig::default(),
        )
        .unwrap();
        let response = iss.exchange(&[0xCF]).unwrap();
        assert!(response.is_ack());
        assert_eq!(response.data, vec![0xF3]);
        assert_eq!(&iss.transport().written[4..], &[0x61, 0xCF]);
    }

    #[test]
    fn test_exchange_multi_byte() {
        let mut iss = UsbIss::open(
            Scripted::with_replies(&[0xFF, 0x00, 0x01, 0xAA, 0xBB, 0xCC]),
            LinkConfig::default(),
        )
        .unwrap();
        let response = iss.exchange(&[1, 2, 3]).unwrap();
        assert_eq!(response.status, 0x01);
        assert!(!response.is_ack());
        assert_eq!(response.data, vec![0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_exchange_transmission_error() {
        let mut iss = UsbIss::open(
            Scripted::with_replies(&[0xFF, 0x00, 0x00, 0xFF]),
            LinkConfig::default(),
        )
        .unwrap();
        assert!(matches!(iss.exchange(&[0x30]), Err(IssError::Transmission)));
    }

    #[test]
    fn test_exchange_rejects_empty_payload() {
        let mut iss =
            UsbIss::open(Scripted::with_replies(&[0xFF, 0x00]), LinkConfig::default()).unwrap();
        assert!(matches!(
            iss.exchange(&[]),
            Err(IssError::InvalidParameter(_))
        ));
        assert_eq!(iss.transport().written.len(), 4);
    }

    #[test]
    fn test_into_inner_keeps_transport() {
        let mut iss = UsbIss::open(
            Scripted::with_replies(&[0xFF, 0x00, 0xFF, 0x31, 0xAA]),
            LinkConfig::default(),
        )
        .unwrap();
        iss.exchange(&[0x42]).unwrap();

        let transport = iss.into_inner();
        assert_eq!(transport.written, vec![0x5A, 0x02, 0x92, 11, 0x61, 0x42]);
        assert_eq!(transport.replies, VecDeque::from([0xAA]));
    }
}
