//! SPI-over-adapter command channel
//!
//! The OPC-N2 needs a pause after every byte, so commands are clocked out one
//! byte per adapter transfer rather than as a single multi-byte transfer.

use std::thread;
use std::time::Duration;

use opcn2_usbiss::{IssError, Transport, UsbIss};

use crate::error::{Opcn2Error, Result};
use crate::protocol::*;

/// Command channel borrowing an open adapter
pub struct CommandChannel<'a, T: Transport> {
    iss: &'a mut UsbIss<T>,
    timing: Timing,
}

impl<'a, T: Transport> CommandChannel<'a, T> {
    pub fn new(iss: &'a mut UsbIss<T>, timing: Timing) -> Self {
        Self { iss, timing }
    }

    /// Clock out `bytes` one at a time, sleeping `delay` after each
    ///
    /// Every transfer must come back with the adapter's 0xFF acknowledge;
    /// anything else means the sensor did not take the byte. Returns the byte
    /// received for each byte sent.
    pub fn send_sequence(&mut self, bytes: &[u8], delay: Duration) -> Result<Vec<u8>> {
        let mut result = Vec::with_capacity(bytes.len());

        for &byte in bytes {
            let response = self.iss.exchange(&[byte])?;
            if !response.is_ack() {
                return Err(Opcn2Error::ReadError {
                    sent: byte,
                    status: response.status,
                });
            }
            let received = response
                .data
                .first()
                .copied()
                .ok_or(IssError::ShortResponse {
                    expected: 1,
                    actual: 0,
                })?;
            result.push(received);

            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }

        Ok(result)
    }

    /// Send an opcode with the coarse delay, returning the sensor's reply byte
    fn command(&mut self, opcode: u8) -> Result<u8> {
        log::debug!("opcn2: Command 0x{:02X}", opcode);
        let reply = self.send_sequence(&[opcode], self.timing.command_delay)?;
        Ok(reply[0])
    }

    /// Send an opcode and clock in an `N`-byte response
    fn read_block<const N: usize>(&mut self, opcode: u8) -> Result<[u8; N]> {
        self.command(opcode)?;
        let data = self.send_sequence(&[0u8; N], self.timing.byte_delay)?;
        let actual = data.len();
        data.try_into().map_err(|_| {
            Opcn2Error::Iss(IssError::ShortResponse {
                expected: N,
                actual,
            })
        })
    }

    fn power(&mut self, code: Option<u8>) -> Result<()> {
        self.command(CMD_POWER)?;
        if let Some(code) = code {
            self.send_sequence(&[code], self.timing.byte_delay)?;
        }
        Ok(())
    }

    /// Switch the selected peripherals on
    pub fn power_on(&mut self, peripherals: Peripherals) -> Result<()> {
        self.power(peripherals.on_code())
    }

    /// Switch the selected peripherals off
    pub fn power_off(&mut self, peripherals: Peripherals) -> Result<()> {
        self.power(peripherals.off_code())
    }

    /// Set the laser power level
    pub fn set_laser_power(&mut self, level: u8) -> Result<()> {
        self.send_sequence(
            &[CMD_SET_POWER, power_target::LASER, level],
            self.timing.byte_delay,
        )?;
        Ok(())
    }

    /// Set the fan power level
    pub fn set_fan_power(&mut self, level: u8) -> Result<()> {
        self.send_sequence(
            &[CMD_SET_POWER, power_target::FAN, level],
            self.timing.byte_delay,
        )?;
        Ok(())
    }

    /// Read the raw firmware version block
    pub fn firmware_version(&mut self) -> Result<[u8; FIRMWARE_LEN]> {
        self.read_block(CMD_FIRMWARE)
    }

    /// Read the raw configuration block
    pub fn config_raw(&mut self) -> Result<[u8; CONFIG_LEN]> {
        self.read_block(CMD_CONFIG)
    }

    /// Poll readiness
    pub fn ready(&mut self) -> Result<bool> {
        let reply = self.send_sequence(&[CMD_READY], self.timing.byte_delay)?;
        Ok(reply[0] == CMD_ACK)
    }

    /// Read the raw histogram block
    pub fn histogram_raw(&mut self) -> Result<[u8; HISTOGRAM_LEN]> {
        self.read_block(CMD_HISTOGRAM)
    }

    /// Read the raw PM block
    pub fn pm_raw(&mut self) -> Result<[u8; PM_LEN]> {
        self.read_block(CMD_PM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcn2_dummy::{DummyConfig, DummyOpc};
    use opcn2_usbiss::LinkConfig;

    fn open(config: DummyConfig) -> UsbIss<DummyOpc> {
        UsbIss::open(DummyOpc::new(config), LinkConfig::default()).unwrap()
    }

    #[test]
    fn test_send_sequence_one_transfer_per_byte() {
        let mut iss = open(DummyConfig::default());
        let mut channel = CommandChannel::new(&mut iss, Timing::none());
        let reply = channel
            .send_sequence(&[CMD_READY], Duration::ZERO)
            .unwrap();
        assert_eq!(reply, vec![CMD_ACK]);
        drop(channel);
        assert_eq!(iss.transport().transfer_count(), 1);
    }

    #[test]
    fn test_read_error_on_bad_status() {
        let mut config = DummyConfig::default();
        config.transfer_status_at = Some((0, 0x01));
        let mut iss = open(config);
        let mut channel = CommandChannel::new(&mut iss, Timing::none());
        let err = channel.ready().unwrap_err();
        assert!(matches!(
            err,
            Opcn2Error::ReadError {
                sent: CMD_READY,
                status: 0x01
            }
        ));
    }

    #[test]
    fn test_transmission_error_propagates() {
        let mut config = DummyConfig::default();
        config.transfer_status_at = Some((3, 0x00));
        let mut iss = open(config);
        let mut channel = CommandChannel::new(&mut iss, Timing::none());
        let err = channel.histogram_raw().unwrap_err();
        assert!(matches!(err, Opcn2Error::Iss(IssError::Transmission)));
    }

    #[test]
    fn test_ready() {
        let mut iss = open(DummyConfig::default());
        assert!(CommandChannel::new(&mut iss, Timing::none()).ready().unwrap());

        let mut config = DummyConfig::default();
        config.ready = false;
        let mut iss = open(config);
        assert!(!CommandChannel::new(&mut iss, Timing::none()).ready().unwrap());
    }

    #[test]
    fn test_power_sequences() {
        let mut iss = open(DummyConfig::default());
        let mut channel = CommandChannel::new(&mut iss, Timing::none());
        channel.power_on(Peripherals::ALL).unwrap();
        channel.power_off(Peripherals::FAN).unwrap();
        channel.power_on(Peripherals::NONE).unwrap();
        drop(channel);
        assert_eq!(
            iss.transport().spi_log(),
            &[CMD_POWER, 0x00, CMD_POWER, 0x05, CMD_POWER]
        );
        let state = iss.transport().state();
        assert!(!state.fan);
        assert!(state.laser);
    }

    #[test]
    fn test_set_power_levels() {
        let mut iss = open(DummyConfig::default());
        let mut channel = CommandChannel::new(&mut iss, Timing::none());
        channel.set_laser_power(0xA0).unwrap();
        channel.set_fan_power(0x55).unwrap();
        drop(channel);
        assert_eq!(
            iss.transport().spi_log(),
            &[0x42, 0x01, 0xA0, 0x42, 0x00, 0x55]
        );
        assert_eq!(iss.transport().state().laser_power, 0xA0);
        assert_eq!(iss.transport().state().fan_power, 0x55);
    }

    #[test]
    fn test_pm_raw() {
        let mut config = DummyConfig::default();
        config.pm = [1.5, 2.5, 3.5];
        let mut iss = open(config);
        let raw = CommandChannel::new(&mut iss, Timing::none())
            .pm_raw()
            .unwrap();
        assert_eq!(&raw[0..4], &1.5f32.to_le_bytes());
        assert_eq!(&raw[8..12], &3.5f32.to_le_bytes());
    }
}
