//! opcn2-dummy - Emulated USB-ISS adapter with an OPC-N2 attached
//!
//! This crate provides a [`Transport`] that answers the adapter's setup and
//! SPI transfer frames the way the real adapter/sensor pair does. It's useful
//! for testing and for running the CLI without hardware.

mod builders;

pub use builders::{ConfigBuilder, HistogramBuilder, CONFIG_LEN, HISTOGRAM_LEN};

use std::collections::VecDeque;

use opcn2_usbiss::{IssError, Result, Transport};

// Sensor opcodes, as the emulated firmware understands them
const OP_POWER: u8 = 0x03;
const OP_SET_POWER: u8 = 0x42;
const OP_FIRMWARE: u8 = 0x3F;
const OP_CONFIG: u8 = 0x3C;
const OP_READY: u8 = 0xCF;
const OP_HISTOGRAM: u8 = 0x30;
const OP_PM: u8 = 0x32;

/// Reply to an accepted opcode
const SENSOR_ACK: u8 = 0xF3;
/// Reply while busy or to an unknown opcode
const SENSOR_BUSY: u8 = 0x31;

const FIRMWARE_LEN: usize = 60;

/// Configuration for the emulated sensor
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Firmware version string (space padded to 60 bytes)
    pub firmware: String,
    /// Histogram block served on every histogram query
    pub histogram: [u8; HISTOGRAM_LEN],
    /// Configuration block
    pub config: [u8; CONFIG_LEN],
    /// PM1, PM2.5, PM10 served on PM queries
    pub pm: [f32; 3],
    /// Whether the readiness poll succeeds
    pub ready: bool,
    /// Reject the setup frame with this error code
    pub setup_error: Option<u8>,
    /// Answer the n-th SPI transfer (0-based, counted after setup) with this status
    pub transfer_status_at: Option<(usize, u8)>,
}

impl Default for DummyConfig {
    fn default() -> Self {
        let mut bins = [0u16; 16];
        for (i, bin) in bins.iter_mut().enumerate() {
            *bin = (64 >> (i / 2)) as u16;
        }
        Self {
            firmware: "OPC-N2 FirmwareVer=OPC-018.2..............................BD".into(),
            histogram: HistogramBuilder::new()
                .bins(bins)
                .mtof([30, 45, 60, 75])
                .sample_flow_rate(3.5)
                .weather(235)
                .sampling_period(1.4)
                .pm([1.2, 3.4, 5.6])
                .build(),
            config: ConfigBuilder::new()
                .bin_boundaries([0, 4, 7, 10, 14, 21, 28, 35, 42, 50, 70, 90, 110, 130, 160, 200])
                .bin_particle_volume([
                    0.08, 0.28, 0.56, 1.0, 1.9, 3.8, 6.6, 11.0, 17.0, 24.0, 41.0, 77.0, 130.0,
                    190.0, 280.0, 420.0,
                ])
                .bin_particle_density([1.65; 16])
                .bin_particle_weighting([1.0; 16])
                .gain_scaling_coefficient(1.6)
                .sample_flow_rate(3.5)
                .laser_dac(0xB4)
                .fan_dac(0xFF)
                .tof_to_sfr_factor(0x2A)
                .build(),
            pm: [1.2, 3.4, 5.6],
            ready: true,
            setup_error: None,
            transfer_status_at: None,
        }
    }
}

/// Peripheral state changed by power commands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorState {
    pub fan: bool,
    pub laser: bool,
    pub fan_power: u8,
    pub laser_power: u8,
}

/// Command waiting for argument bytes
#[derive(Debug, Clone, Copy)]
enum Pending {
    Power,
    SetPower { target: Option<u8> },
}

/// Emulated USB-ISS adapter with an OPC-N2 on its SPI bus
///
/// After a power opcode the next byte in `0x00..=0x05` is taken as its
/// sub-command, however much later it arrives. A bare power opcode (as sent
/// for no peripherals) followed by another power opcode therefore reads the
/// second `0x03` as "laser off"; send a byte above `0x05` in between to
/// start over.
pub struct DummyOpc {
    config: DummyConfig,
    state: SensorState,
    configured: bool,
    /// Bytes waiting to be read by the host
    rx: VecDeque<u8>,
    /// Bytes the sensor will shift out next
    tx: VecDeque<u8>,
    pending: Option<Pending>,
    transfers: usize,
    spi_log: Vec<u8>,
}

impl DummyOpc {
    /// Create a new emulator with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            config,
            state: SensorState::default(),
            configured: false,
            rx: VecDeque::new(),
            tx: VecDeque::new(),
            pending: None,
            transfers: 0,
            spi_log: Vec::new(),
        }
    }

    /// Create a new emulator with default configuration (firmware 18)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Get a mutable reference to the configuration
    pub fn config_mut(&mut self) -> &mut DummyConfig {
        &mut self.config
    }

    /// Peripheral state
    pub fn state(&self) -> &SensorState {
        &self.state
    }

    /// Every byte received on the SPI bus, in order
    pub fn spi_log(&self) -> &[u8] {
        &self.spi_log
    }

    /// Number of SPI transfer frames handled
    pub fn transfer_count(&self) -> usize {
        self.transfers
    }

    fn handle_setup(&mut self, frame: &[u8]) {
        if let Some(code) = self.config.setup_error {
            log::debug!("dummy: Rejecting setup with code 0x{:02X}", code);
            self.rx.extend([0x00, code]);
            return;
        }
        if frame.len() == 4 {
            log::debug!(
                "dummy: SPI mode 0x{:02X}, divisor {}",
                frame[2],
                frame[3]
            );
        }
        self.configured = true;
        self.rx.extend([0xFF, 0x00]);
    }

    fn handle_transfer(&mut self, bytes: &[u8]) {
        let index = self.transfers;
        self.transfers += 1;

        let status = match self.config.transfer_status_at {
            Some((at, status)) if at == index => status,
            _ if !self.configured => 0x00,
            _ => 0xFF,
        };

        self.rx.push_back(status);
        if status != 0xFF {
            // A failed transfer leaves the sensor untouched
            self.rx.extend(std::iter::repeat(0).take(bytes.len()));
            return;
        }

        for &byte in bytes {
            let out = self.spi_byte(byte);
            self.rx.push_back(out);
        }
    }

    /// One byte exchanged with the sensor
    fn spi_byte(&mut self, byte: u8) -> u8 {
        self.spi_log.push(byte);

        match self.pending.take() {
            Some(Pending::Power) if byte <= 0x05 => {
                self.apply_power(byte);
                return 0x03;
            }
            Some(Pending::Power) => {
                // Not a power sub-command; treat it as a fresh opcode
            }
            Some(Pending::SetPower { target: None }) => {
                self.pending = Some(Pending::SetPower { target: Some(byte) });
                return 0x42;
            }
            Some(Pending::SetPower {
                target: Some(target),
            }) => {
                match target {
                    0x00 => self.state.fan_power = byte,
                    0x01 => self.state.laser_power = byte,
                    _ => {}
                }
                return 0x00;
            }
            None => {}
        }

        if let Some(out) = self.tx.pop_front() {
            return out;
        }

        self.opcode(byte)
    }

    fn opcode(&mut self, op: u8) -> u8 {
        match op {
            OP_POWER => self.pending = Some(Pending::Power),
            OP_SET_POWER => self.pending = Some(Pending::SetPower { target: None }),
            OP_FIRMWARE => {
                let mut text = self.config.firmware.clone().into_bytes();
                text.resize(FIRMWARE_LEN, b' ');
                self.tx.extend(text);
            }
            OP_CONFIG => self.tx.extend(self.config.config),
            OP_HISTOGRAM => self.tx.extend(self.config.histogram),
            OP_PM => {
                for v in self.config.pm {
                    self.tx.extend(v.to_le_bytes());
                }
            }
            OP_READY if self.config.ready => {}
            _ => return SENSOR_BUSY,
        }
        SENSOR_ACK
    }

    fn apply_power(&mut self, code: u8) {
        match code {
            0x00 => (self.state.fan, self.state.laser) = (true, true),
            0x01 => (self.state.fan, self.state.laser) = (false, false),
            0x02 => self.state.laser = true,
            0x03 => self.state.laser = false,
            0x04 => self.state.fan = true,
            0x05 => self.state.fan = false,
            _ => {}
        }
    }
}

impl Transport for DummyOpc {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        match data {
            [0x5A, 0x02, ..] => self.handle_setup(data),
            [0x61, bytes @ ..] if !bytes.is_empty() => self.handle_transfer(bytes),
            _ => self.rx.extend([0x00, 0x05]),
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        let len = buf.len();
        if self.rx.len() < len {
            return Err(IssError::ShortResponse {
                expected: len,
                actual: self.rx.len(),
            });
        }
        for (dst, src) in buf.iter_mut().zip(self.rx.drain(..len)) {
            *dst = src;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
