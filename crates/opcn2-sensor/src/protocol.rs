//! OPC-N2 SPI command set
//!
//! Every command starts with an opcode byte sent after a coarse delay; the
//! sensor answers the opcode with [`CMD_ACK`] and then clocks out its payload
//! one byte per dummy byte the host sends.

use std::time::Duration;

// Command opcodes
/// Power control, followed by one sub-command byte
pub const CMD_POWER: u8 = 0x03;
/// Set fan or laser power, followed by target and level
pub const CMD_SET_POWER: u8 = 0x42;
/// Read the firmware version string
pub const CMD_FIRMWARE: u8 = 0x3F;
/// Read the configuration block
pub const CMD_CONFIG: u8 = 0x3C;
/// Readiness poll
pub const CMD_READY: u8 = 0xCF;
/// Read the histogram block
pub const CMD_HISTOGRAM: u8 = 0x30;
/// Read the PM block
pub const CMD_PM: u8 = 0x32;

/// Byte the sensor returns when it accepts a command
pub const CMD_ACK: u8 = 0xF3;

/// Targets for [`CMD_SET_POWER`]
pub mod power_target {
    /// Fan DAC
    pub const FAN: u8 = 0x00;
    /// Laser DAC
    pub const LASER: u8 = 0x01;
}

/// Sub-commands for [`CMD_POWER`]
pub mod power {
    pub const ON_ALL: u8 = 0x00;
    pub const OFF_ALL: u8 = 0x01;
    pub const ON_LASER: u8 = 0x02;
    pub const OFF_LASER: u8 = 0x03;
    pub const ON_FAN: u8 = 0x04;
    pub const OFF_FAN: u8 = 0x05;
}

// Response lengths
/// Firmware version string length
pub const FIRMWARE_LEN: usize = 60;
/// Configuration block length
pub const CONFIG_LEN: usize = 256;
/// Histogram block length
pub const HISTOGRAM_LEN: usize = 62;
/// PM block length
pub const PM_LEN: usize = 12;

/// Delays inserted after every single-byte exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Delay after an opcode byte
    pub command_delay: Duration,
    /// Delay after each argument or payload byte
    pub byte_delay: Duration,
}

impl Timing {
    /// No delays, for emulated links
    pub const fn none() -> Self {
        Self {
            command_delay: Duration::ZERO,
            byte_delay: Duration::ZERO,
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            command_delay: Duration::from_millis(10),
            byte_delay: Duration::from_millis(1),
        }
    }
}

/// Which peripherals a power command applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peripherals {
    pub fan: bool,
    pub laser: bool,
}

impl Peripherals {
    pub const ALL: Self = Self::new(true, true);
    pub const FAN: Self = Self::new(true, false);
    pub const LASER: Self = Self::new(false, true);
    pub const NONE: Self = Self::new(false, false);

    pub const fn new(fan: bool, laser: bool) -> Self {
        Self { fan, laser }
    }

    /// Sub-command byte for switching these peripherals on
    ///
    /// `None` when nothing is selected; only the priming byte is sent then.
    pub fn on_code(&self) -> Option<u8> {
        match (self.fan, self.laser) {
            (true, true) => Some(power::ON_ALL),
            (true, false) => Some(power::ON_FAN),
            (false, true) => Some(power::ON_LASER),
            (false, false) => None,
        }
    }

    /// Sub-command byte for switching these peripherals off
    pub fn off_code(&self) -> Option<u8> {
        match (self.fan, self.laser) {
            (true, true) => Some(power::OFF_ALL),
            (true, false) => Some(power::OFF_FAN),
            (false, true) => Some(power::OFF_LASER),
            (false, false) => None,
        }
    }
}

impl Default for Peripherals {
    fn default() -> Self {
        Self::ALL
    }
}
