//! Decoding of the fixed-layout binary blocks
//!
//! All blocks are packed little-endian structs. Field offsets are listed in
//! [`histogram_layout`] and [`config_layout`]; each offset is the previous one
//! plus the previous field's size.

use core::fmt;

use crate::error::{Opcn2Error, Result};
use crate::protocol::{CONFIG_LEN, HISTOGRAM_LEN, PM_LEN};

/// Number of histogram bins
pub const BIN_COUNT: usize = 16;
/// Number of mean time-of-flight values
pub const MTOF_COUNT: usize = 4;

/// Histogram block layout
pub mod histogram_layout {
    use super::{BIN_COUNT, MTOF_COUNT};

    /// 16 x u16 bin counts
    pub const BINS: usize = 0;
    /// 4 x u8 mean time-of-flight
    pub const MTOF: usize = BINS + 2 * BIN_COUNT;
    /// f32 sample flow rate
    pub const SAMPLE_FLOW_RATE: usize = MTOF + MTOF_COUNT;
    /// u32 temperature or pressure
    pub const WEATHER: usize = SAMPLE_FLOW_RATE + 4;
    /// f32 sampling period
    pub const SAMPLING_PERIOD: usize = WEATHER + 4;
    /// u16 checksum over the bin counts
    pub const CHECKSUM: usize = SAMPLING_PERIOD + 4;
    /// 3 x f32 PM1, PM2.5, PM10
    pub const PM: usize = CHECKSUM + 2;
    /// End of the block
    pub const END: usize = PM + 12;
}

/// Configuration block layout
pub mod config_layout {
    use super::BIN_COUNT;

    /// 16 x u16 bin boundaries
    pub const BIN_BOUNDARIES: usize = 0;
    /// 16 x f32 particle volume per bin
    pub const BIN_PARTICLE_VOLUME: usize = BIN_BOUNDARIES + 2 * BIN_COUNT;
    /// 16 x f32 particle density per bin
    pub const BIN_PARTICLE_DENSITY: usize = BIN_PARTICLE_VOLUME + 4 * BIN_COUNT;
    /// 16 x f32 weighting per bin
    pub const BIN_PARTICLE_WEIGHTING: usize = BIN_PARTICLE_DENSITY + 4 * BIN_COUNT;
    /// f32 gain scaling coefficient
    pub const GAIN_SCALING_COEFFICIENT: usize = BIN_PARTICLE_WEIGHTING + 4 * BIN_COUNT;
    /// f32 sample flow rate
    pub const SAMPLE_FLOW_RATE: usize = GAIN_SCALING_COEFFICIENT + 4;
    /// u8 laser DAC
    pub const LASER_DAC: usize = SAMPLE_FLOW_RATE + 4;
    /// u8 fan DAC
    pub const FAN_DAC: usize = LASER_DAC + 1;
    /// u8 time-of-flight to sample flow rate factor
    pub const TOF_TO_SFR_FACTOR: usize = FAN_DAC + 1;
    /// End of the decoded fields; the rest of the block is unused
    pub const END: usize = TOF_TO_SFR_FACTOR + 1;
}

const _: () = assert!(histogram_layout::END == HISTOGRAM_LEN);
const _: () = assert!(config_layout::END <= CONFIG_LEN);

/// Temperature in whole degrees above which the field is taken to be pressure
///
/// Compared after scaling the raw tenths by 1/10, so raw values above 2000
/// are pressure. The sensor reports temperature and pressure in the same
/// field with no tag; this cut-off is the only discriminator there is.
pub const TEMPERATURE_LIMIT: f64 = 200.0;

fn le_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn le_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn le_f32(data: &[u8], offset: usize) -> f32 {
    f32::from_bits(le_u32(data, offset))
}

fn le_u16_array<const N: usize>(data: &[u8], offset: usize) -> [u16; N] {
    core::array::from_fn(|i| le_u16(data, offset + 2 * i))
}

fn le_f32_array<const N: usize>(data: &[u8], offset: usize) -> [f32; N] {
    core::array::from_fn(|i| le_f32(data, offset + 4 * i))
}

/// Dual-purpose temperature/pressure field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Weather {
    /// Degrees Celsius (raw value / 10)
    Temperature(f32),
    /// Pascal (raw value)
    Pressure(u32),
}

impl Weather {
    /// Interpret the raw field
    pub fn from_raw(raw: u32) -> Self {
        let temperature = raw as f64 / 10.0;
        if temperature > TEMPERATURE_LIMIT {
            Weather::Pressure(raw)
        } else {
            Weather::Temperature(temperature as f32)
        }
    }

    /// Field name used in the units table
    pub fn name(&self) -> &'static str {
        match self {
            Weather::Temperature(_) => "temperature",
            Weather::Pressure(_) => "pressure",
        }
    }
}

/// PM mass concentrations in micrograms per cubic metre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PmValues {
    pub pm1: f32,
    pub pm2_5: f32,
    pub pm10: f32,
}

impl PmValues {
    /// Whether PM1 <= PM2.5 <= PM10 holds (false if any value is NaN)
    pub fn is_ordered(&self) -> bool {
        self.pm1 <= self.pm2_5 && self.pm2_5 <= self.pm10
    }
}

/// One decoded histogram block
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Particle counts per bin
    pub bins: [u16; BIN_COUNT],
    /// Mean time of flight for bins 1, 3, 5 and 7
    pub mtof: [f32; MTOF_COUNT],
    pub sample_flow_rate: f32,
    pub weather: Weather,
    pub sampling_period: f32,
    /// Checksum as sent by the sensor
    pub checksum: u16,
    pub pm: PmValues,
    /// Set when the bin counts do not add up to the checksum
    pub checksum_error: bool,
}

/// Decoded configuration block
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigData {
    pub bin_boundaries: [u16; BIN_COUNT],
    pub bin_particle_volume: [f32; BIN_COUNT],
    pub bin_particle_density: [f32; BIN_COUNT],
    pub bin_particle_weighting: [f32; BIN_COUNT],
    pub gain_scaling_coefficient: f32,
    pub sample_flow_rate: f32,
    pub laser_dac: u8,
    pub fan_dac: u8,
    pub tof_to_sfr_factor: u8,
}

/// A decoded value, for listing fields by name
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Byte(u8),
    Long(u32),
    Float(f32),
    Flag(bool),
    Words(Vec<u16>),
    Floats(Vec<f32>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Byte(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Flag(v) => write!(f, "{}", v),
            Value::Words(v) => write!(f, "{:?}", v),
            Value::Floats(v) => write!(f, "{:?}", v),
        }
    }
}

/// Sum of the bin counts modulo 2^16
pub fn bin_checksum(bins: &[u16]) -> u16 {
    bins.iter().fold(0u16, |acc, &b| acc.wrapping_add(b))
}

/// Decode a histogram block
///
/// A checksum mismatch only sets [`Histogram::checksum_error`]; PM values
/// that are not increasing fail the whole decode.
pub fn decode_histogram(data: &[u8; HISTOGRAM_LEN]) -> Result<Histogram> {
    use histogram_layout::*;

    let bins: [u16; BIN_COUNT] = le_u16_array(data, BINS);
    let mtof: [f32; MTOF_COUNT] = core::array::from_fn(|i| data[MTOF + i] as f32 / 3.0);
    let checksum = le_u16(data, CHECKSUM);
    let [pm1, pm2_5, pm10] = le_f32_array::<3>(data, PM);
    let pm = PmValues { pm1, pm2_5, pm10 };

    if !pm.is_ordered() {
        return Err(Opcn2Error::PmOutOfOrder { pm1, pm2_5, pm10 });
    }

    let checksum_error = bin_checksum(&bins) != checksum;
    if checksum_error {
        log::warn!(
            "opcn2: Histogram checksum mismatch (sum 0x{:04X}, sent 0x{:04X})",
            bin_checksum(&bins),
            checksum
        );
    }

    Ok(Histogram {
        bins,
        mtof,
        sample_flow_rate: le_f32(data, SAMPLE_FLOW_RATE),
        weather: Weather::from_raw(le_u32(data, WEATHER)),
        sampling_period: le_f32(data, SAMPLING_PERIOD),
        checksum,
        pm,
        checksum_error,
    })
}

/// Decode a configuration block
pub fn decode_config(data: &[u8; CONFIG_LEN]) -> ConfigData {
    use config_layout::*;

    ConfigData {
        bin_boundaries: le_u16_array(data, BIN_BOUNDARIES),
        bin_particle_volume: le_f32_array(data, BIN_PARTICLE_VOLUME),
        bin_particle_density: le_f32_array(data, BIN_PARTICLE_DENSITY),
        bin_particle_weighting: le_f32_array(data, BIN_PARTICLE_WEIGHTING),
        gain_scaling_coefficient: le_f32(data, GAIN_SCALING_COEFFICIENT),
        sample_flow_rate: le_f32(data, SAMPLE_FLOW_RATE),
        laser_dac: data[LASER_DAC],
        fan_dac: data[FAN_DAC],
        tof_to_sfr_factor: data[TOF_TO_SFR_FACTOR],
    }
}

/// Decode a PM block
pub fn decode_pm(data: &[u8; PM_LEN]) -> PmValues {
    let [pm1, pm2_5, pm10] = le_f32_array::<3>(data, 0);
    PmValues { pm1, pm2_5, pm10 }
}

impl Histogram {
    /// Fields in wire order, named as in the units table
    pub fn entries(&self) -> Vec<(&'static str, Value)> {
        let weather = match self.weather {
            Weather::Temperature(t) => Value::Float(t),
            Weather::Pressure(p) => Value::Long(p),
        };
        vec![
            ("bins", Value::Words(self.bins.to_vec())),
            ("mtof", Value::Floats(self.mtof.to_vec())),
            ("sample flow rate", Value::Float(self.sample_flow_rate)),
            (self.weather.name(), weather),
            ("sampling period", Value::Float(self.sampling_period)),
            ("pm1", Value::Float(self.pm.pm1)),
            ("pm2.5", Value::Float(self.pm.pm2_5)),
            ("pm10", Value::Float(self.pm.pm10)),
            ("error", Value::Flag(self.checksum_error)),
        ]
    }
}

impl ConfigData {
    /// Fields in wire order
    pub fn entries(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("bin boundaries", Value::Words(self.bin_boundaries.to_vec())),
            (
                "bin particle volume",
                Value::Floats(self.bin_particle_volume.to_vec()),
            ),
            (
                "bin particle density",
                Value::Floats(self.bin_particle_density.to_vec()),
            ),
            (
                "bin particle weighting",
                Value::Floats(self.bin_particle_weighting.to_vec()),
            ),
            (
                "gain scaling coefficient",
                Value::Float(self.gain_scaling_coefficient),
            ),
            ("sample flow rate", Value::Float(self.sample_flow_rate)),
            ("laser dac", Value::Byte(self.laser_dac)),
            ("fan dac", Value::Byte(self.fan_dac)),
            ("tof to sfr factor", Value::Byte(self.tof_to_sfr_factor)),
        ]
    }
}
