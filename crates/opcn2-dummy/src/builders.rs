//! Encoders for the sensor's binary blocks
//!
//! These write the same packed little-endian layouts the sensor sends, so
//! tests can describe a block by its fields instead of by raw bytes.

/// Histogram block length
pub const HISTOGRAM_LEN: usize = 62;
/// Configuration block length
pub const CONFIG_LEN: usize = 256;

/// Builds a histogram block
#[derive(Debug, Clone)]
pub struct HistogramBuilder {
    bins: [u16; 16],
    mtof: [u8; 4],
    sample_flow_rate: f32,
    weather: u32,
    sampling_period: f32,
    checksum: Option<u16>,
    pm: [f32; 3],
}

impl HistogramBuilder {
    /// All fields zero, checksum computed from the bins
    pub fn new() -> Self {
        Self {
            bins: [0; 16],
            mtof: [0; 4],
            sample_flow_rate: 0.0,
            weather: 0,
            sampling_period: 0.0,
            checksum: None,
            pm: [0.0; 3],
        }
    }

    pub fn bins(mut self, bins: [u16; 16]) -> Self {
        self.bins = bins;
        self
    }

    pub fn mtof(mut self, mtof: [u8; 4]) -> Self {
        self.mtof = mtof;
        self
    }

    pub fn sample_flow_rate(mut self, rate: f32) -> Self {
        self.sample_flow_rate = rate;
        self
    }

    /// Raw temperature/pressure field
    pub fn weather(mut self, raw: u32) -> Self {
        self.weather = raw;
        self
    }

    pub fn sampling_period(mut self, period: f32) -> Self {
        self.sampling_period = period;
        self
    }

    /// Override the checksum instead of summing the bins
    pub fn checksum(mut self, checksum: u16) -> Self {
        self.checksum = Some(checksum);
        self
    }

    pub fn pm(mut self, pm: [f32; 3]) -> Self {
        self.pm = pm;
        self
    }

    pub fn build(&self) -> [u8; HISTOGRAM_LEN] {
        let mut out = Packer::<HISTOGRAM_LEN>::new();
        for bin in self.bins {
            out.put(&bin.to_le_bytes());
        }
        out.put(&self.mtof);
        out.put(&self.sample_flow_rate.to_le_bytes());
        out.put(&self.weather.to_le_bytes());
        out.put(&self.sampling_period.to_le_bytes());
        let checksum = self
            .checksum
            .unwrap_or_else(|| self.bins.iter().fold(0u16, |acc, &b| acc.wrapping_add(b)));
        out.put(&checksum.to_le_bytes());
        for pm in self.pm {
            out.put(&pm.to_le_bytes());
        }
        out.finish()
    }
}

impl Default for HistogramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a configuration block
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    bin_boundaries: [u16; 16],
    bin_particle_volume: [f32; 16],
    bin_particle_density: [f32; 16],
    bin_particle_weighting: [f32; 16],
    gain_scaling_coefficient: f32,
    sample_flow_rate: f32,
    laser_dac: u8,
    fan_dac: u8,
    tof_to_sfr_factor: u8,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            bin_boundaries: [0; 16],
            bin_particle_volume: [0.0; 16],
            bin_particle_density: [0.0; 16],
            bin_particle_weighting: [0.0; 16],
            gain_scaling_coefficient: 0.0,
            sample_flow_rate: 0.0,
            laser_dac: 0,
            fan_dac: 0,
            tof_to_sfr_factor: 0,
        }
    }

    pub fn bin_boundaries(mut self, v: [u16; 16]) -> Self {
        self.bin_boundaries = v;
        self
    }

    pub fn bin_particle_volume(mut self, v: [f32; 16]) -> Self {
        self.bin_particle_volume = v;
        self
    }

    pub fn bin_particle_density(mut self, v: [f32; 16]) -> Self {
        self.bin_particle_density = v;
        self
    }

    pub fn bin_particle_weighting(mut self, v: [f32; 16]) -> Self {
        self.bin_particle_weighting = v;
        self
    }

    pub fn gain_scaling_coefficient(mut self, v: f32) -> Self {
        self.gain_scaling_coefficient = v;
        self
    }

    pub fn sample_flow_rate(mut self, v: f32) -> Self {
        self.sample_flow_rate = v;
        self
    }

    pub fn laser_dac(mut self, v: u8) -> Self {
        self.laser_dac = v;
        self
    }

    pub fn fan_dac(mut self, v: u8) -> Self {
        self.fan_dac = v;
        self
    }

    pub fn tof_to_sfr_factor(mut self, v: u8) -> Self {
        self.tof_to_sfr_factor = v;
        self
    }

    /// Encode; bytes past the last field stay zero
    pub fn build(&self) -> [u8; CONFIG_LEN] {
        let mut out = Packer::<CONFIG_LEN>::new();
        for v in self.bin_boundaries {
            out.put(&v.to_le_bytes());
        }
        for table in [
            &self.bin_particle_volume,
            &self.bin_particle_density,
            &self.bin_particle_weighting,
        ] {
            for v in table {
                out.put(&v.to_le_bytes());
            }
        }
        out.put(&self.gain_scaling_coefficient.to_le_bytes());
        out.put(&self.sample_flow_rate.to_le_bytes());
        out.put(&[self.laser_dac, self.fan_dac, self.tof_to_sfr_factor]);
        out.finish()
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Sequential writer into a fixed-size block
struct Packer<const N: usize> {
    buf: [u8; N],
    pos: usize,
}

impl<const N: usize> Packer<N> {
    fn new() -> Self {
        Self {
            buf: [0; N],
            pos: 0,
        }
    }

    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    fn finish(self) -> [u8; N] {
        self.buf
    }
}
