//! CLI argument parsing

use clap::{Parser, Subcommand};

/// Parse a string as a hex or decimal u8
fn parse_level(s: &str) -> Result<u8, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u8>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Default log filter for a `-v` count
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

#[derive(Parser)]
#[command(name = "opcn2")]
#[command(author, version, about = "Alphasense OPC-N2 reader over USB-ISS", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Serial device of the USB-ISS adapter (e.g. /dev/ttyACM0), or "dummy"
    pub device: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which peripherals a power command applies to
#[derive(clap::Args, Debug, Clone, Copy, Default)]
pub struct PeripheralArgs {
    /// Only the fan
    #[arg(long, conflicts_with = "laser_only")]
    pub fan_only: bool,

    /// Only the laser
    #[arg(long)]
    pub laser_only: bool,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Switch on
    On,
    /// Switch off
    Off,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show firmware version and configuration
    Info,

    /// Power on and print histograms periodically
    Sample {
        /// Seconds to let samples collect between reads
        #[arg(short, long, default_value_t = 10.0)]
        interval: f64,

        /// Stop after this many readings (default: run forever)
        #[arg(short = 'n', long)]
        count: Option<u64>,

        /// Print readings whose checksum does not match instead of skipping them
        #[arg(long)]
        keep_errors: bool,

        /// Leave fan and laser on when done
        #[arg(long)]
        no_power_off: bool,
    },

    /// Print PM1, PM2.5 and PM10 once
    Pm,

    /// Check whether the sensor answers the readiness poll
    Ready,

    /// Switch fan and laser on or off
    Power {
        #[arg(value_enum)]
        state: PowerState,

        #[command(flatten)]
        which: PeripheralArgs,
    },

    /// Set laser power level (0-255)
    Laser {
        #[arg(value_parser = parse_level)]
        level: u8,
    },

    /// Set fan power level (0-255)
    Fan {
        #[arg(value_parser = parse_level)]
        level: u8,
    },
}
