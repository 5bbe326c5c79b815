//! opcn2-sensor - Alphasense OPC-N2 optical particle counter
//!
//! This crate talks to an OPC-N2 through a USB-ISS adapter and decodes the
//! sensor's configuration, histogram and PM blocks.
//!
//! # Architecture
//!
//! - [`channel`]: per-byte command sequencing with acknowledge checks and delays
//! - [`decode`]: pure functions over the fixed-layout binary blocks
//! - [`firmware`]: firmware revision detection and decoder selection
//! - [`device`]: the [`Opcn2`] handle tying the above together
//!
//! Access to one sensor must be serialized by the caller; nothing here locks.
//!
//! # Example
//!
//! ```no_run
//! use opcn2_sensor::{Opcn2, Peripherals};
//!
//! let mut opc = Opcn2::open_serial("/dev/ttyACM0")?;
//! opc.power_on(Peripherals::ALL)?;
//! let histogram = opc.histogram()?;
//! println!("PM2.5: {} ug/m3", histogram.pm.pm2_5);
//! opc.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod channel;
pub mod decode;
pub mod device;
pub mod error;
pub mod firmware;
pub mod protocol;
pub mod units;

// Re-exports
pub use channel::CommandChannel;
pub use decode::{decode_config, decode_histogram, decode_pm, ConfigData, Histogram, PmValues, Weather};
pub use device::Opcn2;
pub use error::{Opcn2Error, Result};
pub use firmware::Firmware;
pub use protocol::{Peripherals, Timing};
pub use units::unit_of;
