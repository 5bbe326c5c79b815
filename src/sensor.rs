//! Opening the sensor from a device argument
//!
//! A serial path opens real hardware with the sensor's timing; `dummy` opens
//! the in-process emulator with no delays.

use opcn2_sensor::{Opcn2, Timing};
use opcn2_usbiss::protocol::CONTROL_BAUD;
use opcn2_usbiss::{LinkConfig, SerialTransport, Transport, UsbIss};

/// Sensor behind any transport
pub type Sensor = Opcn2<Box<dyn Transport>>;

/// Open the sensor named by `device`
pub fn open_sensor(device: &str) -> Result<Sensor, Box<dyn std::error::Error>> {
    let link = LinkConfig::default();

    let (transport, timing): (Box<dyn Transport>, Timing) = match device {
        #[cfg(feature = "dummy")]
        "dummy" => {
            log::info!("Using emulated OPC-N2");
            (
                Box::new(opcn2_dummy::DummyOpc::new_default()) as Box<dyn Transport>,
                Timing::none(),
            )
        }
        path => {
            // Reject the link settings before touching the port
            link.divisor()?;
            (
                Box::new(SerialTransport::open(path, CONTROL_BAUD)?) as Box<dyn Transport>,
                Timing::default(),
            )
        }
    };

    let iss = UsbIss::open(transport, link)?;
    Ok(Opcn2::open(iss, timing)?)
}
