//! Info command implementation

use crate::sensor::Sensor;

/// Print firmware and configuration
pub fn run_info(opc: &Sensor) -> Result<(), Box<dyn std::error::Error>> {
    println!("Firmware: {}", opc.firmware_version());
    println!("Decoder:  {}", opc.firmware());
    println!();
    println!("Configuration:");
    super::print_entries(&opc.config().entries());
    Ok(())
}
