//! One-shot sensor commands

use opcn2_sensor::units::unit_of;
use opcn2_sensor::Peripherals;

use crate::cli::PeripheralArgs;
use crate::sensor::Sensor;

impl From<PeripheralArgs> for Peripherals {
    fn from(args: PeripheralArgs) -> Self {
        match (args.fan_only, args.laser_only) {
            (true, _) => Peripherals::FAN,
            (_, true) => Peripherals::LASER,
            _ => Peripherals::ALL,
        }
    }
}

/// Print one PM block
pub fn run_pm(opc: &mut Sensor) -> Result<(), Box<dyn std::error::Error>> {
    let pm = opc.pm()?;
    let unit = unit_of("pm1").unwrap_or_default();
    println!("PM1:   {:>8.2} {}", pm.pm1, unit);
    println!("PM2.5: {:>8.2} {}", pm.pm2_5, unit);
    println!("PM10:  {:>8.2} {}", pm.pm10, unit);
    Ok(())
}

/// Report readiness
pub fn run_ready(opc: &mut Sensor) -> Result<(), Box<dyn std::error::Error>> {
    if opc.ready()? {
        println!("Sensor ready");
        Ok(())
    } else {
        Err("Sensor not ready".into())
    }
}

/// Switch peripherals on or off
pub fn run_power(
    opc: &mut Sensor,
    on: bool,
    peripherals: Peripherals,
) -> Result<(), Box<dyn std::error::Error>> {
    if on {
        opc.power_on(peripherals)?;
    } else {
        opc.power_off(peripherals)?;
    }
    let which = match (peripherals.fan, peripherals.laser) {
        (true, true) => "Fan and laser",
        (true, false) => "Fan",
        (false, true) => "Laser",
        (false, false) => "Nothing",
    };
    println!("{} switched {}", which, if on { "on" } else { "off" });
    Ok(())
}

/// Set laser power
pub fn run_laser(opc: &mut Sensor, level: u8) -> Result<(), Box<dyn std::error::Error>> {
    opc.set_laser_power(level)?;
    println!("Laser power set to {}", level);
    Ok(())
}

/// Set fan power
pub fn run_fan(opc: &mut Sensor, level: u8) -> Result<(), Box<dyn std::error::Error>> {
    opc.set_fan_power(level)?;
    println!("Fan power set to {}", level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peripheral_args() {
        let args = PeripheralArgs::default();
        assert_eq!(Peripherals::from(args), Peripherals::ALL);

        let args = PeripheralArgs {
            fan_only: true,
            laser_only: false,
        };
        assert_eq!(Peripherals::from(args), Peripherals::FAN);

        let args = PeripheralArgs {
            fan_only: false,
            laser_only: true,
        };
        assert_eq!(Peripherals::from(args), Peripherals::LASER);
    }
}
