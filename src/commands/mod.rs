//! CLI command implementations
//!
//! Each command takes an already initialized sensor; opening and closing
//! happen in `main`.

pub mod control;
pub mod info;
pub mod sample;

use opcn2_sensor::decode::Value;
use opcn2_sensor::unit_of;

/// Print `name: value unit` lines
pub fn print_entries(entries: &[(&'static str, Value)]) {
    for (name, value) in entries {
        match unit_of(name) {
            Some(unit) => println!("  {:<26} {} {}", name, value, unit),
            None => println!("  {:<26} {}", name, value),
        }
    }
}
