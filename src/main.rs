//! opcn2 - Alphasense OPC-N2 reader
//!
//! Talks to an OPC-N2 optical particle counter through a USB-ISS
//! serial-to-SPI adapter and prints its histogram and PM readings.

mod cli;
mod commands;
mod sensor;

use clap::Parser;
use cli::{Cli, Commands, PowerState};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logger; RUST_LOG still wins when set
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli::log_filter(cli.verbose)),
    )
    .init();

    let mut opc = sensor::open_sensor(&cli.device)?;

    let result = match cli.command {
        Commands::Info => commands::info::run_info(&opc),
        Commands::Sample {
            interval,
            count,
            keep_errors,
            no_power_off,
        } => commands::sample::run_sample(
            &mut opc,
            &commands::sample::SampleOptions {
                interval,
                count,
                keep_errors,
                power_off: !no_power_off,
            },
        ),
        Commands::Pm => commands::control::run_pm(&mut opc),
        Commands::Ready => commands::control::run_ready(&mut opc),
        Commands::Power { state, which } => {
            commands::control::run_power(&mut opc, state == PowerState::On, which.into())
        }
        Commands::Laser { level } => commands::control::run_laser(&mut opc, level),
        Commands::Fan { level } => commands::control::run_fan(&mut opc, level),
    };

    // Release the adapter even if the command failed
    let closed = opc.close();
    result?;
    closed?;
    Ok(())
}
