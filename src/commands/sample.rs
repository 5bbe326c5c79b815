//! Sample command implementation

use std::thread;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use opcn2_sensor::{Histogram, Peripherals};

use crate::sensor::Sensor;

/// Options for the sampling loop
#[derive(Debug, Clone)]
pub struct SampleOptions {
    /// Seconds between histogram reads
    pub interval: f64,
    /// Number of readings to print, or forever
    pub count: Option<u64>,
    /// Print readings with a checksum mismatch
    pub keep_errors: bool,
    /// Switch fan and laser off when done
    pub power_off: bool,
}

/// Run the sampling loop
pub fn run_sample(
    opc: &mut Sensor,
    opts: &SampleOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let interval = Duration::try_from_secs_f64(opts.interval)
        .map_err(|e| format!("Invalid interval {}: {}", opts.interval, e))?;

    opc.power_on(Peripherals::ALL)?;
    log::info!("Fan and laser on, sampling every {:?}", interval);

    let result = sample_loop(opc, interval, opts);

    if opts.power_off {
        let powered_off = opc.power_off(Peripherals::ALL);
        // A sampling failure is the more useful error to report
        if result.is_ok() {
            powered_off?;
            log::info!("Fan and laser off");
        } else if let Err(e) = powered_off {
            log::error!("Failed to switch fan and laser off: {}", e);
        }
    }

    result
}

fn sample_loop(
    opc: &mut Sensor,
    interval: Duration,
    opts: &SampleOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut printed = 0u64;

    while opts.count.map_or(true, |count| printed < count) {
        // Let samples collect before reading
        wait_with_progress(interval)?;

        let histogram = opc.histogram()?;
        if histogram.checksum_error && !opts.keep_errors {
            log::warn!("Discarding histogram with checksum error");
            continue;
        }

        print_histogram(opc, &histogram);
        printed += 1;
    }

    Ok(())
}

/// Sleep for `interval`, showing a countdown bar on long waits
fn wait_with_progress(interval: Duration) -> Result<(), Box<dyn std::error::Error>> {
    if interval < Duration::from_secs(1) {
        thread::sleep(interval);
        return Ok(());
    }

    let total_ms = interval.as_millis() as u64;
    let pb = ProgressBar::new(total_ms);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Collecting [{bar:40.cyan/blue}] {eta}")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    while start.elapsed() < interval {
        let remaining = interval.saturating_sub(start.elapsed());
        thread::sleep(remaining.min(Duration::from_millis(100)));
        pb.set_position(start.elapsed().as_millis().min(total_ms as u128) as u64);
    }
    pb.finish_and_clear();
    Ok(())
}

fn print_histogram(opc: &Sensor, histogram: &Histogram) {
    println!("--- bins");
    for (volume, count) in opc
        .config()
        .bin_particle_volume
        .iter()
        .zip(histogram.bins.iter())
    {
        println!("{} {}", volume, count);
    }
    println!();

    println!("--- data");
    super::print_entries(&histogram.entries());
    println!();
}
