//! `summit` - sample the terrain around an eight-thousander and export a wireframe scene.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use summit_dem::peaks;
use summit_runner::{resolve_api_key, run, Cli, RunnerConfig, RunnerError};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if cli.list_peaks {
        for peak in peaks::eight_thousanders() {
            println!(
                "{:<14} {:>5.0} m  {:.4}°N {:.4}°E",
                peak.name, peak.reference_height, peak.latitude, peak.longitude
            );
        }
        return;
    }

    if let Err(e) = run_cli(&cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run_cli(cli: &Cli) -> Result<(), RunnerError> {
    // A missing .env file is fine; the key may come from the real environment.
    dotenvy::dotenv().ok();

    let config = RunnerConfig::from_cli(cli)?;
    let api_key = resolve_api_key(cli.api_key.as_deref(), |name| std::env::var(name).ok())?;

    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::Relaxed)) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    let report = run(&config, api_key, Some(&*cancel))?;

    let summit = report.projected.peak();
    println!(
        "{}: {} points in {} requests, highest sample {:.1} m (surveyed {:.0} m)",
        report.peak.name,
        report.stats.points_fetched,
        report.stats.batches_sent,
        summit.z,
        report.peak.reference_height
    );
    if config.output.is_none() {
        info!("Pass --output <file> to save the wireframe scene as JSON");
    }
    Ok(())
}
