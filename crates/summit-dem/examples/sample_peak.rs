//! Example: Sample and project the terrain around a catalogued peak.
//!
//! Usage: GOOGLE_MAPS_API_KEY=... cargo run --example sample_peak -- <peak> [grid_size] [area_deg]

use summit_dem::{find_peak, project, peaks, ElevationFetcher, FetchConfig, SamplingGrid};
use std::env;
use std::time::Instant;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <peak> [grid_size] [area_deg]", args[0]);
        eprintln!("Peaks: {}", peaks::peak_names().join(", "));
        std::process::exit(1);
    }

    let peak = find_peak(&args[1]).unwrap_or_else(|| {
        eprintln!("Unknown peak '{}'", args[1]);
        std::process::exit(1);
    });
    let grid_size: usize = args.get(2).map(|s| s.parse().expect("Invalid grid size")).unwrap_or(20);
    let area_deg: f64 = args.get(3).map(|s| s.parse().expect("Invalid area size")).unwrap_or(0.15);
    let api_key = env::var("GOOGLE_MAPS_API_KEY").expect("GOOGLE_MAPS_API_KEY must be set");

    let grid = SamplingGrid::generate(peak.latitude, peak.longitude, grid_size, area_deg)
        .expect("Invalid grid parameters");
    let fetcher = ElevationFetcher::google(FetchConfig::new(api_key)).expect("Failed to build fetcher");

    println!("Fetching {} points around {}...", grid.len(), peak.name);
    let start = Instant::now();

    let elevation = match fetcher.fetch(&grid) {
        Ok(elevation) => elevation,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let stats = fetcher.stats();
    println!(
        "Fetched {} points in {} batches ({:.2}s)",
        stats.points_fetched,
        stats.batches_sent,
        start.elapsed().as_secs_f64()
    );

    let projected = project(&grid, &elevation).expect("Grid shapes always match");
    let (min, max) = projected.elevation_range();
    let summit = projected.peak();
    println!("Elevation range: {:.1} m to {:.1} m", min, max);
    println!(
        "Highest sample at row {}, col {}: ({:.0} m E, {:.0} m N) {:.1} m (surveyed {:.0} m)",
        summit.row, summit.col, summit.x, summit.y, summit.z, peak.reference_height
    );
}
