//! # summit-runner
//!
//! Command-line front end for `summit-dem`: resolves the peak and settings,
//! samples and fetches the terrain, projects it, and exports a wireframe scene.

pub mod config;
pub mod scene;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use summit_dem::{
    find_peak, peaks, project, DemError, ElevationFetcher, ElevationTransport, FetchStats,
    HttpTransport, Pacer, Peak, ProjectedGrid, SamplingGrid,
};
use thiserror::Error;
use tracing::info;

pub use config::{resolve_api_key, Cli, RunnerConfig, API_KEY_ENV};
pub use scene::WireframeScene;

/// Errors that can occur while running the pipeline.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Terrain error: {0}")]
    Dem(#[from] DemError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration file error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("'{name}' is not a known peak. Available peaks: {available}")]
    UnknownPeak { name: String, available: String },

    #[error("No elevation API key: pass --api-key or set {} (a .env file works too)", API_KEY_ENV)]
    MissingApiKey,
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// The peak that was sampled.
    pub peak: Peak,
    /// Projected terrain.
    pub projected: ProjectedGrid,
    /// Scene built from the terrain.
    pub scene: WireframeScene,
    /// Requests made for this run.
    pub stats: FetchStats,
}

/// Look up a catalogued peak, failing with the list of known names.
pub fn resolve_peak(name: &str) -> Result<Peak, RunnerError> {
    find_peak(name).ok_or_else(|| RunnerError::UnknownPeak {
        name: name.to_string(),
        available: peaks::peak_names().join(", "),
    })
}

/// Run against the configured HTTP endpoint.
pub fn run(
    config: &RunnerConfig,
    api_key: String,
    cancel: Option<&AtomicBool>,
) -> Result<RunReport, RunnerError> {
    let transport = HttpTransport::with_endpoint(config.endpoint.clone())?;
    let fetcher = ElevationFetcher::new(transport, config.fetch_config(api_key))?;
    run_with_fetcher(config, &fetcher, cancel)
}

/// Run the pipeline with an already configured fetcher.
pub fn run_with_fetcher<T, P>(
    config: &RunnerConfig,
    fetcher: &ElevationFetcher<T, P>,
    cancel: Option<&AtomicBool>,
) -> Result<RunReport, RunnerError>
where
    T: ElevationTransport,
    P: Pacer,
{
    let peak = resolve_peak(&config.peak)?;
    info!(
        "Visualizing: {} ({:.0} m) at {}°N, {}°E",
        peak.name, peak.reference_height, peak.latitude, peak.longitude
    );

    let grid = SamplingGrid::generate(
        peak.latitude,
        peak.longitude,
        config.grid_size,
        config.area_deg,
    )?;

    let before = fetcher.stats();
    let elevation = fetcher.fetch_with_callback(&grid, None, cancel)?;
    let after = fetcher.stats();

    let projected = project(&grid, &elevation)?;
    let (z_min, z_max) = projected.elevation_range();
    info!("Elevation range: {:.1} m to {:.1} m", z_min, z_max);
    info!("Peak elevation: {:.1} m", z_max);

    let scene = WireframeScene::build(&projected, &peak);
    if let Some(path) = &config.output {
        write_scene(path, &scene)?;
        info!("Wrote scene to {}", path.display());
    }

    Ok(RunReport {
        peak,
        projected,
        scene,
        stats: FetchStats {
            batches_sent: after.batches_sent - before.batches_sent,
            points_fetched: after.points_fetched - before.points_fetched,
        },
    })
}

/// Write `scene` as pretty-printed JSON.
pub fn write_scene<P: AsRef<Path>>(path: P, scene: &WireframeScene) -> Result<(), RunnerError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), scene)?;
    Ok(())
}
