//! # summit-dem
//!
//! Terrain sampling around mountain summits: build a latitude/longitude lattice,
//! fetch its elevations from a Google Elevation API compatible service, and
//! project the result into local Cartesian meters for rendering.
//!
//! ## Pipeline
//!
//! 1. [`SamplingGrid::generate`] builds an evenly spaced `n x n` lattice
//!    covering a square of a given angular size around a center point.
//! 2. [`ElevationFetcher::fetch`] flattens the lattice in row-major order, sends
//!    it in batches of at most 100 points, and reassembles an elevation grid of
//!    the same shape. Any failing batch aborts the fetch.
//! 3. [`project`] converts latitude/longitude/elevation into X (east-west),
//!    Y (north-south) and Z (elevation) meters around the lattice centroid.
//!
//! The network side is behind the [`ElevationTransport`] trait so the pipeline
//! can run against a stub service in tests.
//!
//! ## Example
//!
//! ```no_run
//! use summit_dem::{find_peak, project, ElevationFetcher, FetchConfig, SamplingGrid};
//!
//! let everest = find_peak("Everest").expect("catalogued peak");
//! let grid = SamplingGrid::generate(everest.latitude, everest.longitude, 50, 0.15)?;
//!
//! let fetcher = ElevationFetcher::google(FetchConfig::new("my-api-key"))?;
//! let elevation = fetcher.fetch(&grid)?;
//!
//! let projected = project(&grid, &elevation)?;
//! let peak = projected.peak();
//! println!("Highest sample {:.1} m at ({:.0}, {:.0})", peak.z, peak.x, peak.y);
//! # Ok::<(), summit_dem::DemError>(())
//! ```

mod elevation_api;
mod error;
mod grid;
pub mod peaks;
mod project;

pub use elevation_api::{
    plan_batches, BatchProgress, BatchRequest, ElevationFetcher, ElevationGrid,
    ElevationTransport, FetchConfig, FetchStats, HttpTransport, Pacer, ProgressCallback,
    RawResponse, ServiceStatus, SleepPacer, DEFAULT_BATCH_DELAY, DEFAULT_BATCH_SIZE,
    DEFAULT_ENDPOINT, MAX_BATCH_SIZE,
};
pub use error::DemError;
pub use grid::{GeoPoint, Grid2, GridBounds, SamplingGrid, MAX_GRID_POINTS};
pub use peaks::{find_peak, Peak};
pub use project::{project, PeakCell, ProjectedGrid, METERS_PER_DEGREE_LAT};

/// Result type for terrain operations.
pub type Result<T> = std::result::Result<T, DemError>;
