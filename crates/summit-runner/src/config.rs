//! Runner configuration: defaults, YAML file, command-line overrides.
//!
//! Precedence is command line over config file over built-in defaults.
//!
//! ```yaml
//! peak: K2
//! grid_size: 40
//! area_deg: 0.12
//! batch_size: 100
//! batch_delay_ms: 100
//! output: k2_scene.json
//! ```

use crate::RunnerError;
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use summit_dem::{FetchConfig, DEFAULT_BATCH_SIZE, DEFAULT_ENDPOINT};

/// Environment variable holding the elevation service key.
pub const API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "summit",
    version,
    about = "Sample terrain around an eight-thousander and export a 3D wireframe scene"
)]
pub struct Cli {
    /// Mountain to visualize (case-insensitive, e.g. "Everest", "k2", "Gasherbrum 2")
    #[arg(short, long)]
    pub peak: Option<String>,

    /// Number of samples per side of the grid
    #[arg(long)]
    pub grid_size: Option<usize>,

    /// Width and height of the sampled square, in degrees
    #[arg(long)]
    pub area_deg: Option<f64>,

    /// Locations per elevation request (1-512)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Pause between elevation requests, in milliseconds
    #[arg(long)]
    pub batch_delay_ms: Option<u64>,

    /// Elevation service endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Elevation service key (defaults to $GOOGLE_MAPS_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the wireframe scene as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// List the available peaks and exit
    #[arg(long)]
    pub list_peaks: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Settings for one run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Peak name.
    pub peak: String,
    /// Samples per grid side.
    pub grid_size: usize,
    /// Sampled area in degrees.
    pub area_deg: f64,
    /// Locations per request.
    pub batch_size: usize,
    /// Pause between requests in milliseconds.
    pub batch_delay_ms: u64,
    /// Elevation service endpoint.
    pub endpoint: String,
    /// Scene output path.
    pub output: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            peak: "Everest".to_string(),
            grid_size: 50,
            area_deg: 0.15,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay_ms: 100,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            output: None,
        }
    }
}

impl RunnerConfig {
    /// Parse a YAML document. Missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RunnerError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RunnerError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Resolve the configuration for `cli`: file (if any), then flag overrides.
    pub fn from_cli(cli: &Cli) -> Result<Self, RunnerError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(cli);
        Ok(config)
    }

    /// Overwrite fields that were given on the command line.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(peak) = &cli.peak {
            self.peak = peak.clone();
        }
        if let Some(grid_size) = cli.grid_size {
            self.grid_size = grid_size;
        }
        if let Some(area_deg) = cli.area_deg {
            self.area_deg = area_deg;
        }
        if let Some(batch_size) = cli.batch_size {
            self.batch_size = batch_size;
        }
        if let Some(delay) = cli.batch_delay_ms {
            self.batch_delay_ms = delay;
        }
        if let Some(endpoint) = &cli.endpoint {
            self.endpoint = endpoint.clone();
        }
        if let Some(output) = &cli.output {
            self.output = Some(output.clone());
        }
    }

    /// Fetch settings for this run.
    pub fn fetch_config(&self, api_key: String) -> FetchConfig {
        FetchConfig::new(api_key)
            .with_batch_size(self.batch_size)
            .with_batch_delay(Duration::from_millis(self.batch_delay_ms))
    }
}

/// Pick the API key: explicit value first, then `lookup(API_KEY_ENV)`.
///
/// Blank values count as missing.
pub fn resolve_api_key<F>(explicit: Option<&str>, lookup: F) -> Result<String, RunnerError>
where
    F: FnOnce(&str) -> Option<String>,
{
    let present = |key: &String| !key.trim().is_empty();
    explicit
        .map(str::to_string)
        .filter(present)
        .or_else(|| lookup(API_KEY_ENV).filter(present))
        .ok_or(RunnerError::MissingApiKey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RunnerConfig::default();
        assert_eq!(config.peak, "Everest");
        assert_eq!(config.grid_size, 50);
        assert_eq!(config.area_deg, 0.15);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.batch_delay_ms, 100);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(config.output.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = RunnerConfig::from_yaml_str("peak: K2\ngrid_size: 20\n").unwrap();
        assert_eq!(config.peak, "K2");
        assert_eq!(config.grid_size, 20);
        assert_eq!(config.area_deg, 0.15);
        assert_eq!(config.batch_size, 100);
    }

    #[test]
    fn test_unknown_yaml_field_rejected() {
        assert!(matches!(
            RunnerConfig::from_yaml_str("peek: K2\n"),
            Err(RunnerError::Yaml(_))
        ));
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "peak: Lhotse\ngrid_size: 30\nbatch_delay_ms: 250").unwrap();

        let path = file.path().to_str().unwrap();
        let cli = Cli::parse_from(["summit", "--config", path, "--grid-size", "12", "-o", "out.json"]);
        let config = RunnerConfig::from_cli(&cli).unwrap();

        assert_eq!(config.peak, "Lhotse");
        assert_eq!(config.grid_size, 12);
        assert_eq!(config.batch_delay_ms, 250);
        assert_eq!(config.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_missing_config_file() {
        let cli = Cli::parse_from(["summit", "--config", "/nonexistent/summit.yaml"]);
        assert!(matches!(RunnerConfig::from_cli(&cli), Err(RunnerError::Io(_))));
    }

    #[test]
    fn test_fetch_config() {
        let config = RunnerConfig {
            batch_size: 50,
            batch_delay_ms: 0,
            ..RunnerConfig::default()
        };
        let fetch = config.fetch_config("key".to_string());
        assert_eq!(fetch.api_key, "key");
        assert_eq!(fetch.batch_size, 50);
        assert!(fetch.batch_delay.is_zero());
    }

    #[test]
    fn test_resolve_api_key() {
        assert_eq!(
            resolve_api_key(Some("cli"), |_| Some("env".to_string())).unwrap(),
            "cli"
        );
        assert_eq!(
            resolve_api_key(None, |name| {
                assert_eq!(name, API_KEY_ENV);
                Some("env".to_string())
            })
            .unwrap(),
            "env"
        );
        assert!(matches!(
            resolve_api_key(None, |_| None),
            Err(RunnerError::MissingApiKey)
        ));
        assert!(matches!(
            resolve_api_key(None, |_| Some("   ".to_string())),
            Err(RunnerError::MissingApiKey)
        ));
    }

    #[test]
    fn test_blank_explicit_key_falls_back_to_env() {
        assert_eq!(
            resolve_api_key(Some(""), |_| Some("env".to_string())).unwrap(),
            "env"
        );
        assert_eq!(
            resolve_api_key(Some("  "), |_| Some("env".to_string())).unwrap(),
            "env"
        );
        assert!(matches!(
            resolve_api_key(Some(""), |_| Some(" ".to_string())),
            Err(RunnerError::MissingApiKey)
        ));
    }
}
