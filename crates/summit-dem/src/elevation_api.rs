//! Batched elevation lookups against a Google Elevation API compatible service.
//!
//! A [`SamplingGrid`] is flattened in row-major order, split into consecutive
//! batches and sent one batch at a time. Each request carries a pipe-delimited
//! `lat,lon` list plus the API key:
//!
//! `https://maps.googleapis.com/maps/api/elevation/json?locations=27.98,86.92|27.99,86.93&key=...`
//!
//! ## Batching
//!
//! The service accepts up to 512 locations per request, but long location lists
//! run into URL length limits well before that, so the default batch is 100
//! points. Batches are sent sequentially with a short pause between them to stay
//! under the service rate limits. No pause follows the final batch.
//!
//! ## Failure handling
//!
//! Any failed batch aborts the whole fetch. The caller never sees a partially
//! filled grid, and a response with the wrong number of results is rejected
//! rather than truncated or padded.

use crate::grid::{GeoPoint, Grid2, SamplingGrid};
use crate::{DemError, Result};
use serde::Deserialize;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Google Elevation API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/elevation/json";

/// Default number of locations per request.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Largest number of locations the service accepts in one request.
pub const MAX_BATCH_SIZE: usize = 512;

/// Default pause between consecutive batch requests.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(100);

/// Number of response body characters kept in error diagnostics.
const ERROR_BODY_SNIPPET_CHARS: usize = 500;

/// Elevation grid aligned cell-for-cell with the [`SamplingGrid`] it was fetched for.
pub type ElevationGrid = Grid2<f64>;

/// Callback for per-batch progress.
pub type ProgressCallback = Box<dyn Fn(&BatchProgress) + Send + Sync>;

/// Progress report emitted after each successful batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based index of the batch that just completed.
    pub batch: usize,
    /// Total number of batches for this fetch.
    pub total_batches: usize,
    /// Points fetched so far.
    pub points_fetched: usize,
    /// Total points in the grid.
    pub total_points: usize,
}

/// One batch request handed to an [`ElevationTransport`].
#[derive(Debug, Clone, Copy)]
pub struct BatchRequest<'a> {
    /// Points in this batch, in row-major grid order.
    pub points: &'a [GeoPoint],
    /// API credential.
    pub api_key: &'a str,
}

impl BatchRequest<'_> {
    /// The `locations` query value: `lat,lon` pairs joined by `|`.
    pub fn locations(&self) -> String {
        self.points
            .iter()
            .map(GeoPoint::to_string)
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Raw transport-level response: HTTP status and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl RawResponse {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one batch request to the elevation service.
///
/// Implementations only move bytes; status and payload validation is done by
/// [`ElevationFetcher`] so every transport is held to the same rules.
pub trait ElevationTransport {
    /// Send a batch and return the raw response.
    ///
    /// Failures that never produced a response should be reported as
    /// [`DemError::ServiceUnavailable`] with `status: None`.
    fn send(&self, request: &BatchRequest<'_>) -> Result<RawResponse>;
}

/// Blocking HTTP transport built on `reqwest`.
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport for the Google Elevation API.
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Create a transport for a compatible service at `endpoint`.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// The service endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ElevationTransport for HttpTransport {
    fn send(&self, request: &BatchRequest<'_>) -> Result<RawResponse> {
        let locations = request.locations();
        debug!(
            endpoint = %self.endpoint,
            points = request.points.len(),
            "Sending elevation request"
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("locations", locations.as_str()), ("key", request.api_key)])
            .send()
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let body = response.text().map_err(transport_error)?;
        Ok(RawResponse { status, body })
    }
}

/// Map a `reqwest` failure to [`DemError::ServiceUnavailable`].
///
/// The URL is stripped from the message because it carries the API key.
/// Underlying causes (connect, DNS, timeout) are appended to the body.
fn transport_error(err: reqwest::Error) -> DemError {
    let status = err.status().map(|s| s.as_u16());
    let err = err.without_url();

    let mut body = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        body.push_str(": ");
        body.push_str(&cause.to_string());
        source = cause.source();
    }

    DemError::ServiceUnavailable { status, body }
}

/// Pauses between consecutive batch requests.
pub trait Pacer {
    /// Wait for `delay` before the next request.
    fn pause(&self, delay: Duration);
}

/// [`Pacer`] that sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepPacer;

impl Pacer for SleepPacer {
    fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

/// Status vocabulary of the Google Elevation API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceStatus {
    /// Request succeeded.
    Ok,
    /// Malformed request (bad locations, missing parameters).
    InvalidRequest,
    /// Billing or daily quota problem.
    OverDailyLimit,
    /// Too many requests in the allowed time period.
    OverQueryLimit,
    /// The key was rejected.
    RequestDenied,
    /// Server-side error; the request may succeed if retried.
    UnknownError,
    /// Any status outside the documented vocabulary.
    Other(String),
}

impl ServiceStatus {
    /// Parse a status string from a response.
    pub fn parse(status: &str) -> Self {
        match status {
            "OK" => ServiceStatus::Ok,
            "INVALID_REQUEST" => ServiceStatus::InvalidRequest,
            "OVER_DAILY_LIMIT" => ServiceStatus::OverDailyLimit,
            "OVER_QUERY_LIMIT" => ServiceStatus::OverQueryLimit,
            "REQUEST_DENIED" => ServiceStatus::RequestDenied,
            "UNKNOWN_ERROR" => ServiceStatus::UnknownError,
            other => ServiceStatus::Other(other.to_string()),
        }
    }

    /// The wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            ServiceStatus::Ok => "OK",
            ServiceStatus::InvalidRequest => "INVALID_REQUEST",
            ServiceStatus::OverDailyLimit => "OVER_DAILY_LIMIT",
            ServiceStatus::OverQueryLimit => "OVER_QUERY_LIMIT",
            ServiceStatus::RequestDenied => "REQUEST_DENIED",
            ServiceStatus::UnknownError => "UNKNOWN_ERROR",
            ServiceStatus::Other(s) => s,
        }
    }

    /// Whether re-running the whole fetch later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceStatus::OverQueryLimit | ServiceStatus::UnknownError)
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    status: String,
    #[serde(default)]
    results: Vec<ElevationResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ElevationResult {
    #[serde(default)]
    elevation: Option<f64>,
}

/// Validate one batch response and extract its elevations in request order.
fn parse_batch_response(response: &RawResponse, expected: usize) -> Result<Vec<f64>> {
    if !response.is_success() {
        return Err(DemError::ServiceUnavailable {
            status: Some(response.status),
            body: response
                .body
                .chars()
                .take(ERROR_BODY_SNIPPET_CHARS)
                .collect(),
        });
    }

    let parsed: ElevationResponse = serde_json::from_str(&response.body)
        .map_err(|e| DemError::malformed(format!("could not decode response: {}", e)))?;

    let status = ServiceStatus::parse(&parsed.status);
    if status != ServiceStatus::Ok {
        return Err(DemError::ServiceError {
            status: status.as_str().to_string(),
            message: parsed
                .error_message
                .unwrap_or_else(|| "No error message provided".to_string()),
        });
    }

    if parsed.results.len() != expected {
        return Err(DemError::malformed(format!(
            "requested {} elevations but the service returned {}",
            expected,
            parsed.results.len()
        )));
    }

    parsed
        .results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            result
                .elevation
                .ok_or_else(|| DemError::malformed(format!("result {} has no elevation", i)))
        })
        .collect()
}

/// Split `total` items into consecutive ranges of at most `batch_size`.
///
/// # Panics
/// Panics if `batch_size` is zero.
pub fn plan_batches(total: usize, batch_size: usize) -> Vec<Range<usize>> {
    assert!(batch_size > 0, "batch size must be non-zero");
    (0..total)
        .step_by(batch_size)
        .map(|start| start..(start + batch_size).min(total))
        .collect()
}

/// Settings for an [`ElevationFetcher`].
#[derive(Clone)]
pub struct FetchConfig {
    /// API credential sent with every request.
    pub api_key: String,
    /// Maximum locations per request (1 to [`MAX_BATCH_SIZE`]).
    pub batch_size: usize,
    /// Pause between consecutive requests.
    pub batch_delay: Duration,
}

impl std::fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchConfig")
            .field("api_key", &"<redacted>")
            .field("batch_size", &self.batch_size)
            .field("batch_delay", &self.batch_delay)
            .finish()
    }
}

impl FetchConfig {
    /// Default batching with the given credential.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the pause between batches.
    pub fn with_batch_delay(mut self, batch_delay: Duration) -> Self {
        self.batch_delay = batch_delay;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(DemError::InvalidArgument(format!(
                "batch size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.batch_size
            )));
        }
        Ok(())
    }
}

/// Fetch statistics accumulated by an [`ElevationFetcher`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Number of batch requests that succeeded.
    pub batches_sent: usize,
    /// Number of elevations received.
    pub points_fetched: usize,
}

/// Fetches elevations for a whole [`SamplingGrid`].
///
/// # Example
///
/// ```no_run
/// use summit_dem::{ElevationFetcher, FetchConfig, SamplingGrid};
///
/// let grid = SamplingGrid::generate(27.9881, 86.9250, 50, 0.15)?;
/// let fetcher = ElevationFetcher::google(FetchConfig::new("my-api-key"))?;
/// let elevation = fetcher.fetch(&grid)?;
/// println!("Highest sample: {} m", elevation.max());
/// # Ok::<(), summit_dem::DemError>(())
/// ```
pub struct ElevationFetcher<T = HttpTransport, P = SleepPacer> {
    transport: T,
    pacer: P,
    config: FetchConfig,
    batches_sent: AtomicUsize,
    points_fetched: AtomicUsize,
}

impl<T: std::fmt::Debug, P> std::fmt::Debug for ElevationFetcher<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevationFetcher")
            .field("transport", &self.transport)
            .field("config", &self.config)
            .finish()
    }
}

impl ElevationFetcher<HttpTransport, SleepPacer> {
    /// Fetcher for the public Google Elevation API.
    pub fn google(config: FetchConfig) -> Result<Self> {
        Self::new(HttpTransport::new()?, config)
    }
}

impl<T: ElevationTransport> ElevationFetcher<T, SleepPacer> {
    /// Create a fetcher that sleeps between batches.
    pub fn new(transport: T, config: FetchConfig) -> Result<Self> {
        Self::with_pacer(transport, SleepPacer, config)
    }
}

impl<T: ElevationTransport, P: Pacer> ElevationFetcher<T, P> {
    /// Create a fetcher with a custom [`Pacer`].
    pub fn with_pacer(transport: T, pacer: P, config: FetchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            pacer,
            config,
            batches_sent: AtomicUsize::new(0),
            points_fetched: AtomicUsize::new(0),
        })
    }

    /// The fetch settings.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Statistics accumulated since creation or the last reset.
    pub fn stats(&self) -> FetchStats {
        FetchStats {
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            points_fetched: self.points_fetched.load(Ordering::Relaxed),
        }
    }

    /// Reset fetch statistics.
    pub fn reset_stats(&self) {
        self.batches_sent.store(0, Ordering::Relaxed);
        self.points_fetched.store(0, Ordering::Relaxed);
    }

    /// Fetch the elevation of every point in `grid`.
    pub fn fetch(&self, grid: &SamplingGrid) -> Result<ElevationGrid> {
        self.fetch_with_callback(grid, None, None)
    }

    /// Fetch with an optional progress callback and cancel flag.
    ///
    /// The cancel flag is checked before each batch is sent; a request already
    /// in flight always runs to completion.
    pub fn fetch_with_callback(
        &self,
        grid: &SamplingGrid,
        callback: Option<&ProgressCallback>,
        cancel: Option<&AtomicBool>,
    ) -> Result<ElevationGrid> {
        let points = grid.points();
        let total_points = points.len();
        let batches = plan_batches(total_points, self.config.batch_size);
        let total_batches = batches.len();

        info!(
            points = total_points,
            batches = total_batches,
            "Fetching elevation data"
        );

        let mut elevations = Vec::with_capacity(total_points);
        for (n, range) in batches.into_iter().enumerate() {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                warn!(completed = n, total = total_batches, "Elevation fetch cancelled");
                return Err(DemError::Cancelled {
                    completed_batches: n,
                    total_batches,
                });
            }

            let batch = &points[range];
            let request = BatchRequest {
                points: batch,
                api_key: &self.config.api_key,
            };

            let values = self
                .transport
                .send(&request)
                .and_then(|response| parse_batch_response(&response, batch.len()))
                .inspect_err(|e| warn!(batch = n + 1, error = %e, "Elevation batch failed"))?;
            elevations.extend(values);

            self.batches_sent.fetch_add(1, Ordering::Relaxed);
            self.points_fetched.fetch_add(batch.len(), Ordering::Relaxed);

            info!("Fetched batch {}/{}", n + 1, total_batches);
            if let Some(cb) = callback {
                cb(&BatchProgress {
                    batch: n + 1,
                    total_batches,
                    points_fetched: elevations.len(),
                    total_points,
                });
            }

            if n + 1 < total_batches {
                self.pacer.pause(self.config.batch_delay);
            }
        }

        let (rows, cols) = grid.shape();
        Grid2::from_vec(rows, cols, elevations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_body(elevations: &[f64]) -> String {
        let results: Vec<String> = elevations
            .iter()
            .map(|e| format!(r#"{{"elevation": {}, "resolution": 152.7}}"#, e))
            .collect();
        format!(r#"{{"status": "OK", "results": [{}]}}"#, results.join(","))
    }

    #[test]
    fn test_plan_batches() {
        assert_eq!(plan_batches(250, 100), vec![0..100, 100..200, 200..250]);
        assert_eq!(plan_batches(200, 100), vec![0..100, 100..200]);
        assert_eq!(plan_batches(9, 100), vec![0..9]);
        assert!(plan_batches(0, 100).is_empty());
        assert_eq!(plan_batches(3, 1), vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_batch_request_locations() {
        let points = [GeoPoint::new(27.9881, 86.925), GeoPoint::new(-33.5, 151.0)];
        let request = BatchRequest {
            points: &points,
            api_key: "key",
        };
        assert_eq!(request.locations(), "27.9881,86.925|-33.5,151");
    }

    #[test]
    fn test_parse_ok_response() {
        let response = RawResponse::new(200, ok_body(&[1.5, 2.0, -3.25]));
        assert_eq!(
            parse_batch_response(&response, 3).unwrap(),
            vec![1.5, 2.0, -3.25]
        );
    }

    #[test]
    fn test_parse_http_error_truncates_body() {
        let body = "x".repeat(2000);
        let response = RawResponse::new(503, body);
        match parse_batch_response(&response, 1) {
            Err(DemError::ServiceUnavailable { status, body }) => {
                assert_eq!(status, Some(503));
                assert_eq!(body.len(), ERROR_BODY_SNIPPET_CHARS);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_parse_service_status_error() {
        let response = RawResponse::new(
            200,
            r#"{"status": "REQUEST_DENIED", "results": [], "error_message": "The provided API key is invalid."}"#,
        );
        match parse_batch_response(&response, 2) {
            Err(DemError::ServiceError { status, message }) => {
                assert_eq!(status, "REQUEST_DENIED");
                assert_eq!(message, "The provided API key is invalid.");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_parse_service_status_without_message() {
        let response = RawResponse::new(200, r#"{"status": "OVER_QUERY_LIMIT"}"#);
        match parse_batch_response(&response, 2) {
            Err(DemError::ServiceError { status, message }) => {
                assert_eq!(status, "OVER_QUERY_LIMIT");
                assert_eq!(message, "No error message provided");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_parse_count_mismatch() {
        let response = RawResponse::new(200, ok_body(&[1.0, 2.0]));
        assert!(matches!(
            parse_batch_response(&response, 3),
            Err(DemError::ServiceError { .. })
        ));
        assert!(matches!(
            parse_batch_response(&response, 1),
            Err(DemError::ServiceError { .. })
        ));
    }

    #[test]
    fn test_parse_missing_elevation() {
        let response = RawResponse::new(
            200,
            r#"{"status": "OK", "results": [{"elevation": 1.0}, {"location": {"lat": 0, "lng": 0}}]}"#,
        );
        match parse_batch_response(&response, 2) {
            Err(DemError::ServiceError { status, message }) => {
                assert_eq!(status, "INVALID_RESPONSE");
                assert!(message.contains("result 1"));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_parse_invalid_json() {
        let response = RawResponse::new(200, "<html>oops</html>");
        assert!(matches!(
            parse_batch_response(&response, 1),
            Err(DemError::ServiceError { .. })
        ));
    }

    #[test]
    fn test_service_status_vocabulary() {
        for status in [
            "OK",
            "INVALID_REQUEST",
            "OVER_DAILY_LIMIT",
            "OVER_QUERY_LIMIT",
            "REQUEST_DENIED",
            "UNKNOWN_ERROR",
            "DATA_NOT_AVAILABLE",
        ] {
            assert_eq!(ServiceStatus::parse(status).as_str(), status);
        }
        assert_eq!(
            ServiceStatus::parse("DATA_NOT_AVAILABLE"),
            ServiceStatus::Other("DATA_NOT_AVAILABLE".to_string())
        );
        assert!(ServiceStatus::OverQueryLimit.is_transient());
        assert!(!ServiceStatus::RequestDenied.is_transient());
    }

    #[test]
    fn test_fetch_config_validation() {
        assert!(FetchConfig::new("k").validate().is_ok());
        assert!(FetchConfig::new("k").with_batch_size(0).validate().is_err());
        assert!(FetchConfig::new("k").with_batch_size(513).validate().is_err());
        assert!(FetchConfig::new("k").with_batch_size(512).validate().is_ok());
    }

    #[test]
    fn test_fetch_config_debug_hides_key() {
        let debug = format!("{:?}", FetchConfig::new("super-secret"));
        assert!(!debug.contains("super-secret"));
    }
}
