//! Row-major grids and the lat/lon sampling lattice.
//!
//! Every grid in this crate is a [`Grid2`]: a fixed-shape, row-major 2D array.
//! The row-major order is what ties a latitude/longitude pair to the elevation
//! fetched for it, so grids are never reshaped after construction.

use crate::{DemError, Result};
use std::fmt;
use std::ops::Index;

/// Upper bound on the number of points a sampling lattice may hold.
pub const MAX_GRID_POINTS: usize = 1_000_000;

/// A fixed-shape 2D array stored in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid2<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T> Grid2<T> {
    /// Create a grid from row-major data.
    ///
    /// Fails if either dimension is zero or `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(DemError::InvalidArgument(format!(
                "grid dimensions must be non-zero, got {}x{}",
                rows, cols
            )));
        }
        let len = rows.checked_mul(cols).ok_or_else(|| {
            DemError::InvalidArgument(format!("grid of {}x{} cells is too large", rows, cols))
        })?;
        if data.len() != len {
            return Err(DemError::InvalidArgument(format!(
                "expected {} values for a {}x{} grid, got {}",
                len,
                rows,
                cols,
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Create a grid by evaluating `f(row, col)` for every cell in row-major order.
    ///
    /// # Panics
    /// Panics if either dimension is zero or the cell count overflows `usize`.
    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        assert!(rows > 0 && cols > 0, "grid dimensions must be non-zero");
        let len = rows.checked_mul(cols);
        assert!(len.is_some(), "grid of {}x{} cells is too large", rows, cols);
        let mut data = Vec::with_capacity(len.unwrap_or_default());
        for row in 0..rows {
            for col in 0..cols {
                data.push(f(row, col));
            }
        }
        Self { rows, cols, data }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Shape as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false: grids have at least one cell.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the cell at `(row, col)`, or `None` if out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// One row as a slice.
    ///
    /// # Panics
    /// Panics if `row` is out of range.
    pub fn row(&self, row: usize) -> &[T] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Cells in row-major order as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Apply `f` to every cell, keeping the shape.
    pub fn map<U, F>(&self, f: F) -> Grid2<U>
    where
        F: FnMut(&T) -> U,
    {
        Grid2 {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Consume the grid and return its row-major data.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Convert a row-major flat index into `(row, col)`.
    pub fn unravel(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }
}

impl<T> Index<(usize, usize)> for Grid2<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(
            row < self.rows && col < self.cols,
            "index ({}, {}) out of range for {}x{} grid",
            row,
            col,
            self.rows,
            self.cols
        );
        &self.data[row * self.cols + col]
    }
}

impl Grid2<f64> {
    /// Smallest value (NaN cells are ignored).
    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Largest value (NaN cells are ignored).
    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Arithmetic mean of all cells.
    pub fn mean(&self) -> f64 {
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }

    /// Position of the largest value.
    ///
    /// Ties resolve to the first occurrence in row-major order.
    pub fn argmax(&self) -> (usize, usize) {
        let mut best = 0;
        for (i, value) in self.data.iter().enumerate() {
            if *value > self.data[best] || (self.data[best].is_nan() && !value.is_nan()) {
                best = i;
            }
        }
        self.unravel(best)
    }
}

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for GeoPoint {
    /// Formats as `lat,lon` using the shortest representation that round-trips.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

/// Geographic bounds of a sampling grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridBounds {
    /// Minimum latitude (south edge).
    pub min_lat: f64,
    /// Maximum latitude (north edge).
    pub max_lat: f64,
    /// Minimum longitude (west edge).
    pub min_lon: f64,
    /// Maximum longitude (east edge).
    pub max_lon: f64,
}

impl GridBounds {
    /// Check if a coordinate is within the bounds.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    /// Midpoint of the bounds.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

/// Latitude/longitude lattice to sample elevations on.
///
/// `latitudes` varies along rows and `longitudes` along columns; both grids
/// share the same shape and are indexed identically.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingGrid {
    latitudes: Grid2<f64>,
    longitudes: Grid2<f64>,
}

impl SamplingGrid {
    /// Build a `grid_size` x `grid_size` lattice covering a square of
    /// `area_size_deg` degrees centered on `(center_lat, center_lon)`.
    ///
    /// Both edges of the square are sampled. Fails with
    /// [`DemError::InvalidArgument`] when `grid_size < 2` or
    /// `area_size_deg <= 0`.
    ///
    /// # Example
    ///
    /// ```
    /// use summit_dem::SamplingGrid;
    ///
    /// let grid = SamplingGrid::generate(27.9881, 86.9250, 3, 0.02)?;
    /// assert_eq!(grid.shape(), (3, 3));
    /// # Ok::<(), summit_dem::DemError>(())
    /// ```
    pub fn generate(
        center_lat: f64,
        center_lon: f64,
        grid_size: usize,
        area_size_deg: f64,
    ) -> Result<Self> {
        Self::generate_rect(
            GeoPoint::new(center_lat, center_lon),
            grid_size,
            grid_size,
            area_size_deg,
            area_size_deg,
        )
    }

    /// Build a `rows` x `cols` lattice spanning `lat_span_deg` by
    /// `lon_span_deg` degrees around `center`.
    pub fn generate_rect(
        center: GeoPoint,
        rows: usize,
        cols: usize,
        lat_span_deg: f64,
        lon_span_deg: f64,
    ) -> Result<Self> {
        if !center.lat.is_finite() || !center.lon.is_finite() {
            return Err(DemError::InvalidArgument(format!(
                "center must be finite, got ({}, {})",
                center.lat, center.lon
            )));
        }
        if rows < 2 || cols < 2 {
            return Err(DemError::InvalidArgument(format!(
                "grid needs at least 2 points per side, got {}x{}",
                rows, cols
            )));
        }
        match rows.checked_mul(cols) {
            Some(points) if points <= MAX_GRID_POINTS => {}
            _ => {
                return Err(DemError::InvalidArgument(format!(
                    "a {}x{} grid exceeds the limit of {} sample points",
                    rows, cols, MAX_GRID_POINTS
                )))
            }
        }
        for span in [lat_span_deg, lon_span_deg] {
            if !(span > 0.0 && span.is_finite()) {
                return Err(DemError::InvalidArgument(format!(
                    "area size must be a positive number of degrees, got {}",
                    span
                )));
            }
        }

        let lat_vals = linspace(
            center.lat - lat_span_deg / 2.0,
            center.lat + lat_span_deg / 2.0,
            rows,
        );
        let lon_vals = linspace(
            center.lon - lon_span_deg / 2.0,
            center.lon + lon_span_deg / 2.0,
            cols,
        );

        Ok(Self {
            latitudes: Grid2::from_fn(rows, cols, |row, _| lat_vals[row]),
            longitudes: Grid2::from_fn(rows, cols, |_, col| lon_vals[col]),
        })
    }

    /// Wrap existing latitude and longitude grids.
    ///
    /// Fails if the two grids differ in shape.
    pub fn from_parts(latitudes: Grid2<f64>, longitudes: Grid2<f64>) -> Result<Self> {
        if latitudes.shape() != longitudes.shape() {
            return Err(DemError::InvalidArgument(format!(
                "latitude grid is {:?} but longitude grid is {:?}",
                latitudes.shape(),
                longitudes.shape()
            )));
        }
        Ok(Self {
            latitudes,
            longitudes,
        })
    }

    /// Shape as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.latitudes.shape()
    }

    /// Total number of sample points.
    pub fn len(&self) -> usize {
        self.latitudes.len()
    }

    /// Always false: a sampling grid has at least one point.
    pub fn is_empty(&self) -> bool {
        self.latitudes.is_empty()
    }

    /// Latitude of every sample, in degrees.
    pub fn latitudes(&self) -> &Grid2<f64> {
        &self.latitudes
    }

    /// Longitude of every sample, in degrees.
    pub fn longitudes(&self) -> &Grid2<f64> {
        &self.longitudes
    }

    /// The sample at `(row, col)`.
    pub fn point(&self, row: usize, col: usize) -> Option<GeoPoint> {
        let lat = self.latitudes.get(row, col)?;
        let lon = self.longitudes.get(row, col)?;
        Some(GeoPoint::new(*lat, *lon))
    }

    /// All samples flattened in row-major order.
    ///
    /// Elevations are reassembled in exactly this order.
    pub fn points(&self) -> Vec<GeoPoint> {
        self.latitudes
            .iter()
            .zip(self.longitudes.iter())
            .map(|(&lat, &lon)| GeoPoint::new(lat, lon))
            .collect()
    }

    /// Geographic extent of the lattice.
    pub fn bounds(&self) -> GridBounds {
        GridBounds {
            min_lat: self.latitudes.min(),
            max_lat: self.latitudes.max(),
            min_lon: self.longitudes.min(),
            max_lon: self.longitudes.max(),
        }
    }
}

/// `n` evenly spaced values from `start` to `end`, both inclusive.
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    let step = (end - start) / (n - 1) as f64;
    let mut values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
    // Pin the last sample so rounding never moves it off the edge.
    values[n - 1] = end;
    values
}
