//! Local planar projection of a sampled terrain grid.
//!
//! The projection is a flat tangent-plane approximation around the grid's own
//! centroid: one degree of latitude is taken as 111 km everywhere and degrees of
//! longitude shrink with the cosine of the centroid latitude. It is meant for
//! areas spanning a few tens of kilometers; larger areas accumulate curvature
//! error and nothing here guards against that.

use crate::elevation_api::ElevationGrid;
use crate::grid::{Grid2, SamplingGrid};
use crate::{DemError, Result};

/// Meters per degree of latitude used by the projection.
pub const METERS_PER_DEGREE_LAT: f64 = 111_000.0;

/// A terrain grid in local Cartesian meters.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedGrid {
    /// East-west offset from the centroid, in meters (east positive).
    pub x: Grid2<f64>,
    /// North-south offset from the centroid, in meters (north positive).
    pub y: Grid2<f64>,
    /// Elevation in meters, unchanged from the fetched grid.
    pub z: Grid2<f64>,
}

/// The highest cell of a [`ProjectedGrid`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakCell {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
    /// East-west offset in meters.
    pub x: f64,
    /// North-south offset in meters.
    pub y: f64,
    /// Elevation in meters.
    pub z: f64,
}

impl ProjectedGrid {
    /// Shape as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.z.shape()
    }

    /// The cell with the largest elevation.
    ///
    /// When several cells share the maximum, the first in row-major order wins.
    pub fn peak(&self) -> PeakCell {
        let (row, col) = self.z.argmax();
        PeakCell {
            row,
            col,
            x: self.x[(row, col)],
            y: self.y[(row, col)],
            z: self.z[(row, col)],
        }
    }

    /// Lowest and highest elevation as `(min, max)`.
    pub fn elevation_range(&self) -> (f64, f64) {
        (self.z.min(), self.z.max())
    }
}

/// Project a sampled grid and its elevations into local meters.
///
/// The origin is the mean latitude and longitude of the whole grid, not the
/// center that was originally requested. Fails with
/// [`DemError::InvalidArgument`] if `elevation` does not match the grid shape.
pub fn project(grid: &SamplingGrid, elevation: &ElevationGrid) -> Result<ProjectedGrid> {
    if grid.shape() != elevation.shape() {
        return Err(DemError::InvalidArgument(format!(
            "sampling grid is {:?} but elevation grid is {:?}",
            grid.shape(),
            elevation.shape()
        )));
    }

    let center_lat = grid.latitudes().mean();
    let center_lon = grid.longitudes().mean();
    let meters_per_degree_lon = METERS_PER_DEGREE_LAT * center_lat.to_radians().cos();

    Ok(ProjectedGrid {
        x: grid
            .longitudes()
            .map(|lon| (lon - center_lon) * meters_per_degree_lon),
        y: grid
            .latitudes()
            .map(|lat| (lat - center_lat) * METERS_PER_DEGREE_LAT),
        z: elevation.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_single_cell_at_origin() {
        let grid = SamplingGrid::from_parts(
            Grid2::from_vec(1, 1, vec![0.0]).unwrap(),
            Grid2::from_vec(1, 1, vec![0.0]).unwrap(),
        )
        .unwrap();
        let elevation = Grid2::from_vec(1, 1, vec![100.0]).unwrap();

        let projected = project(&grid, &elevation).unwrap();
        assert_eq!(projected.x.as_slice(), &[0.0]);
        assert_eq!(projected.y.as_slice(), &[0.0]);
        assert_eq!(projected.z.as_slice(), &[100.0]);
    }

    #[test]
    fn test_equator_spacing() {
        let grid = SamplingGrid::generate(0.0, 0.0, 3, 2.0).unwrap();
        let elevation = Grid2::from_fn(3, 3, |_, _| 0.0);
        let projected = project(&grid, &elevation).unwrap();

        // At the equator a degree of longitude is as long as a degree of latitude.
        assert_relative_eq!(projected.x[(0, 0)], -111_000.0, epsilon = 1e-6);
        assert_relative_eq!(projected.x[(0, 2)], 111_000.0, epsilon = 1e-6);
        assert_relative_eq!(projected.y[(0, 1)], -111_000.0, epsilon = 1e-6);
        assert_relative_eq!(projected.y[(2, 1)], 111_000.0, epsilon = 1e-6);
        assert_relative_eq!(projected.x[(1, 1)], 0.0, epsilon = 1e-6);
        assert_relative_eq!(projected.y[(1, 1)], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_longitude_shrinks_with_latitude() {
        let grid = SamplingGrid::generate(60.0, 10.0, 2, 0.02).unwrap();
        let elevation = Grid2::from_fn(2, 2, |_, _| 0.0);
        let projected = project(&grid, &elevation).unwrap();

        let width = projected.x[(0, 1)] - projected.x[(0, 0)];
        let height = projected.y[(1, 0)] - projected.y[(0, 0)];
        assert_relative_eq!(height, 0.02 * METERS_PER_DEGREE_LAT, epsilon = 1e-6);
        assert_relative_eq!(width, height * 60f64.to_radians().cos(), epsilon = 1e-6);
    }

    #[test]
    fn test_recenters_on_sampled_centroid() {
        // Latitudes skewed toward the north: the origin follows the mean, not the edges.
        let latitudes = Grid2::from_vec(3, 1, vec![0.0, 0.9, 1.2]).unwrap();
        let longitudes = Grid2::from_vec(3, 1, vec![5.0, 5.0, 5.0]).unwrap();
        let grid = SamplingGrid::from_parts(latitudes, longitudes).unwrap();
        let elevation = Grid2::from_vec(3, 1, vec![1.0, 2.0, 3.0]).unwrap();

        let projected = project(&grid, &elevation).unwrap();
        assert_relative_eq!(projected.y[(0, 0)], -0.7 * METERS_PER_DEGREE_LAT, epsilon = 1e-6);
        assert_relative_eq!(projected.y.as_slice().iter().sum::<f64>(), 0.0, epsilon = 1e-6);
        assert!(projected.x.iter().all(|x| x.abs() < 1e-9));
    }

    #[test]
    fn test_translation_keeps_relative_spacing() {
        let a = SamplingGrid::generate(27.9881, 86.9250, 4, 0.05).unwrap();
        let b = SamplingGrid::from_parts(
            a.latitudes().map(|lat| lat + 0.001),
            a.longitudes().map(|lon| lon - 0.002),
        )
        .unwrap();
        let elevation = Grid2::from_fn(4, 4, |r, c| (r * 4 + c) as f64);

        let pa = project(&a, &elevation).unwrap();
        let pb = project(&b, &elevation).unwrap();

        for row in 0..4 {
            for col in 0..4 {
                let dxa = pa.x[(row, col)] - pa.x[(0, 0)];
                let dxb = pb.x[(row, col)] - pb.x[(0, 0)];
                let dya = pa.y[(row, col)] - pa.y[(0, 0)];
                let dyb = pb.y[(row, col)] - pb.y[(0, 0)];
                // The longitude scale changes only through cos(center latitude).
                assert_relative_eq!(dxa, dxb, max_relative = 1e-4);
                assert_relative_eq!(dya, dyb, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let grid = SamplingGrid::generate(0.0, 0.0, 3, 0.1).unwrap();
        let elevation = Grid2::from_fn(3, 2, |_, _| 0.0);
        assert!(matches!(
            project(&grid, &elevation),
            Err(DemError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_peak_and_range() {
        let grid = SamplingGrid::generate(0.0, 0.0, 2, 0.1).unwrap();
        let elevation = Grid2::from_vec(2, 2, vec![10.0, 40.0, 40.0, -5.0]).unwrap();
        let projected = project(&grid, &elevation).unwrap();

        let peak = projected.peak();
        assert_eq!((peak.row, peak.col), (0, 1));
        assert_eq!(peak.z, 40.0);
        assert!(peak.x > 0.0 && peak.y < 0.0);
        assert_eq!(projected.elevation_range(), (-5.0, 40.0));
    }
}
