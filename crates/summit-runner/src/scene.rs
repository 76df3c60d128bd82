//! Wireframe scene description for a projected terrain grid.
//!
//! The scene is plain data: polylines, a marker, a label and axis limits in
//! local meters. It is exported as JSON so any plotting tool can draw it.

use serde::Serialize;
use summit_dem::{Grid2, Peak, ProjectedGrid};

/// Row/column stride of the terrain surface lines.
const SURFACE_STRIDE: usize = 2;
/// Row/column stride of the flat base grid drawn at the lowest elevation.
const BASE_STRIDE: usize = 5;
/// Horizontal padding around the terrain, in meters.
const XY_PADDING_M: f64 = 500.0;
/// Space below the lowest sample, in meters.
const Z_PADDING_BELOW_M: f64 = 200.0;
/// Space above the highest sample, in meters.
const Z_PADDING_ABOVE_M: f64 = 500.0;
/// Label offset from the summit marker (left, up, higher).
const LABEL_OFFSET_M: [f64; 3] = [-800.0, 800.0, 500.0];
/// Second title line naming where the elevations come from.
const DATA_SOURCE_NOTE: &str = "(Real elevation data from Google Elevation API)";

/// A point in local meters `[x, y, z]`.
pub type Point3 = [f64; 3];

/// Colors and line widths of the scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneStyle {
    /// Terrain and base grid color.
    pub wire_color: String,
    /// Peak marker, leader line and label color.
    pub highlight_color: String,
    /// Background color.
    pub background_color: String,
    /// Surface line width.
    pub surface_line_width: f64,
    /// Base grid line width.
    pub base_line_width: f64,
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self {
            wire_color: "#90EE90".to_string(),
            highlight_color: "yellow".to_string(),
            background_color: "black".to_string(),
            surface_line_width: 0.6,
            base_line_width: 0.3,
        }
    }
}

/// Text anchored in the scene with a leader line back to `anchor`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    /// Label text.
    pub text: String,
    /// Position of the text.
    pub position: Point3,
    /// Point the leader line starts from.
    pub anchor: Point3,
}

/// Inclusive axis ranges in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisLimits {
    /// East-west range.
    pub x: [f64; 2],
    /// North-south range.
    pub y: [f64; 2],
    /// Elevation range.
    pub z: [f64; 2],
}

/// Camera angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewAngle {
    /// Elevation above the horizontal plane.
    pub elevation_deg: f64,
    /// Azimuth around the vertical axis.
    pub azimuth_deg: f64,
}

/// Everything needed to draw the terrain wireframe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireframeScene {
    /// Plot title.
    pub title: String,
    /// Terrain lines along rows and columns.
    pub surface: Vec<Vec<Point3>>,
    /// Flat grid at the lowest elevation.
    pub base_grid: Vec<Vec<Point3>>,
    /// Highest sampled point.
    pub peak_marker: Point3,
    /// Legend entry for the marker.
    pub peak_legend: String,
    /// Summit height label.
    pub label: Label,
    /// Axis ranges.
    pub limits: AxisLimits,
    /// Axis titles (x, y, z).
    pub axis_labels: [String; 3],
    /// Camera angles.
    pub view: ViewAngle,
    /// Lowest and highest sampled elevation.
    pub elevation_range: [f64; 2],
    /// Colors and widths.
    pub style: SceneStyle,
}

impl WireframeScene {
    /// Build the scene for `projected`, annotated with `peak`'s surveyed height.
    pub fn build(projected: &ProjectedGrid, peak: &Peak) -> Self {
        let (z_min, z_max) = projected.elevation_range();
        let summit = projected.peak();
        let marker = [summit.x, summit.y, summit.z];
        let label_position = [
            marker[0] + LABEL_OFFSET_M[0],
            marker[1] + LABEL_OFFSET_M[1],
            marker[2] + LABEL_OFFSET_M[2],
        ];
        let base_z = projected.z.map(|_| z_min);

        Self {
            title: format!(
                "3D Wire Silhouette of {} ({:.0} m)\n{}",
                peak.name, peak.reference_height, DATA_SOURCE_NOTE
            ),
            surface: wire_lines(&projected.x, &projected.y, &projected.z, SURFACE_STRIDE),
            base_grid: wire_lines(&projected.x, &projected.y, &base_z, BASE_STRIDE),
            peak_marker: marker,
            peak_legend: format!("Peak: {:.0} m", peak.reference_height),
            label: Label {
                text: format!("{:.0} m", peak.reference_height),
                position: label_position,
                anchor: marker,
            },
            limits: AxisLimits {
                x: [
                    projected.x.min() - XY_PADDING_M,
                    projected.x.max() + XY_PADDING_M,
                ],
                y: [
                    projected.y.min() - XY_PADDING_M,
                    projected.y.max() + XY_PADDING_M,
                ],
                z: [z_min - Z_PADDING_BELOW_M, z_max + Z_PADDING_ABOVE_M],
            },
            axis_labels: [
                "East-West (m)".to_string(),
                "North-South (m)".to_string(),
                "Elevation (m)".to_string(),
            ],
            view: ViewAngle {
                elevation_deg: 30.0,
                azimuth_deg: -50.0,
            },
            elevation_range: [z_min, z_max],
            style: SceneStyle::default(),
        }
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Indices `0, stride, 2*stride, ...` plus the last index if the stride skips it.
fn strided(len: usize, stride: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..len).step_by(stride).collect();
    if let Some(&last) = indices.last() {
        if last != len - 1 {
            indices.push(len - 1);
        }
    }
    indices
}

/// Polylines along every `stride`-th row, then along every `stride`-th column.
fn wire_lines(x: &Grid2<f64>, y: &Grid2<f64>, z: &Grid2<f64>, stride: usize) -> Vec<Vec<Point3>> {
    let (rows, cols) = z.shape();
    let point = |r: usize, c: usize| [x[(r, c)], y[(r, c)], z[(r, c)]];

    let mut lines = Vec::new();
    for r in strided(rows, stride) {
        lines.push((0..cols).map(|c| point(r, c)).collect());
    }
    for c in strided(cols, stride) {
        lines.push((0..rows).map(|r| point(r, c)).collect());
    }
    lines
}
