//! Pipeline orchestrator: runs the five analysis stages in order and
//! packages the result.
//!
//! The analysis is a pure, synchronous, single-threaded computation: one
//! grid in, one deterministic result out, no I/O and no shared state. A
//! grid smaller than 3×3 in either dimension produces the defined empty
//! result rather than an error.

use serde::{Deserialize, Serialize};

use crate::differential::{compute_differentials, DifferentialField};
use crate::features::{assemble_features, FeatureCollection};
use crate::flow::compute_flow_accumulation;
use crate::grid::{Bounds, ElevationGrid, GridError};
use crate::keyline::{trace_keylines, Keyline};
use crate::keypoint::{detect_keypoints, Keypoint};
use crate::params::RainfallContext;
use crate::pond::{select_pond_sites, PondSite};

/// Cells flatter than this (percent slope) are ignored when picking the
/// dominant aspect; a flat cell's bearing is noise.
const MIN_ASPECT_SLOPE_PCT: f64 = 0.1;

const ASPECT_SECTORS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Aggregate statistics over one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStats {
    pub keypoints_found: usize,
    pub keylines_generated: usize,
    pub pond_sites_identified: usize,
    /// Mean interior-cell slope, percent.
    pub average_slope: f64,
    /// Modal 8-sector compass direction of interior aspects; "N" for a
    /// grid with no sloped cells.
    pub dominant_aspect: String,
}

/// The sole externally visible artifact of the engine. Produced once per
/// invocation, never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub keypoints: Vec<Keypoint>,
    pub keylines: Vec<Keyline>,
    pub pond_sites: Vec<PondSite>,
    pub feature_collection: FeatureCollection,
    pub stats: AnalysisStats,
}

impl AnalysisResult {
    /// The defined result for degenerate input: all counts zero, empty
    /// feature collection.
    pub fn empty() -> Self {
        Self {
            keypoints: Vec::new(),
            keylines: Vec::new(),
            pond_sites: Vec::new(),
            feature_collection: FeatureCollection::empty(),
            stats: AnalysisStats {
                keypoints_found: 0,
                keylines_generated: 0,
                pond_sites_identified: 0,
                average_slope: 0.0,
                dominant_aspect: "N".to_string(),
            },
        }
    }
}

/// External input document, matching the JSON contract of the caller
/// (camelCase fields, optional rainfall context).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisInput {
    pub bounds: Bounds,
    pub elevation_grid: Vec<Vec<f64>>,
    pub resolution: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rainfall_context: Option<RainfallContext>,
}

impl AnalysisInput {
    /// Validate the document into a grid and run the analysis.
    pub fn analyze(&self) -> Result<AnalysisResult, GridError> {
        let grid =
            ElevationGrid::from_rows(self.elevation_grid.clone(), self.resolution, self.bounds)?;
        Ok(analyze(&grid, self.rainfall_context.as_ref()))
    }
}

/// Run the full keyline analysis over one elevation grid.
pub fn analyze(grid: &ElevationGrid, rainfall: Option<&RainfallContext>) -> AnalysisResult {
    if grid.rows() < 3 || grid.cols() < 3 {
        return AnalysisResult::empty();
    }

    let default_context = RainfallContext::default();
    let context = rainfall.unwrap_or(&default_context);

    // Stage 1 — differential field (slope, aspect, profile curvature).
    let field = compute_differentials(grid);

    // Stage 2 — D8 flow accumulation.
    let flow = compute_flow_accumulation(grid);

    // Stage 3 — keypoint detection over the curvature field.
    let keypoints = detect_keypoints(grid, &field, &flow);

    // Stage 4 — contour-following keylines through retained keypoints.
    let keylines = trace_keylines(grid, &keypoints, context.keyline_spacing());

    // Stage 5 — pond site selection over convergence zones.
    let pond_sites =
        select_pond_sites(grid, &field, &flow, &keypoints, context.pond_size_multiplier());

    let feature_collection = assemble_features(&keypoints, &keylines, &pond_sites);
    let stats = AnalysisStats {
        keypoints_found: keypoints.len(),
        keylines_generated: keylines.len(),
        pond_sites_identified: pond_sites.len(),
        average_slope: average_slope(&field),
        dominant_aspect: dominant_aspect(&field).to_string(),
    };

    AnalysisResult { keypoints, keylines, pond_sites, feature_collection, stats }
}

/// Mean slope over interior cells. Border cells are defined-zero padding,
/// not terrain, so they are left out of the average.
fn average_slope(field: &DifferentialField) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for cell in field.interior() {
        sum += cell.slope;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Modal 45° compass sector over interior cells with meaningful slope.
fn dominant_aspect(field: &DifferentialField) -> &'static str {
    let mut counts = [0usize; 8];
    for cell in field.interior() {
        if cell.slope < MIN_ASPECT_SLOPE_PCT {
            continue;
        }
        let sector = (cell.aspect / 45.0).round() as usize % 8;
        counts[sector] += 1;
    }
    let (best, &count) = counts
        .iter()
        .enumerate()
        .max_by_key(|&(_, &n)| n)
        .unwrap_or((0, &0));
    if count == 0 {
        "N"
    } else {
        ASPECT_SECTORS[best]
    }
}
