//! Keypoint detection: convex→concave slope inflections.
//!
//! A keypoint is where profile curvature transitions from convex (ridge-like)
//! immediately upslope to non-convex at or below the cell — the classical
//! keyline-design placement for water-harvesting earthworks. Candidates are
//! scored, ranked by confidence, and thinned to a spatially diverse set.

use serde::{Deserialize, Serialize};

use crate::differential::DifferentialField;
use crate::flow::FlowAccumulation;
use crate::grid::{planar_distance_m, ElevationGrid};

/// Keypoints occur on moderate slopes: below this the terrain is a valley
/// floor or plain, above it a cliff face. Percent slope.
pub const MIN_KEYPOINT_SLOPE_PCT: f64 = 5.0;
pub const MAX_KEYPOINT_SLOPE_PCT: f64 = 35.0;

/// Retained set is capped and spaced: at most this many keypoints, each at
/// least `KEYPOINT_SPACING_CELLS × resolution` metres from the others.
pub const MAX_KEYPOINTS: usize = 10;
pub const KEYPOINT_SPACING_CELLS: f64 = 5.0;

// Confidence and pond-suitability weights. Policy constants with no
// first-principles derivation; exact values are part of the output contract.
const CURVATURE_CONTRAST_WEIGHT: f64 = 10.0;
const SLOPE_CONTRAST_WEIGHT: f64 = 0.05;
const SUITABILITY_FLOW_WEIGHT: f64 = 0.5;
const SUITABILITY_CONCAVE_BONUS: f64 = 0.3;
const SUITABILITY_FLATTENING_BONUS: f64 = 0.2;

/// A detected slope-inflection point. Immutable once created; keylines refer
/// to it by `id`, not by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keypoint {
    pub id: u32,
    pub lat: f64,
    pub lng: f64,
    pub elevation: f64,
    pub slope_above: f64,
    pub slope_below: f64,
    pub aspect: f64,
    pub curvature: f64,
    /// Detection confidence in [0, 1].
    pub confidence: f64,
    /// Heuristic suitability of the spot for a pond, in [0, 1].
    pub pond_suitability: f64,
}

/// Scan the curvature field for keypoints and thin the result.
///
/// The scan excludes a 2-cell border: the inflection test reads the
/// differential of the row above and below, which must themselves be
/// interior cells.
pub fn detect_keypoints(
    grid: &ElevationGrid,
    field: &DifferentialField,
    flow: &FlowAccumulation,
) -> Vec<Keypoint> {
    let rows = grid.rows();
    let cols = grid.cols();
    if rows < 5 || cols < 5 {
        return Vec::new();
    }

    let max_flow = flow.max();
    let mut candidates: Vec<Keypoint> = Vec::new();

    for r in 2..rows - 2 {
        for c in 2..cols - 2 {
            let here = field.get(r, c);
            if here.slope < MIN_KEYPOINT_SLOPE_PCT || here.slope > MAX_KEYPOINT_SLOPE_PCT {
                continue;
            }

            let above = field.get(r - 1, c);
            let below = field.get(r + 1, c);

            let inflection = (above.curvature > 0.0 && here.curvature <= 0.0)
                || (above.curvature > 0.0 && below.curvature < 0.0);
            if !inflection {
                continue;
            }

            let confidence = (((above.curvature - below.curvature).abs()
                * CURVATURE_CONTRAST_WEIGHT
                + (above.slope - below.slope).abs() * SLOPE_CONTRAST_WEIGHT)
                / 2.0)
                .min(1.0);

            let normalized_flow = flow.get(r, c) / max_flow;
            let mut pond_suitability = normalized_flow * SUITABILITY_FLOW_WEIGHT;
            if here.curvature < 0.0 {
                pond_suitability += SUITABILITY_CONCAVE_BONUS;
            }
            if below.slope < above.slope {
                pond_suitability += SUITABILITY_FLATTENING_BONUS;
            }
            pond_suitability = pond_suitability.min(1.0);

            let (lat, lng) = grid.cell_lat_lng(r, c);
            candidates.push(Keypoint {
                id: 0,
                lat,
                lng,
                elevation: grid.get(r, c),
                slope_above: above.slope,
                slope_below: below.slope,
                aspect: here.aspect,
                curvature: here.curvature,
                confidence,
                pond_suitability,
            });
        }
    }

    // Rank by confidence, then keep greedily subject to minimum spacing.
    // A candidate is dropped purely for crowding a higher-ranked keypoint,
    // regardless of its own score. Stable sort keeps scan order on ties.
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let min_spacing = KEYPOINT_SPACING_CELLS * grid.resolution();
    let mut kept: Vec<Keypoint> = Vec::new();
    for candidate in candidates {
        if kept.len() >= MAX_KEYPOINTS {
            break;
        }
        let crowded = kept
            .iter()
            .any(|k| planar_distance_m(k.lat, k.lng, candidate.lat, candidate.lng) < min_spacing);
        if !crowded {
            kept.push(candidate);
        }
    }

    for (i, kp) in kept.iter_mut().enumerate() {
        kp.id = i as u32 + 1;
    }
    kept
}
