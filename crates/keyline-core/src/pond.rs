//! Pond site selection over flow-convergence zones.
//!
//! Candidates are cells where a meaningful share of the surface flow
//! converges; scoring then rewards concave terrain, buildable dam grades,
//! and proximity to a retained keypoint. A site must clear both the score
//! threshold and a minimum number of justifications before it is kept.

use serde::{Deserialize, Serialize};

use crate::differential::DifferentialField;
use crate::flow::FlowAccumulation;
use crate::grid::{planar_distance_m, ElevationGrid};
use crate::keypoint::Keypoint;

/// Only cells carrying more than this fraction of the peak flow qualify.
pub const MIN_POND_FLOW_FRACTION: f64 = 0.3;
/// Conjunctive retain gate: a candidate needs score above this AND at least
/// `MIN_POND_REASONS` justification strings.
pub const MIN_POND_SCORE: f64 = 0.5;
pub const MIN_POND_REASONS: usize = 2;
/// Retained set cap and spacing, mirroring the keypoint dedup policy.
pub const MAX_POND_SITES: usize = 5;
pub const POND_SPACING_CELLS: f64 = 8.0;
/// Suggested pond size is hard-capped regardless of catchment, m².
pub const MAX_POND_SIZE_M2: f64 = 5000.0;

// Scoring policy constants.
const FLOW_SCORE_WEIGHT: f64 = 0.4;
const CONCAVE_BONUS: f64 = 0.3;
const CONCAVE_CURVATURE: f64 = -0.01;
const DAM_GRADE_BONUS: f64 = 0.2;
const MIN_DAM_SLOPE_PCT: f64 = 2.0;
const MAX_DAM_SLOPE_PCT: f64 = 15.0;
const KEYPOINT_PROXIMITY_BONUS: f64 = 0.1;
/// Degree-space radius (~100 m) for the keypoint-proximity bonus.
const KEYPOINT_PROXIMITY_DEG: f64 = 0.001;
/// Fraction of the catchment area suggested as pond surface.
const CATCHMENT_TO_POND_FRACTION: f64 = 0.01;

/// A candidate pond location with its scoring justification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PondSite {
    pub id: u32,
    pub lat: f64,
    pub lng: f64,
    pub elevation: f64,
    /// Estimated upstream surface area draining here, m².
    pub catchment_area: f64,
    /// Rainfall-adjusted suggested pond surface, m², capped.
    pub suggested_size: f64,
    pub score: f64,
    /// Human-readable justifications, in scoring order.
    pub reasons: Vec<String>,
}

/// Scan for convergence zones and return the retained, spaced, capped set.
pub fn select_pond_sites(
    grid: &ElevationGrid,
    field: &DifferentialField,
    flow: &FlowAccumulation,
    keypoints: &[Keypoint],
    pond_size_multiplier: f64,
) -> Vec<PondSite> {
    let rows = grid.rows();
    let cols = grid.cols();
    if rows < 3 || cols < 3 {
        return Vec::new();
    }

    let max_flow = flow.max();
    let res_sq = grid.resolution() * grid.resolution();
    let mut candidates: Vec<PondSite> = Vec::new();

    for r in 1..rows - 1 {
        for c in 1..cols - 1 {
            let normalized_flow = flow.get(r, c) / max_flow;
            if normalized_flow <= MIN_POND_FLOW_FRACTION {
                continue;
            }

            let d = field.get(r, c);
            let (lat, lng) = grid.cell_lat_lng(r, c);
            let mut score = FLOW_SCORE_WEIGHT * normalized_flow;
            let mut reasons: Vec<String> = Vec::new();

            if d.curvature < CONCAVE_CURVATURE {
                score += CONCAVE_BONUS;
                reasons.push("Concave terrain forms a natural collection basin".to_string());
            }
            if d.slope >= MIN_DAM_SLOPE_PCT && d.slope <= MAX_DAM_SLOPE_PCT {
                score += DAM_GRADE_BONUS;
                reasons.push("Slope is within buildable dam grade".to_string());
            }
            let near_keypoint = keypoints.iter().any(|kp| {
                let dlat = kp.lat - lat;
                let dlng = kp.lng - lng;
                (dlat * dlat + dlng * dlng).sqrt() < KEYPOINT_PROXIMITY_DEG
            });
            if near_keypoint {
                score += KEYPOINT_PROXIMITY_BONUS;
                reasons.push("Close to a detected keypoint".to_string());
            }

            // Score alone is not enough; the site must also justify itself.
            if score <= MIN_POND_SCORE || reasons.len() < MIN_POND_REASONS {
                continue;
            }

            let catchment_area = flow.get(r, c) * res_sq;
            let suggested_size =
                (catchment_area * CATCHMENT_TO_POND_FRACTION * pond_size_multiplier)
                    .min(MAX_POND_SIZE_M2);

            candidates.push(PondSite {
                id: 0,
                lat,
                lng,
                elevation: grid.get(r, c),
                catchment_area,
                suggested_size,
                score,
                reasons,
            });
        }
    }

    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let min_spacing = POND_SPACING_CELLS * grid.resolution();
    let mut kept: Vec<PondSite> = Vec::new();
    for candidate in candidates {
        if kept.len() >= MAX_POND_SITES {
            break;
        }
        let crowded = kept
            .iter()
            .any(|p| planar_distance_m(p.lat, p.lng, candidate.lat, candidate.lng) < min_spacing);
        if !crowded {
            kept.push(candidate);
        }
    }

    for (i, site) in kept.iter_mut().enumerate() {
        site.id = i as u32 + 1;
    }
    kept
}
