//! Keyline tracing: contour-following polylines through keypoints.
//!
//! Each keyline grows outward from its keypoint in the two bearings
//! perpendicular to the local aspect, holding elevation within tolerance of
//! the start. Metre steps convert to degree deltas with the longitude scale
//! re-evaluated at every point, since it depends on latitude.

use serde::{Deserialize, Serialize};

use crate::grid::ElevationGrid;
use crate::keypoint::Keypoint;
use crate::params::KeylineSpacing;

/// Maximum reach of a trace in each direction, metres.
pub const MAX_KEYLINE_REACH_M: f64 = 150.0;
/// Step length as a multiple of grid resolution.
pub const KEYLINE_STEP_CELLS: f64 = 1.5;
/// A traced point may depart the keypoint elevation by at most this much.
pub const KEYLINE_ELEVATION_TOLERANCE_M: f64 = 2.0;
/// Traces must stay inside this fractional inset of the bounds rectangle.
pub const BOUNDS_INSET_FRACTION: f64 = 0.1;

/// Metres per degree of latitude; longitude scales by cos(lat).
const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// A contour-following polyline through one keypoint. `keypoint_id` is a
/// key, not a live reference. Coordinates are (lng, lat) pairs ordered from
/// one end to the other with the keypoint in the middle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyline {
    pub id: u32,
    pub keypoint_id: u32,
    pub coordinates: Vec<[f64; 2]>,
    pub elevation: f64,
    /// Approximate length in metres (point count × resolution).
    pub length: f64,
    /// Recommended spacing to the next keyline, metres, from the rainfall
    /// context's spacing class.
    pub recommended_spacing: f64,
}

/// Trace one keyline per keypoint. Every keypoint yields a `Keyline`, even a
/// degenerate single-point one; filtering short lines out of the visual
/// feature set happens at feature assembly, not here.
pub fn trace_keylines(
    grid: &ElevationGrid,
    keypoints: &[Keypoint],
    spacing: KeylineSpacing,
) -> Vec<Keyline> {
    keypoints
        .iter()
        .map(|kp| {
            let left = trace_direction(grid, kp, kp.aspect + 90.0);
            let right = trace_direction(grid, kp, kp.aspect + 270.0);

            let mut coordinates = Vec::with_capacity(left.len() + right.len() + 1);
            coordinates.extend(left.into_iter().rev());
            coordinates.push([kp.lng, kp.lat]);
            coordinates.extend(right);

            let length = coordinates.len() as f64 * grid.resolution();
            Keyline {
                id: kp.id,
                keypoint_id: kp.id,
                coordinates,
                elevation: kp.elevation,
                length,
                recommended_spacing: spacing.spacing_m(),
            }
        })
        .collect()
}

/// Walk outward from the keypoint along `bearing_deg` (compass degrees),
/// collecting points until the trace runs out of reach, departs the start
/// elevation by more than the tolerance, leaves the inset interior of the
/// bounds, or steps off the grid entirely. Out-of-range lookups are a stop
/// condition, never an error; a partial trace is valid output.
fn trace_direction(grid: &ElevationGrid, kp: &Keypoint, bearing_deg: f64) -> Vec<[f64; 2]> {
    let bounds = grid.bounds();
    let step_m = KEYLINE_STEP_CELLS * grid.resolution();
    let max_steps = (MAX_KEYLINE_REACH_M / step_m).floor() as usize;

    let lat_inset = BOUNDS_INSET_FRACTION * bounds.lat_span();
    let lng_inset = BOUNDS_INSET_FRACTION * bounds.lng_span();
    let (lat_min, lat_max) = (bounds.south + lat_inset, bounds.north - lat_inset);
    let (lng_min, lng_max) = (bounds.west + lng_inset, bounds.east - lng_inset);

    let bearing = bearing_deg.to_radians();
    let mut lat = kp.lat;
    let mut lng = kp.lng;
    let mut points = Vec::new();

    for _ in 0..max_steps {
        // Longitude scale depends on latitude; re-evaluate at the current
        // point before stepping.
        lat += bearing.cos() * step_m / METERS_PER_DEGREE_LAT;
        lng += bearing.sin() * step_m / (METERS_PER_DEGREE_LAT * lat.to_radians().cos());

        if lat < lat_min || lat > lat_max || lng < lng_min || lng > lng_max {
            break;
        }
        match grid.elevation_at(lat, lng) {
            Some(z) if (z - kp.elevation).abs() <= KEYLINE_ELEVATION_TOLERANCE_M => {
                points.push([lng, lat]);
            }
            _ => break,
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Bounds;

    // ~20 cells of 10 m resolution spanning about 190 m of latitude at 10°N.
    fn test_bounds() -> Bounds {
        let span = 190.0 / 111_320.0;
        Bounds::new(10.0 + span, 10.0, 20.0 + span, 20.0)
    }

    /// Row-uniform south-descending slope: every row is an exact contour, so
    /// an east-west trace never violates the elevation tolerance.
    fn south_slope_grid(n: usize) -> ElevationGrid {
        let rows = (0..n).map(|r| vec![(n - r) as f64 * 1.0; n]).collect();
        ElevationGrid::from_rows(rows, 10.0, test_bounds()).unwrap()
    }

    fn centre_keypoint(grid: &ElevationGrid, aspect: f64) -> Keypoint {
        let r = grid.rows() / 2;
        let c = grid.cols() / 2;
        let (lat, lng) = grid.cell_lat_lng(r, c);
        Keypoint {
            id: 1,
            lat,
            lng,
            elevation: grid.get(r, c),
            slope_above: 10.0,
            slope_below: 8.0,
            aspect,
            curvature: -0.01,
            confidence: 0.8,
            pond_suitability: 0.5,
        }
    }

    #[test]
    fn contour_trace_extends_both_directions() {
        let grid = south_slope_grid(20);
        let kp = centre_keypoint(&grid, 180.0);
        let keylines = trace_keylines(&grid, &[kp], KeylineSpacing::Standard);
        assert_eq!(keylines.len(), 1);
        let kl = &keylines[0];
        assert!(
            kl.coordinates.len() >= 5,
            "contour trace should span the inset interior, got {} points",
            kl.coordinates.len()
        );
        assert_eq!(kl.length, kl.coordinates.len() as f64 * 10.0);
        assert_eq!(kl.keypoint_id, 1);
        assert_eq!(kl.recommended_spacing, 30.0);
    }

    #[test]
    fn traced_points_hold_start_elevation() {
        let grid = south_slope_grid(20);
        let kp = centre_keypoint(&grid, 180.0);
        let keylines = trace_keylines(&grid, &[kp.clone()], KeylineSpacing::Standard);
        for [lng, lat] in &keylines[0].coordinates {
            let z = grid.elevation_at(*lat, *lng).expect("trace left the grid");
            assert!(
                (z - kp.elevation).abs() <= KEYLINE_ELEVATION_TOLERANCE_M,
                "point at ({lat}, {lng}) is {z} m, start was {} m",
                kp.elevation
            );
        }
    }

    #[test]
    fn traced_points_respect_bounds_inset() {
        let grid = south_slope_grid(20);
        let bounds = grid.bounds();
        let lat_inset = BOUNDS_INSET_FRACTION * bounds.lat_span();
        let lng_inset = BOUNDS_INSET_FRACTION * bounds.lng_span();
        let kp = centre_keypoint(&grid, 180.0);
        let keylines = trace_keylines(&grid, &[kp], KeylineSpacing::Standard);
        for [lng, lat] in &keylines[0].coordinates {
            assert!(*lat >= bounds.south + lat_inset && *lat <= bounds.north - lat_inset);
            assert!(*lng >= bounds.west + lng_inset && *lng <= bounds.east - lng_inset);
        }
    }

    #[test]
    fn cross_slope_trace_stops_at_tolerance() {
        // East-descending 20% slope with a south aspect keypoint: the trace
        // runs east/west, loses 3 m per 15 m step, and stops immediately.
        let rows = (0..20)
            .map(|_| (0..20).map(|c| (20 - c) as f64 * 2.0).collect())
            .collect();
        let grid = ElevationGrid::from_rows(rows, 10.0, test_bounds()).unwrap();
        let kp = centre_keypoint(&grid, 180.0);
        let keylines = trace_keylines(&grid, &[kp], KeylineSpacing::Standard);
        let kl = &keylines[0];
        assert_eq!(
            kl.coordinates.len(),
            1,
            "steep cross-slope should truncate the trace to the keypoint itself"
        );
        assert_eq!(kl.length, 10.0);
    }

    #[test]
    fn spacing_class_sets_recommended_spacing() {
        let grid = south_slope_grid(20);
        let kp = centre_keypoint(&grid, 180.0);
        for (class, expect) in [
            (KeylineSpacing::Tight, 20.0),
            (KeylineSpacing::Standard, 30.0),
            (KeylineSpacing::Wide, 50.0),
        ] {
            let keylines = trace_keylines(&grid, &[kp.clone()], class);
            assert_eq!(keylines[0].recommended_spacing, expect);
        }
    }

    #[test]
    fn keypoint_sits_between_the_two_traces() {
        let grid = south_slope_grid(20);
        let kp = centre_keypoint(&grid, 180.0);
        let keylines = trace_keylines(&grid, &[kp.clone()], KeylineSpacing::Standard);
        let coords = &keylines[0].coordinates;
        assert!(coords.iter().any(|&[lng, lat]| lng == kp.lng && lat == kp.lat));
        // Points east and west of the keypoint both present.
        assert!(coords.iter().any(|&[lng, _]| lng < kp.lng));
        assert!(coords.iter().any(|&[lng, _]| lng > kp.lng));
    }
}
