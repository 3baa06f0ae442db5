use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Geographic bounding rectangle in degrees.
/// Row/col ↔ lat/lng conversion is linear interpolation across this
/// rectangle, not geodesic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self { north, south, east, west }
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn lng_span(&self) -> f64 {
        self.east - self.west
    }
}

#[derive(Debug, Error)]
pub enum GridError {
    #[error("elevation grid has no rows")]
    Empty,
    #[error("elevation grid row {row} has {got} samples, expected {expected}")]
    Jagged { row: usize, got: usize, expected: usize },
    #[error("non-finite elevation at row {row}, col {col}")]
    NonFinite { row: usize, col: usize },
    #[error("bounds north ({north}) must exceed south ({south})")]
    InvertedLat { north: f64, south: f64 },
    #[error("bounds east ({east}) must exceed west ({west})")]
    InvertedLng { east: f64, west: f64 },
    #[error("resolution must be positive, got {0}")]
    BadResolution(f64),
}

/// An immutable 2D elevation surface, row-major, in metres. Row 0 is the
/// northern edge; column 0 is the western edge. `resolution` is the metre
/// spacing between adjacent samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevationGrid {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
    resolution: f64,
    bounds: Bounds,
}

impl ElevationGrid {
    /// Build a grid from nested sample rows. Rejects empty or jagged input,
    /// non-finite samples, inverted bounds, and non-positive resolution.
    /// Grids smaller than 3×3 are accepted here; the analysis pipeline
    /// handles them as degenerate input.
    pub fn from_rows(
        rows: Vec<Vec<f64>>,
        resolution: f64,
        bounds: Bounds,
    ) -> Result<Self, GridError> {
        if rows.is_empty() || rows[0].is_empty() {
            return Err(GridError::Empty);
        }
        if !(resolution > 0.0) {
            return Err(GridError::BadResolution(resolution));
        }
        if bounds.north <= bounds.south {
            return Err(GridError::InvertedLat { north: bounds.north, south: bounds.south });
        }
        if bounds.east <= bounds.west {
            return Err(GridError::InvertedLng { east: bounds.east, west: bounds.west });
        }

        let cols = rows[0].len();
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (r, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(GridError::Jagged { row: r, got: row.len(), expected: cols });
            }
            for (c, &z) in row.iter().enumerate() {
                if !z.is_finite() {
                    return Err(GridError::NonFinite { row: r, col: c });
                }
                data.push(z);
            }
        }

        Ok(Self { data, rows: rows.len(), cols, resolution, bounds })
    }

    /// Create a grid filled with a constant elevation. Used by tests and
    /// synthetic-surface builders.
    pub fn filled(
        rows: usize,
        cols: usize,
        resolution: f64,
        bounds: Bounds,
        fill: f64,
    ) -> Result<Self, GridError> {
        Self::from_rows(vec![vec![fill; cols]; rows], resolution, bounds)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: f64) {
        self.data[row * self.cols + col] = val;
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Geographic position of a cell centre. Row 0 maps to the northern
    /// bound, the last row to the southern bound; same linear scheme for
    /// columns west→east.
    pub fn cell_lat_lng(&self, row: usize, col: usize) -> (f64, f64) {
        let row_max = (self.rows - 1).max(1) as f64;
        let col_max = (self.cols - 1).max(1) as f64;
        let lat = self.bounds.north - row as f64 / row_max * self.bounds.lat_span();
        let lng = self.bounds.west + col as f64 / col_max * self.bounds.lng_span();
        (lat, lng)
    }

    /// Nearest grid cell for a geographic position, or None when the
    /// position falls outside the bounds.
    pub fn nearest_cell(&self, lat: f64, lng: f64) -> Option<(usize, usize)> {
        let fr = (self.bounds.north - lat) / self.bounds.lat_span() * (self.rows - 1) as f64;
        let fc = (lng - self.bounds.west) / self.bounds.lng_span() * (self.cols - 1) as f64;
        let r = fr.round();
        let c = fc.round();
        if r < 0.0 || c < 0.0 || r as usize >= self.rows || c as usize >= self.cols {
            return None;
        }
        Some((r as usize, c as usize))
    }

    /// Elevation at a geographic position via nearest-cell lookup.
    pub fn elevation_at(&self, lat: f64, lng: f64) -> Option<f64> {
        self.nearest_cell(lat, lng).map(|(r, c)| self.get(r, c))
    }
}

/// Metres per degree used by the planar spacing checks in keypoint and
/// pond-site deduplication.
pub(crate) const METERS_PER_DEGREE_PLANAR: f64 = 111_000.0;

/// Planar great-circle approximation: straight-line distance in degree space
/// scaled to metres. Adequate at earthworks scale; not geodesic.
pub(crate) fn planar_distance_m(lat_a: f64, lng_a: f64, lat_b: f64, lng_b: f64) -> f64 {
    let dlat = lat_a - lat_b;
    let dlng = lng_a - lng_b;
    (dlat * dlat + dlng * dlng).sqrt() * METERS_PER_DEGREE_PLANAR
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_bounds() -> Bounds {
        Bounds::new(10.01, 10.0, 20.01, 20.0)
    }

    #[test]
    fn corner_cells_map_to_bounds_corners() {
        let grid = ElevationGrid::filled(5, 5, 10.0, test_bounds(), 0.0).unwrap();
        let (lat, lng) = grid.cell_lat_lng(0, 0);
        assert_relative_eq!(lat, 10.01);
        assert_relative_eq!(lng, 20.0);
        let (lat, lng) = grid.cell_lat_lng(4, 4);
        assert_relative_eq!(lat, 10.0);
        assert_relative_eq!(lng, 20.01);
    }

    #[test]
    fn nearest_cell_roundtrips_cell_centres() {
        let grid = ElevationGrid::filled(7, 9, 10.0, test_bounds(), 0.0).unwrap();
        for r in 0..7 {
            for c in 0..9 {
                let (lat, lng) = grid.cell_lat_lng(r, c);
                assert_eq!(grid.nearest_cell(lat, lng), Some((r, c)));
            }
        }
    }

    #[test]
    fn nearest_cell_outside_bounds_is_none() {
        let grid = ElevationGrid::filled(5, 5, 10.0, test_bounds(), 0.0).unwrap();
        assert_eq!(grid.nearest_cell(9.0, 20.005), None);
        assert_eq!(grid.nearest_cell(10.005, 21.0), None);
    }

    #[test]
    fn jagged_rows_rejected() {
        let rows = vec![vec![0.0, 1.0], vec![0.0]];
        let err = ElevationGrid::from_rows(rows, 10.0, test_bounds()).unwrap_err();
        assert!(matches!(err, GridError::Jagged { row: 1, got: 1, expected: 2 }));
    }

    #[test]
    fn inverted_bounds_rejected() {
        let bounds = Bounds::new(10.0, 10.01, 20.01, 20.0);
        let err = ElevationGrid::filled(3, 3, 10.0, bounds, 0.0).unwrap_err();
        assert!(matches!(err, GridError::InvertedLat { .. }));
    }

    #[test]
    fn non_finite_sample_rejected() {
        let rows = vec![vec![0.0, 1.0], vec![f64::NAN, 2.0]];
        let err = ElevationGrid::from_rows(rows, 10.0, test_bounds()).unwrap_err();
        assert!(matches!(err, GridError::NonFinite { row: 1, col: 0 }));
    }

    #[test]
    fn planar_distance_matches_degree_scale() {
        // 0.001° of pure latitude ≈ 111 m under the planar approximation.
        let d = planar_distance_m(10.0, 20.0, 10.001, 20.0);
        assert_relative_eq!(d, 111.0, epsilon = 1e-9);
    }
}
