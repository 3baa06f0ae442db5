//! Differential field: per-cell slope, aspect, and profile curvature from a
//! Horn (1981) weighted 3×3 stencil.
//!
//! Border cells (row/col index 0 or last) have no full neighbourhood and are
//! defined to be all-zero. The computation is total and deterministic; the
//! near-flat curvature guard is the only special case.

use serde::{Deserialize, Serialize};

use crate::grid::ElevationGrid;

/// Derived values for one grid cell.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CellDifferential {
    /// Slope magnitude in percent (100 × rise/run).
    pub slope: f64,
    /// Downhill compass bearing in degrees, 0 = north, clockwise, [0, 360).
    pub aspect: f64,
    /// Signed profile curvature: positive = convex (ridge/shoulder),
    /// negative = concave (valley/basin).
    pub curvature: f64,
}

/// Gradient-magnitude-squared floor below which profile curvature is defined
/// as zero rather than divided toward infinity.
pub const FLAT_CURVATURE_THRESHOLD: f64 = 1e-4;

/// Differential values for every cell of a grid, row-major.
#[derive(Debug, Clone)]
pub struct DifferentialField {
    cells: Vec<CellDifferential>,
    rows: usize,
    cols: usize,
}

impl DifferentialField {
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> &CellDifferential {
        &self.cells[row * self.cols + col]
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Iterate over interior cells (the ones with a full 3×3 neighbourhood).
    pub fn interior(&self) -> impl Iterator<Item = &CellDifferential> {
        let rows = self.rows;
        let cols = self.cols;
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            let r = i / cols;
            let c = i % cols;
            (r > 0 && c > 0 && r + 1 < rows && c + 1 < cols).then_some(cell)
        })
    }
}

/// Horn (1981) weighted 3×3 gradient at interior cell `(r, c)`.
///
/// Returns `(dz_dx, dz_dy)` — dimensionless rise/run, x positive eastward,
/// y positive northward (row 0 is the northern edge).
///
/// `dz/dx = ((NE + 2E + SE) − (NW + 2W + SW)) / (8 · resolution)`
/// `dz/dy = ((NW + 2N + NE) − (SW + 2S + SE)) / (8 · resolution)`
///
/// Caller must ensure `1 ≤ r ≤ rows−2` and `1 ≤ c ≤ cols−2`.
fn horn_gradient(grid: &ElevationGrid, r: usize, c: usize) -> (f64, f64) {
    let nw = grid.get(r - 1, c - 1);
    let n = grid.get(r - 1, c);
    let ne = grid.get(r - 1, c + 1);
    let w = grid.get(r, c - 1);
    let e = grid.get(r, c + 1);
    let sw = grid.get(r + 1, c - 1);
    let s = grid.get(r + 1, c);
    let se = grid.get(r + 1, c + 1);

    let denom = 8.0 * grid.resolution();
    let dz_dx = ((ne + 2.0 * e + se) - (nw + 2.0 * w + sw)) / denom;
    let dz_dy = ((nw + 2.0 * n + ne) - (sw + 2.0 * s + se)) / denom;
    (dz_dx, dz_dy)
}

/// Profile curvature from first and second partials:
///
/// `curv = −(dzdx²·zxx + 2·dzdx·dzdy·zxy + dzdy²·zyy) / (p·sqrt(p+1))`
///
/// with `p = dzdx² + dzdy²`. Zero when `p < FLAT_CURVATURE_THRESHOLD`.
fn profile_curvature(grid: &ElevationGrid, r: usize, c: usize, dz_dx: f64, dz_dy: f64) -> f64 {
    let p = dz_dx * dz_dx + dz_dy * dz_dy;
    if p < FLAT_CURVATURE_THRESHOLD {
        return 0.0;
    }

    let res_sq = grid.resolution() * grid.resolution();
    let z = grid.get(r, c);
    let zxx = (grid.get(r, c + 1) + grid.get(r, c - 1) - 2.0 * z) / res_sq;
    let zyy = (grid.get(r - 1, c) + grid.get(r + 1, c) - 2.0 * z) / res_sq;
    // Mixed partial, consistent with y positive northward.
    let zxy = ((grid.get(r - 1, c + 1) - grid.get(r - 1, c - 1))
        - (grid.get(r + 1, c + 1) - grid.get(r + 1, c - 1)))
        / (4.0 * res_sq);

    -(dz_dx * dz_dx * zxx + 2.0 * dz_dx * dz_dy * zxy + dz_dy * dz_dy * zyy)
        / (p * (p + 1.0).sqrt())
}

/// Compute the differential field for a grid. Always total: every cell gets
/// a value, borders are all-zero.
pub fn compute_differentials(grid: &ElevationGrid) -> DifferentialField {
    let rows = grid.rows();
    let cols = grid.cols();
    let mut cells = vec![CellDifferential::default(); rows * cols];

    if rows < 3 || cols < 3 {
        return DifferentialField { cells, rows, cols };
    }

    for r in 1..rows - 1 {
        for c in 1..cols - 1 {
            let (dz_dx, dz_dy) = horn_gradient(grid, r, c);
            let slope = 100.0 * (dz_dx * dz_dx + dz_dy * dz_dy).sqrt();

            // Downhill bearing, clockwise from north: the gradient points
            // uphill, so the downhill vector is (−dzdx, −dzdy). A cell with
            // no gradient has no downhill direction; its aspect stays 0.
            let mut aspect = 0.0;
            if dz_dx != 0.0 || dz_dy != 0.0 {
                aspect = (-dz_dx).atan2(-dz_dy).to_degrees();
                if aspect < 0.0 {
                    aspect += 360.0;
                }
            }

            let curvature = profile_curvature(grid, r, c, dz_dx, dz_dy);
            cells[r * cols + c] = CellDifferential { slope, aspect, curvature };
        }
    }

    DifferentialField { cells, rows, cols }
}
