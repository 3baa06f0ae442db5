//! D8 flow accumulation over a flat arena.
//!
//! Cells are processed in descending elevation order, so every uphill
//! contributor is resolved before its downhill target. Each cell routes its
//! entire accumulation to the single neighbour with the greatest positive
//! drop per unit distance; local minima and edge cells with no downhill
//! neighbour route nowhere.

use std::cmp::Ordering;

use crate::grid::ElevationGrid;

/// Fixed D8 direction table. Iteration order is load-bearing: ties in
/// drop-per-distance are resolved by whichever direction comes first here,
/// so reordering changes routing on symmetric terrain.
const D8_OFFSETS: [(i32, i32); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// Per-cell accumulated flow, row-major. Minimum value is 1: every cell
/// contributes to itself. Mutated only while `compute_flow_accumulation`
/// runs; read-only afterward.
#[derive(Debug, Clone)]
pub struct FlowAccumulation {
    cells: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl FlowAccumulation {
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells[row * self.cols + col]
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Largest accumulation in the field. At least 1 for non-empty grids.
    pub fn max(&self) -> f64 {
        self.cells.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Route flow across the grid with D8 steepest descent.
pub fn compute_flow_accumulation(grid: &ElevationGrid) -> FlowAccumulation {
    let rows = grid.rows();
    let cols = grid.cols();
    let n = rows * cols;
    let mut cells = vec![1.0f64; n];

    // Descending elevation order. Stable sort keeps equal-elevation cells in
    // row-major order, which pins the scatter order bit-for-bit.
    let mut order: Vec<usize> = (0..n).collect();
    let data = grid.data();
    order.sort_by(|&a, &b| data[b].partial_cmp(&data[a]).unwrap_or(Ordering::Equal));

    for &idx in &order {
        let r = (idx / cols) as i32;
        let c = (idx % cols) as i32;
        let z = data[idx];

        let mut best: Option<usize> = None;
        let mut best_gradient = 0.0f64;
        for &(dr, dc) in &D8_OFFSETS {
            let nr = r + dr;
            let nc = c + dc;
            if nr < 0 || nc < 0 || nr >= rows as i32 || nc >= cols as i32 {
                continue;
            }
            let nidx = nr as usize * cols + nc as usize;
            let distance = if dr != 0 && dc != 0 { SQRT_2 } else { 1.0 };
            let gradient = (z - data[nidx]) / distance;
            // Strict comparison: first direction in the table wins ties.
            if gradient > best_gradient {
                best_gradient = gradient;
                best = Some(nidx);
            }
        }

        if let Some(target) = best {
            cells[target] += cells[idx];
        }
    }

    FlowAccumulation { cells, rows, cols }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Bounds;

    fn test_bounds() -> Bounds {
        Bounds::new(10.002, 10.0, 20.002, 20.0)
    }

    fn grid_from(rows: Vec<Vec<f64>>) -> ElevationGrid {
        ElevationGrid::from_rows(rows, 10.0, test_bounds()).unwrap()
    }

    #[test]
    fn flat_grid_accumulates_nothing() {
        let grid = grid_from(vec![vec![5.0; 6]; 6]);
        let flow = compute_flow_accumulation(&grid);
        for r in 0..6 {
            for c in 0..6 {
                assert_eq!(flow.get(r, c), 1.0, "flat cell ({r},{c}) must stay at 1");
            }
        }
        assert_eq!(flow.max(), 1.0);
    }

    #[test]
    fn every_cell_at_least_one() {
        let grid = grid_from(
            (0..8).map(|r| (0..8).map(|c| ((r * 13 + c * 7) % 11) as f64).collect()).collect(),
        );
        let flow = compute_flow_accumulation(&grid);
        for r in 0..8 {
            for c in 0..8 {
                assert!(flow.get(r, c) >= 1.0);
            }
        }
    }

    #[test]
    fn south_ramp_concentrates_in_last_row() {
        // Every cell drains straight south; column totals stack up linearly.
        let grid = grid_from((0..6).map(|r| vec![(5 - r) as f64 * 10.0; 6]).collect());
        let flow = compute_flow_accumulation(&grid);
        for c in 0..6 {
            assert_eq!(flow.get(5, c), 6.0, "column {c} should deliver all 6 cells");
        }
        for c in 0..6 {
            assert_eq!(flow.get(0, c), 1.0);
        }
    }

    #[test]
    fn v_valley_routes_walls_into_centre_column() {
        // Walls slope toward a centre channel that drains southward.
        let cols = 9;
        let rows = 9;
        let centre = 4i32;
        let grid = grid_from(
            (0..rows)
                .map(|r| {
                    (0..cols)
                        .map(|c| {
                            let wall = (c as i32 - centre).abs() as f64 * 50.0;
                            wall + (rows - 1 - r) as f64 * 5.0
                        })
                        .collect()
                })
                .collect(),
        );
        let flow = compute_flow_accumulation(&grid);
        // The channel outlet collects every cell in the grid.
        assert_eq!(flow.get(8, 4), (rows * cols) as f64);
        assert_eq!(flow.max(), (rows * cols) as f64);
    }

    #[test]
    fn equal_drops_resolve_to_first_table_direction() {
        // Centre of a 3×3 with all eight neighbours equally lower: the four
        // orthogonal drops tie at the maximum and north (-1, 0) is listed
        // first, so the centre's flow lands on the north cell.
        let grid = grid_from(vec![
            vec![5.0, 5.0, 5.0],
            vec![5.0, 10.0, 5.0],
            vec![5.0, 5.0, 5.0],
        ]);
        let flow = compute_flow_accumulation(&grid);
        assert_eq!(flow.get(0, 1), 2.0, "north neighbour should win the tie");
        assert_eq!(flow.get(1, 0), 1.0);
        assert_eq!(flow.get(1, 2), 1.0);
        assert_eq!(flow.get(2, 1), 1.0);
    }
}
