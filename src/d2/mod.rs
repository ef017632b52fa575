//! Two-dimensional Gray-Scott operators: stencil, rates, update step and
//! boundary handling.
//!
//! Fields are indexed `[[row, col]]`. Every operator reads one *generation*
//! of the system and writes the next; see [`sim::Simulation`] for the
//! double-buffered driver that ties them together.

use ndarray::Array2;

pub mod render;
pub mod sim;

/// One concentration field, `rows x cols`, allocated once and never resized.
pub type Field = Array2<f64>;

/// Spatially varying feed/kill parameters, linearly interpolated between two
/// endpoints across the grid extent. Stateless; evaluated per cell.
///
/// The feed rate increases toward the top of the grid (row 0), the kill rate
/// toward the left (column 0), so one run sweeps a whole band of Gray-Scott
/// pattern regimes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    pub feed_low: f64,
    pub feed_high: f64,
    pub kill_low: f64,
    pub kill_high: f64,
}

impl Default for Rates {
    fn default() -> Self {
        Rates {
            feed_low: 0.01,
            feed_high: 0.1,
            kill_low: 0.045,
            kill_high: 0.07,
        }
    }
}

impl Rates {
    /// No feeding, no killing: pure diffusion. Useful for conservation tests.
    pub fn zero() -> Self {
        Rates {
            feed_low: 0.0,
            feed_high: 0.0,
            kill_low: 0.0,
            kill_high: 0.0,
        }
    }

    /// Substrate feed rate at `row` of a grid with `rows` rows.
    pub fn feed(&self, row: usize, rows: usize) -> f64 {
        self.feed_low + (self.feed_high - self.feed_low) * (rows - row) as f64 / rows as f64
    }

    /// Activator kill rate at `col` of a grid with `cols` columns.
    pub fn kill(&self, col: usize, cols: usize) -> f64 {
        self.kill_low + (self.kill_high - self.kill_low) * (cols - col) as f64 / cols as f64
    }
}

/// 9-point discrete Laplacian at interior cell `(i, j)`: orthogonal
/// neighbors at 0.2, diagonal at 0.05, center at -1.
///
/// Requires the full 3x3 neighborhood, so `1 <= i < rows - 1` and
/// `1 <= j < cols - 1`; anything else is an out-of-bounds panic.
pub fn laplacian(q: &Field, i: usize, j: usize) -> f64 {
    0.2 * (q[[i - 1, j]] + q[[i + 1, j]] + q[[i, j - 1]] + q[[i, j + 1]])
        + 0.05 * (q[[i - 1, j - 1]] + q[[i - 1, j + 1]] + q[[i + 1, j - 1]] + q[[i + 1, j + 1]])
        - q[[i, j]]
}

/// One reaction-diffusion update over all interior cells.
///
/// Reads only the current generation `a`/`b` and writes only `a_next`/
/// `b_next`, so no stencil ever sees a partially updated neighbor. Boundary
/// cells of the next generation are left untouched; patch them afterwards
/// with [`patch_boundary`].
pub fn step(a: &Field, b: &Field, a_next: &mut Field, b_next: &mut Field, rates: &Rates) {
    let (rows, cols) = a.dim();

    assert_eq!(a.dim(), b.dim());
    assert_eq!(a.dim(), a_next.dim());
    assert_eq!(a.dim(), b_next.dim());

    for i in 1..rows - 1 {
        let f = rates.feed(i, rows);

        for j in 1..cols - 1 {
            let k = rates.kill(j, cols);

            let av = a[[i, j]];
            let bv = b[[i, j]];
            let reaction = av * bv * bv;

            a_next[[i, j]] = av + laplacian(a, i, j) - reaction + f * (1.0 - av);
            // The activator diffuses at half the substrate's rate.
            b_next[[i, j]] = bv + 0.5 * laplacian(b, i, j) + reaction - (k + f) * bv;
        }
    }
}

/// Zero-flux (Neumann) boundary: every border cell takes the value of its
/// nearest interior neighbor.
///
/// Left/right columns are patched across all rows first, then top/bottom
/// rows across all columns; the row pass rewrites the four corners. The
/// order is fixed so corner values stay bit-identical between runs.
pub fn patch_boundary(q: &mut Field) {
    let (rows, cols) = q.dim();

    for i in 0..rows {
        q[[i, 0]] = q[[i, 1]];
        q[[i, cols - 1]] = q[[i, cols - 2]];
    }

    for j in 0..cols {
        q[[0, j]] = q[[1, j]];
        q[[rows - 1, j]] = q[[rows - 2, j]];
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array};

    #[test]
    fn test_laplacian_flat_field_is_zero() {
        let q = Array::from_elem((5, 5), 3.25);

        for i in 1..4 {
            for j in 1..4 {
                assert_abs_diff_eq!(laplacian(&q, i, j), 0.0);
            }
        }
    }

    #[test]
    fn test_laplacian_known_neighborhood() {
        let q = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];

        // 0.2*(2+8+4+6) + 0.05*(1+3+7+9) - 5
        assert_abs_diff_eq!(laplacian(&q, 1, 1), 0.2 * 20.0 + 0.05 * 20.0 - 5.0);
    }

    #[test]
    fn test_rates_gradient_endpoints() {
        let rates = Rates::default();

        // Row 0 is the top of the grid, column 0 the left edge.
        assert_abs_diff_eq!(rates.feed(0, 200), 0.1);
        assert_abs_diff_eq!(rates.kill(0, 200), 0.07);

        // The interpolation reaches the low endpoint at the far extent.
        assert_abs_diff_eq!(rates.feed(200, 200), 0.01);
        assert_abs_diff_eq!(rates.kill(200, 200), 0.045);

        assert!(rates.feed(10, 200) > rates.feed(190, 200));
        assert!(rates.kill(10, 200) > rates.kill(190, 200));
    }

    #[test]
    fn test_step_conserves_mass_without_reaction() {
        // Zero rates and b == 0 reduce the update to pure diffusion. A bump
        // kept two cells away from the border is only ever read by interior
        // stencils, and the stencil weights sum to zero, so the total of the
        // field must not change.
        let mut a = Array::from_elem((20, 20), 1.0);
        for i in 6..12 {
            for j in 7..13 {
                a[[i, j]] = 1.0 + 0.1 * (i * j) as f64;
            }
        }
        let b = Array::from_elem((20, 20), 0.0);

        let mut a_next = a.clone();
        let mut b_next = b.clone();
        step(&a, &b, &mut a_next, &mut b_next, &Rates::zero());

        assert_abs_diff_eq!(a_next.sum(), a.sum(), epsilon = 1e-9);
        assert_abs_diff_eq!(b_next.sum(), 0.0);
    }

    #[test]
    fn test_step_reads_only_current_generation() {
        // Garbage in the next buffers must not leak into the result.
        let a = Array::from_elem((6, 6), 0.7);
        let b = Array::from_elem((6, 6), 0.2);

        let mut a_next = Array::from_elem((6, 6), f64::NAN);
        let mut b_next = Array::from_elem((6, 6), f64::NAN);
        step(&a, &b, &mut a_next, &mut b_next, &Rates::default());

        let mut a_next2 = Array::from_elem((6, 6), -1e30);
        let mut b_next2 = Array::from_elem((6, 6), 1e30);
        step(&a, &b, &mut a_next2, &mut b_next2, &Rates::default());

        for i in 1..5 {
            for j in 1..5 {
                assert_eq!(a_next[[i, j]], a_next2[[i, j]]);
                assert_eq!(b_next[[i, j]], b_next2[[i, j]]);
            }
        }
    }

    #[test]
    fn test_patch_boundary_copies_nearest_interior() {
        let mut q = array![
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
            [13.0, 14.0, 15.0, 16.0],
        ];
        patch_boundary(&mut q);

        assert_eq!(q[[1, 0]], 6.0);
        assert_eq!(q[[1, 3]], 7.0);
        assert_eq!(q[[0, 1]], 6.0);
        assert_eq!(q[[3, 2]], 11.0);

        // Corners end up holding their diagonal interior neighbor.
        assert_eq!(q[[0, 0]], 6.0);
        assert_eq!(q[[0, 3]], 7.0);
        assert_eq!(q[[3, 0]], 10.0);
        assert_eq!(q[[3, 3]], 11.0);
    }

    #[test]
    fn test_patch_boundary_is_idempotent() {
        let mut q = Array::from_shape_fn((7, 5), |(i, j)| (3 * i + j) as f64);

        patch_boundary(&mut q);
        let once = q.clone();
        patch_boundary(&mut q);

        assert_eq!(q, once);
    }
}
