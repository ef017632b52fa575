//! Thresholding the two concentration fields into a binary image.

use ndarray::{Array2, Zip};

use super::Field;

/// Substrate-vs-activator threshold coefficient.
pub const THRESHOLD: f64 = 0.4;

/// Collapse the fields into a two-color mask of the same dimensions.
///
/// A cell is foreground (`true`) where `a * 0.4 >= b`, i.e. where the
/// substrate still dominates; activator-dominated cells are background. The
/// boundary between the two is exactly the pattern front being visualized.
pub fn threshold_mask(a: &Field, b: &Field) -> Array2<bool> {
    assert_eq!(a.dim(), b.dim());

    Zip::from(a).and(b).map_collect(|&av, &bv| av * THRESHOLD >= bv)
}
