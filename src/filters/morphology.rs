//! Confidence matrix filters: Smooth, Normalize, Erode, Dilate, Threshold.
//!
//! All operators work in place on a `(height, width)` matrix of values in
//! 0.0-1.0. Smooth, Erode and Dilate are four directional sweeps
//! (left to right, right to left, top to bottom, bottom to top). Each sweep
//! only reads neighbours that are in bounds, so edge pixels simply see
//! fewer neighbours and nothing wraps around.

use ndarray::Array2;

// ============================================================================
// Smooth
// ============================================================================

/// Smooth the matrix with a weighted 3-tap blend along all four directions.
///
/// Each sweep replaces a value with `f1 * self + f2 * next + f3 * next2`,
/// where `next` and `next2` are the following two pixels in the sweep
/// direction.
///
/// # Arguments
/// * `matrix` - Confidence matrix (height, width)
/// * `f1`, `f2`, `f3` - Blend weights, usually 1/3 each
pub fn smooth(matrix: &mut Array2<f32>, f1: f32, f2: f32, f3: f32) {
    let (height, width) = matrix.dim();

    for y in 0..height {
        for x in 0..width.saturating_sub(2) {
            matrix[[y, x]] =
                f1 * matrix[[y, x]] + f2 * matrix[[y, x + 1]] + f3 * matrix[[y, x + 2]];
        }
    }
    for y in 0..height {
        for x in (2..width).rev() {
            matrix[[y, x]] =
                f3 * matrix[[y, x - 2]] + f2 * matrix[[y, x - 1]] + f1 * matrix[[y, x]];
        }
    }
    for y in 0..height.saturating_sub(2) {
        for x in 0..width {
            matrix[[y, x]] =
                f1 * matrix[[y, x]] + f2 * matrix[[y + 1, x]] + f3 * matrix[[y + 2, x]];
        }
    }
    for y in (2..height).rev() {
        for x in 0..width {
            matrix[[y, x]] =
                f3 * matrix[[y - 2, x]] + f2 * matrix[[y - 1, x]] + f1 * matrix[[y, x]];
        }
    }
}

/// Smooth with equal weights of 1/3.
pub fn smooth_equal(matrix: &mut Array2<f32>) {
    let third = 1.0 / 3.0;
    smooth(matrix, third, third, third);
}

// ============================================================================
// Normalize
// ============================================================================

/// Scale the matrix so its maximum becomes 1.0.
///
/// No-op when the maximum is not positive or already 1.0, which also makes
/// the operation idempotent.
pub fn normalize(matrix: &mut Array2<f32>) {
    let max = matrix.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max <= 0.0 || max == 1.0 {
        return;
    }

    // Divide rather than multiply by 1/max: max / max is exactly 1.0
    matrix.mapv_inplace(|v| v / max);
}

// ============================================================================
// Erode / Dilate
// ============================================================================

/// Erode: pairwise minimum with the adjacent pixel in each direction.
///
/// Shrinks confident regions by about one pixel and cuts thin bridges.
pub fn erode(matrix: &mut Array2<f32>) {
    sweep(matrix, f32::min);
}

/// Dilate: pairwise maximum with the adjacent pixel in each direction.
///
/// Grows confident regions by about one pixel.
pub fn dilate(matrix: &mut Array2<f32>) {
    sweep(matrix, f32::max);
}

fn sweep(matrix: &mut Array2<f32>, op: fn(f32, f32) -> f32) {
    let (height, width) = matrix.dim();

    for y in 0..height {
        for x in 0..width.saturating_sub(1) {
            matrix[[y, x]] = op(matrix[[y, x]], matrix[[y, x + 1]]);
        }
    }
    for y in 0..height {
        for x in (1..width).rev() {
            matrix[[y, x]] = op(matrix[[y, x - 1]], matrix[[y, x]]);
        }
    }
    for y in 0..height.saturating_sub(1) {
        for x in 0..width {
            matrix[[y, x]] = op(matrix[[y, x]], matrix[[y + 1, x]]);
        }
    }
    for y in (1..height).rev() {
        for x in 0..width {
            matrix[[y, x]] = op(matrix[[y - 1, x]], matrix[[y, x]]);
        }
    }
}

// ============================================================================
// Threshold
// ============================================================================

/// Binarize: values `>= level` become 1.0, everything else 0.0.
pub fn threshold(matrix: &mut Array2<f32>, level: f32) {
    matrix.mapv_inplace(|v| if v >= level { 1.0 } else { 0.0 });
}
