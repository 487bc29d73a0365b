//! Connected component selection on a confidence matrix.
//!
//! Pixels at or above a threshold are candidates. Candidates are grouped
//! into 4-connected components by breadth-first flood fill, seeded in
//! row-major order, with labels assigned from 1 upward.

use std::collections::VecDeque;

use log::trace;
use ndarray::Array2;

/// Component labels for every pixel (0 = not a candidate).
pub struct LabelField {
    pub labels: Array2<u32>,
    /// Pixel count per label; `sizes[label - 1]`
    pub sizes: Vec<usize>,
}

impl LabelField {
    pub fn component_count(&self) -> usize {
        self.sizes.len()
    }

    /// Label of the largest component. The first one found wins ties.
    pub fn largest(&self) -> Option<u32> {
        let mut best: Option<(u32, usize)> = None;
        for (i, &size) in self.sizes.iter().enumerate() {
            if best.map_or(true, |(_, s)| size > s) {
                best = Some((i as u32 + 1, size));
            }
        }
        best.map(|(label, _)| label)
    }

    /// Per component (`[label - 1]`): whether any of its pixels is set in
    /// `anchors`.
    pub fn anchored(&self, anchors: &Array2<bool>) -> Vec<bool> {
        let mut flags = vec![false; self.sizes.len()];
        for (&label, &anchor) in self.labels.iter().zip(anchors.iter()) {
            if label != 0 && anchor {
                flags[label as usize - 1] = true;
            }
        }
        flags
    }
}

/// Summary of a blob selection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobStats {
    /// Number of components found
    pub components: usize,
    /// Pixel count of the largest component
    pub largest: usize,
    /// Pixels left non-zero
    pub kept: usize,
}

/// Label the 4-connected components of pixels `>= threshold`.
///
/// # Arguments
/// * `matrix` - Confidence matrix (height, width)
/// * `threshold` - Minimum value for a pixel to be a candidate
pub fn label_components(matrix: &Array2<f32>, threshold: f32) -> LabelField {
    let (height, width) = matrix.dim();
    let mut labels = Array2::<u32>::zeros((height, width));
    let mut sizes = Vec::new();
    let mut queue = VecDeque::new();

    for y in 0..height {
        for x in 0..width {
            if labels[[y, x]] != 0 || matrix[[y, x]] < threshold {
                continue;
            }

            let label = sizes.len() as u32 + 1;
            let mut size = 0usize;

            labels[[y, x]] = label;
            queue.push_back((x, y));

            while let Some((cx, cy)) = queue.pop_front() {
                size += 1;

                for (dx, dy) in &[(-1i32, 0i32), (1, 0), (0, -1), (0, 1)] {
                    let nx = cx as i32 + dx;
                    let ny = cy as i32 + dy;

                    if nx >= 0 && nx < width as i32 && ny >= 0 && ny < height as i32 {
                        let nx = nx as usize;
                        let ny = ny as usize;
                        if labels[[ny, nx]] == 0 && matrix[[ny, nx]] >= threshold {
                            labels[[ny, nx]] = label;
                            queue.push_back((nx, ny));
                        }
                    }
                }
            }

            sizes.push(size);
        }
    }

    LabelField { labels, sizes }
}

/// Keep only the largest component; zero every other pixel.
///
/// Pixels of the kept component retain their values. Candidates of other
/// components and all pixels below `threshold` become 0.0, so the non-zero
/// pixels afterwards form a single 4-connected component (or none).
pub fn keep_largest_blob(matrix: &mut Array2<f32>, threshold: f32) -> BlobStats {
    let field = label_components(matrix, threshold);
    let keep = field.largest();

    retain_labels(matrix, &field, |label| Some(label) == keep)
}

/// Keep every component at least `1 / size_factor` the size of the largest,
/// plus every component touching an anchor pixel.
///
/// A `size_factor` of 0 or 1 keeps only components as large as the largest.
///
/// # Arguments
/// * `anchors` - Pixels whose component must survive regardless of size
///   (same shape as `matrix`)
pub fn keep_large_blobs(
    matrix: &mut Array2<f32>,
    threshold: f32,
    size_factor: usize,
    anchors: Option<&Array2<bool>>,
) -> BlobStats {
    let field = label_components(matrix, threshold);
    let max = field.sizes.iter().copied().max().unwrap_or(0);
    let factor = size_factor.max(1);
    let must_keep = match anchors {
        Some(anchors) => field.anchored(anchors),
        None => vec![false; field.sizes.len()],
    };
    let sizes = field.sizes.clone();

    retain_labels(matrix, &field, |label| {
        let i = label as usize - 1;
        must_keep[i] || sizes[i].saturating_mul(factor) >= max
    })
}

fn retain_labels<F>(matrix: &mut Array2<f32>, field: &LabelField, keep: F) -> BlobStats
where
    F: Fn(u32) -> bool,
{
    let mut kept = 0usize;

    for (value, &label) in matrix.iter_mut().zip(field.labels.iter()) {
        if label != 0 && keep(label) {
            kept += 1;
        } else {
            *value = 0.0;
        }
    }

    let stats = BlobStats {
        components: field.component_count(),
        largest: field.sizes.iter().copied().max().unwrap_or(0),
        kept,
    };
    trace!("blob: {:?}", stats);
    stats
}
