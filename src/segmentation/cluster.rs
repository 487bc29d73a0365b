//! Two-stage colour clustering (modified KD-tree).
//!
//! Samples are split recursively on one Lab axis at a time, cycling
//! L -> a -> b with depth. A node is split at the midpoint of its range on
//! the current axis whenever that range exceeds the axis limit (Rubner
//! rule); otherwise it becomes a leaf.
//!
//! The recursion is driven by an explicit work stack over index ranges of a
//! single buffer that is partitioned in place, so no sub-arrays are
//! allocated and deep splits cannot overflow the call stack. Leaves are
//! produced in the same left-to-right order a recursive descent would give.

use std::ops::Range;

use super::lab::ColorSample;
use super::CLUSTER_SIGNIFICANCE_PERCENT;

/// Partition `samples` in place into leaves whose range on the axis tested
/// at their depth is within `limits`.
///
/// `dims` is 3 for colour images and 1 for grayscale (L only).
fn for_each_leaf<F>(samples: &mut [ColorSample], limits: &[f32; 3], dims: usize, mut on_leaf: F)
where
    F: FnMut(&mut [ColorSample], Range<usize>),
{
    if samples.is_empty() {
        return;
    }
    let dims = dims.clamp(1, 3);

    let mut stack = vec![(0usize, samples.len(), 0usize)];

    while let Some((start, end, depth)) = stack.pop() {
        let dim = depth % dims;

        match split(&mut samples[start..end], dim, limits[dim]) {
            Some(mid) => {
                // right first so the left subtree is visited first
                stack.push((start + mid, end, depth + 1));
                stack.push((start, start + mid, depth + 1));
            }
            None => on_leaf(samples, start..end),
        }
    }
}

/// Split a node at the midpoint of its range on `dim`.
///
/// Returns the index of the first sample of the `> pivot` half, or `None`
/// if the node is a leaf.
fn split(node: &mut [ColorSample], dim: usize, limit: f32) -> Option<usize> {
    let first = node[0].component(dim);
    let (min, max) = node[1..].iter().fold((first, first), |(min, max), s| {
        let v = s.component(dim);
        (min.min(v), max.max(v))
    });

    if max - min <= limit {
        return None;
    }

    let pivot = (min + max) / 2.0;
    let mut mid = 0;
    for i in 0..node.len() {
        if node[i].component(dim) <= pivot {
            node.swap(i, mid);
            mid += 1;
        }
    }

    // A range narrower than float resolution can put everything on one side
    if mid == 0 || mid == node.len() {
        None
    } else {
        Some(mid)
    }
}

/// Unweighted mean of `members`, tagged with the given cardinality.
fn centroid(members: &[ColorSample], cardinality: u32) -> ColorSample {
    let n = members.len() as f32;
    let (l, a, b) = members
        .iter()
        .fold((0.0f32, 0.0f32, 0.0f32), |(l, a, b), s| (l + s.l, a + s.a, b + s.b));

    ColorSample {
        l: l / n,
        a: a / n,
        b: b / n,
        cardinality,
    }
}

/// Stage one: fine partition of raw samples.
///
/// Reorders `samples` in place and returns the index range of every leaf.
/// Each leaf is a cluster of raw samples.
pub fn stage_one(samples: &mut [ColorSample], limits: &[f32; 3], dims: usize) -> Vec<Range<usize>> {
    let mut leaves = Vec::new();
    for_each_leaf(samples, limits, dims, |_, range| leaves.push(range));
    leaves
}

/// Collapse every stage-one leaf into its centroid, weighted by member count.
pub fn leaf_centroids(samples: &[ColorSample], leaves: &[Range<usize>]) -> Vec<ColorSample> {
    leaves
        .iter()
        .map(|range| centroid(&samples[range.clone()], range.len() as u32))
        .collect()
}

/// Stage two: merge and prune weighted centroids.
///
/// Leaves are collapsed into one centroid carrying the summed cardinality
/// of their members. A leaf is kept only if it represents at least
/// [`CLUSTER_SIGNIFICANCE_PERCENT`] of the total population; smaller leaves
/// are dropped.
pub fn stage_two(samples: &mut [ColorSample], limits: &[f32; 3], dims: usize) -> Vec<ColorSample> {
    let total: u64 = samples.iter().map(|s| s.cardinality as u64).sum();
    if total == 0 {
        return Vec::new();
    }

    let mut clusters = Vec::new();
    for_each_leaf(samples, limits, dims, |samples, range| {
        let members = &samples[range];
        let sum: u64 = members.iter().map(|s| s.cardinality as u64).sum();

        if (sum as f64 / total as f64) * 100.0 >= CLUSTER_SIGNIFICANCE_PERCENT as f64 {
            clusters.push(centroid(members, sum.min(u32::MAX as u64) as u32));
        }
    });
    clusters
}
