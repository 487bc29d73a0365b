//! Colour signatures: a handful of weighted Lab centroids per class.

use log::debug;

use super::cluster::{leaf_centroids, stage_one, stage_two};
use super::lab::ColorSample;

/// Representative colours of one class (background or foreground).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    centroids: Vec<ColorSample>,
}

impl Signature {
    /// Build a signature from raw samples of one class.
    ///
    /// Stage-one clustering produces fine leaves; their centroids are then
    /// merged and pruned by stage two. `samples` is reordered in place.
    ///
    /// # Arguments
    /// * `samples` - Lab samples, cardinality 1 each
    /// * `limits` - Per-axis cluster extent (L, a, b)
    /// * `dims` - 3 for colour, 1 for grayscale
    pub fn build(samples: &mut [ColorSample], limits: &[f32; 3], dims: usize) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let leaves = stage_one(samples, limits, dims);
        debug!("signature: stage one -> {} clusters from {} samples", leaves.len(), samples.len());

        let mut centroids = leaf_centroids(samples, &leaves);
        let centroids = stage_two(&mut centroids, limits, dims);
        debug!("signature: stage two -> {} clusters", centroids.len());

        Self { centroids }
    }

    pub fn from_centroids(centroids: Vec<ColorSample>) -> Self {
        Self { centroids }
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    pub fn centroids(&self) -> &[ColorSample] {
        &self.centroids
    }

    /// Smallest squared distance from `color` to any centroid.
    ///
    /// Returns `f32::INFINITY` for an empty signature.
    pub fn min_distance(&self, color: &ColorSample) -> f32 {
        self.centroids
            .iter()
            .map(|c| c.distance_sq(color))
            .fold(f32::INFINITY, f32::min)
    }
}
