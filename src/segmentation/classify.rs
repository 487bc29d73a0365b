//! Nearest-signature classification of undecided pixels.

use std::collections::{HashMap, HashSet};

use log::debug;
use ndarray::{Array2, ArrayView3};
use rayon::prelude::*;

use super::lab::ColorSample;
use super::signature::Signature;
use super::{color_key, pixel_rgb, Certainty};

/// Distances of one colour to both signatures, plus the decision.
///
/// Distances are squared. Without a foreground signature `fg_dist` is a
/// stand-in derived from the cluster size so the detail brush still has a
/// ratio to work with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassResult {
    pub bg_dist: f32,
    pub fg_dist: f32,
    pub foreground: bool,
}

/// Squared diagonal of the box `[-limits, +limits]^3`.
pub fn cluster_size(limits: &[f32; 3]) -> f32 {
    limits.iter().map(|&l| (2.0 * l) * (2.0 * l)).sum()
}

/// Assigns colours to foreground or background by nearest centroid.
pub struct PixelClassifier<'a> {
    background: &'a Signature,
    foreground: &'a Signature,
    cluster_size: f32,
}

impl<'a> PixelClassifier<'a> {
    pub fn new(background: &'a Signature, foreground: &'a Signature, limits: &[f32; 3]) -> Self {
        Self {
            background,
            foreground,
            cluster_size: cluster_size(limits),
        }
    }

    /// Classify one Lab colour.
    ///
    /// With a foreground signature the colour is foreground only if some
    /// foreground centroid is strictly closer than every background
    /// centroid. Without one, colours farther than the cluster size from
    /// all background centroids are foreground.
    pub fn classify(&self, color: &ColorSample) -> ClassResult {
        let bg_dist = self.background.min_distance(color);

        if self.foreground.is_empty() {
            if bg_dist < self.cluster_size {
                ClassResult {
                    bg_dist,
                    fg_dist: bg_dist + self.cluster_size,
                    foreground: false,
                }
            } else {
                ClassResult {
                    bg_dist,
                    fg_dist: 0.00001,
                    foreground: true,
                }
            }
        } else {
            let fg_dist = self.foreground.min_distance(color);
            ClassResult {
                bg_dist,
                fg_dist,
                foreground: fg_dist < bg_dist,
            }
        }
    }
}

/// Per-colour memo of classification results.
///
/// Keyed by packed RGB, so every pixel of the same colour is classified
/// once. Survives between refinement passes of a
/// [`Segmenter`](super::Segmenter).
#[derive(Debug, Clone, Default)]
pub struct ClassificationCache {
    entries: HashMap<u32, ClassResult>,
}

impl ClassificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: u32) -> Option<&ClassResult> {
        self.entries.get(&key)
    }

    pub fn insert(&mut self, key: u32, result: ClassResult) {
        self.entries.insert(key, result);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop colours previously decided as background.
    pub fn evict_background(&mut self) {
        self.entries.retain(|_, r| r.foreground);
    }

    /// Drop colours previously decided as foreground.
    pub fn evict_foreground(&mut self) {
        self.entries.retain(|_, r| !r.foreground);
    }
}

/// Classify every undecided pixel and snap certain ones.
///
/// After this call every value of `confidence` is exactly 0.0 or 1.0.
/// Colours missing from `cache` are classified in parallel and added.
///
/// # Arguments
/// * `image` - Image with 1-4 channels (height, width, channels)
/// * `confidence` - Confidence matrix (height, width), mutated in place
/// * `classifier` - Signatures to classify against
/// * `cache` - Colour memo, read and extended
pub fn classify_pixels(
    image: ArrayView3<u8>,
    confidence: &mut Array2<f32>,
    classifier: &PixelClassifier,
    cache: &mut ClassificationCache,
) {
    // Unseen colours in first-seen order
    let mut pending: Vec<(u32, (u8, u8, u8))> = Vec::new();
    let mut queued = HashSet::new();
    let mut hits = 0usize;

    for ((y, x), &value) in confidence.indexed_iter() {
        if Certainty::of(value) != Certainty::Unknown {
            continue;
        }
        let rgb = pixel_rgb(&image, y, x);
        let key = color_key(rgb);
        if cache.get(key).is_some() {
            hits += 1;
        } else if queued.insert(key) {
            pending.push((key, rgb));
        }
    }

    let results: Vec<(u32, ClassResult)> = pending
        .par_iter()
        .map(|&(key, (r, g, b))| (key, classifier.classify(&ColorSample::from_rgb(r, g, b))))
        .collect();

    debug!("classify: {} cached hits, {} new colours", hits, results.len());

    for (key, result) in results {
        cache.insert(key, result);
    }

    for ((y, x), value) in confidence.indexed_iter_mut() {
        *value = match Certainty::of(*value) {
            Certainty::Background => 0.0,
            Certainty::Foreground => 1.0,
            Certainty::Unknown => {
                let key = color_key(pixel_rgb(&image, y, x));
                match cache.get(key) {
                    Some(r) if r.foreground => 1.0,
                    _ => 0.0,
                }
            }
        };
    }
}
