//! SIOX foreground extraction.
//!
//! Given an image and a sparse confidence matrix (certain background,
//! certain foreground, unknown), produces a binary foreground mask:
//!
//! 1. Certain pixels are sampled into Lab colour sets.
//! 2. Each set is reduced to a colour [`Signature`] by two-stage clustering.
//! 3. Unknown pixels are classified by nearest signature.
//! 4. The result is smoothed, eroded and reduced to its largest blob.
//! 5. Further smoothing, a hard threshold, a second blob pass and a final
//!    dilation give the mask.
//!
//! ## Confidence values
//!
//! | Range | Meaning |
//! |-------|---------|
//! | `<= 0.10` | Certain background |
//! | `>= 0.90` | Certain foreground |
//! | otherwise | Unknown, classified |

pub mod classify;
pub mod cluster;
pub mod lab;
pub mod params;
pub mod signature;
pub mod siox;

pub use classify::{ClassResult, ClassificationCache, PixelClassifier};
pub use lab::{lab_to_rgb, rgb_to_lab, ColorSample};
pub use params::SioxParams;
pub use signature::Signature;
pub use siox::{segment, segment_raw, BrushMode, Refinement, SegmentationOutcome, Segmenter};

use ndarray::ArrayView3;

/// Confidence at or below which a pixel is certain background.
pub const CERTAIN_BACKGROUND: f32 = 0.10;

/// Confidence at or above which a pixel is certain foreground.
pub const CERTAIN_FOREGROUND: f32 = 0.90;

/// Minimum share of the population (percent) a stage-two cluster needs.
pub const CLUSTER_SIGNIFICANCE_PERCENT: f32 = 10.0;

/// Confidence at or above which a pixel counts as foreground in blob
/// selection and final thresholding.
pub const BLOB_THRESHOLD: f32 = 0.5;

/// Blobs at least this fraction (1/n) of the largest survive in multi-blob mode.
pub const MULTIBLOB_SIZE_FACTOR: usize = 4;

/// Default per-axis cluster extent (L, a, b).
pub const DEFAULT_LIMITS: [f32; 3] = [0.64, 1.28, 2.56];

/// Default number of extra smoothing passes.
pub const DEFAULT_SMOOTHNESS: u32 = 3;

/// Class of a confidence value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Certainty {
    Background,
    Foreground,
    Unknown,
}

impl Certainty {
    #[inline]
    pub fn of(value: f32) -> Self {
        if value <= CERTAIN_BACKGROUND {
            Certainty::Background
        } else if value >= CERTAIN_FOREGROUND {
            Certainty::Foreground
        } else {
            Certainty::Unknown
        }
    }
}

/// RGB of a pixel; gray channels are replicated and alpha is ignored.
#[inline]
pub(crate) fn pixel_rgb(image: &ArrayView3<u8>, y: usize, x: usize) -> (u8, u8, u8) {
    if image.dim().2 < 3 {
        let v = image[[y, x, 0]];
        (v, v, v)
    } else {
        (image[[y, x, 0]], image[[y, x, 1]], image[[y, x, 2]])
    }
}

/// Packed 0xRRGGBB key for the classification cache.
#[inline]
pub(crate) fn color_key((r, g, b): (u8, u8, u8)) -> u32 {
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Clustering dimensions: L only for single-channel gray, L, a, b otherwise
/// (gray + alpha included).
#[inline]
pub(crate) fn clustering_dims(channels: usize) -> usize {
    if channels == 1 {
        1
    } else {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certainty_boundaries() {
        assert_eq!(Certainty::of(0.0), Certainty::Background);
        assert_eq!(Certainty::of(0.10), Certainty::Background);
        assert_eq!(Certainty::of(0.11), Certainty::Unknown);
        assert_eq!(Certainty::of(0.89), Certainty::Unknown);
        assert_eq!(Certainty::of(0.90), Certainty::Foreground);
        assert_eq!(Certainty::of(1.0), Certainty::Foreground);
    }

    #[test]
    fn test_color_key_packs_rgb() {
        assert_eq!(color_key((0x12, 0x34, 0x56)), 0x123456);
    }

    #[test]
    fn test_only_single_channel_clusters_on_lightness() {
        assert_eq!(clustering_dims(1), 1);
        assert_eq!(clustering_dims(2), 3);
        assert_eq!(clustering_dims(3), 3);
        assert_eq!(clustering_dims(4), 3);
    }
}
