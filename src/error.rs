//! Error type shared by the segmentation entry points.

/// Precondition violations rejected at the API boundary.
///
/// An image that cannot be segmented (no background signature) is not an
/// error; see [`crate::segmentation::SegmentationOutcome::NoBackground`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SioxError {
    #[error("clustering limits must be finite and non-negative, got {0:?}")]
    InvalidLimits([f32; 3]),
    #[error("smoothness must not be negative, got {0}")]
    NegativeSmoothness(i64),
    #[error("confidence matrix is {confidence:?} but image is {image:?} (height, width)")]
    DimensionMismatch {
        image: (usize, usize),
        confidence: (usize, usize),
    },
    #[error("unsupported channel count {0} (expected 1, 2, 3 or 4)")]
    UnsupportedChannels(usize),
    #[error("confidence at index {index} is {value}, expected a value in [0, 1]")]
    InvalidConfidence { index: usize, value: f32 },
    #[error("image has no pixels")]
    EmptyImage,
    #[error("buffer of length {actual} does not match {expected} expected elements")]
    BufferLength { expected: usize, actual: usize },
    #[error("invalid brush: {0}")]
    InvalidBrush(String),
}

pub type Result<T> = std::result::Result<T, SioxError>;
