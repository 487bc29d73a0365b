//! Segmentation pipeline and incremental refinement.

use log::{debug, info};
use ndarray::{Array2, ArrayView3, Zip};
use rayon::prelude::*;

use crate::error::{Result, SioxError};
use crate::filters::morphology::{dilate, erode, normalize, smooth_equal, threshold};
use crate::selection::blob::{keep_large_blobs, keep_largest_blob, BlobStats};

use super::classify::{classify_pixels, ClassificationCache, PixelClassifier};
use super::lab::ColorSample;
use super::params::SioxParams;
use super::signature::Signature;
use super::{
    clustering_dims, color_key, pixel_rgb, Certainty, BLOB_THRESHOLD, CERTAIN_FOREGROUND,
    MULTIBLOB_SIZE_FACTOR,
};

/// Result of a segmentation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationOutcome {
    /// The confidence matrix now holds a binary mask.
    Segmented,
    /// No background signature could be built; the matrix is unchanged.
    NoBackground,
}

/// What changed since the previous run of a [`Segmenter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Refinement {
    /// New certain-foreground hints were added.
    pub add_foreground: bool,
    /// New certain-background hints were added.
    pub add_background: bool,
    /// Clustering limits changed; everything is rebuilt.
    pub change_sensitivity: bool,
}

impl Refinement {
    pub const NONE: Refinement = Refinement {
        add_foreground: false,
        add_background: false,
        change_sensitivity: false,
    };
    pub const ADD_FOREGROUND: Refinement = Refinement {
        add_foreground: true,
        ..Self::NONE
    };
    pub const ADD_BACKGROUND: Refinement = Refinement {
        add_background: true,
        ..Self::NONE
    };
    pub const CHANGE_SENSITIVITY: Refinement = Refinement {
        change_sensitivity: true,
        ..Self::NONE
    };
    pub const RECALCULATE: Refinement = Refinement {
        add_foreground: true,
        add_background: true,
        change_sensitivity: true,
    };
}

/// Detail refinement brush direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushMode {
    /// Pull undecided detail into the foreground.
    Add,
    /// Push foreground detail out.
    Subtract,
}

/// Foreground extractor that keeps signatures and classified colours
/// between runs, so refining the hints does not redo all the work.
#[derive(Debug, Clone)]
pub struct Segmenter {
    params: SioxParams,
    background: Option<Signature>,
    foreground: Option<Signature>,
    cache: ClassificationCache,
}

impl Segmenter {
    pub fn new(params: SioxParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            background: None,
            foreground: None,
            cache: ClassificationCache::new(),
        })
    }

    pub fn params(&self) -> &SioxParams {
        &self.params
    }

    /// Replace the parameters. Pass [`Refinement::CHANGE_SENSITIVITY`] to the
    /// next [`extract`](Self::extract) if the limits changed.
    pub fn set_params(&mut self, params: SioxParams) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn background_signature(&self) -> Option<&Signature> {
        self.background.as_ref()
    }

    pub fn foreground_signature(&self) -> Option<&Signature> {
        self.foreground.as_ref()
    }

    pub fn cache(&self) -> &ClassificationCache {
        &self.cache
    }

    /// Segment `image` guided by `confidence`, writing the mask in place.
    ///
    /// # Arguments
    /// * `image` - Image with 1, 2, 3 or 4 channels (height, width, channels)
    /// * `confidence` - Hints in 0.0-1.0 (height, width); becomes the mask
    /// * `refinement` - What changed since the previous run
    ///
    /// # Returns
    /// [`SegmentationOutcome::NoBackground`] (matrix untouched) when there are
    /// no usable background hints.
    pub fn extract(
        &mut self,
        image: ArrayView3<u8>,
        confidence: &mut Array2<f32>,
        refinement: Refinement,
    ) -> Result<SegmentationOutcome> {
        self.extract_with_progress(image, confidence, refinement, |_| {})
    }

    /// Same as [`extract`](Self::extract), reporting progress in 0.0-1.0.
    pub fn extract_with_progress<F>(
        &mut self,
        image: ArrayView3<u8>,
        confidence: &mut Array2<f32>,
        refinement: Refinement,
        mut progress: F,
    ) -> Result<SegmentationOutcome>
    where
        F: FnMut(f64),
    {
        validate_inputs(&image, confidence)?;
        progress(0.0);

        let mut refinement = refinement;

        if refinement.add_foreground {
            self.cache.evict_background();
        }
        if refinement.add_background {
            self.cache.evict_foreground();
        }
        if refinement.change_sensitivity {
            refinement = Refinement::RECALCULATE;
            self.cache.clear();
        } else {
            refinement.add_background |= self.background.is_none();
            refinement.add_foreground |= self.foreground.is_none();
        }

        let limits = self.params.limits;
        let dims = clustering_dims(image.dim().2);

        if refinement.add_background || refinement.add_foreground {
            let (mut bg_samples, mut fg_samples) = sample_certain(&image, confidence, refinement);
            debug!(
                "siox: {} certain background, {} certain foreground samples",
                bg_samples.len(),
                fg_samples.len()
            );
            progress(0.2);

            if refinement.add_background {
                let signature = Signature::build(&mut bg_samples, &limits, dims);
                if signature.is_empty() {
                    info!("siox: no background signature, leaving mask unchanged");
                    self.background = None;
                    return Ok(SegmentationOutcome::NoBackground);
                }
                self.background = Some(signature);
            }
            progress(0.4);

            if refinement.add_foreground {
                self.foreground = Some(Signature::build(&mut fg_samples, &limits, dims));
            }
        }
        progress(0.5);

        let background = match self.background.as_ref() {
            Some(sig) => sig,
            None => return Ok(SegmentationOutcome::NoBackground),
        };
        let no_foreground = Signature::default();
        let foreground = self.foreground.as_ref().unwrap_or(&no_foreground);
        debug!("siox: signatures bg={} fg={}", background.len(), foreground.len());

        let hints = confidence.mapv(Certainty::of);
        let anchors = hints.mapv(|c| c == Certainty::Foreground);

        let classifier = PixelClassifier::new(background, foreground, &limits);
        classify_pixels(image, confidence, &classifier, &mut self.cache);
        progress(0.8);

        let multiblob = self.params.multiblob;

        // Break weak links, then drop everything but the main object
        smooth_equal(confidence);
        normalize(confidence);
        erode(confidence);
        select_blobs(confidence, multiblob, &anchors);
        progress(0.9);

        for _ in 0..self.params.smoothness {
            smooth_equal(confidence);
        }
        normalize(confidence);
        threshold(confidence, BLOB_THRESHOLD);

        // Remove jitter from smoothing, then restore the eroded border
        select_blobs(confidence, multiblob, &anchors);
        dilate(confidence);

        restore_hints(confidence, &hints);
        progress(1.0);

        Ok(SegmentationOutcome::Segmented)
    }

    /// Detail refinement brush: soft alpha from cached colour distances.
    ///
    /// Works on the square of side `2 * radius` whose top-left corner is
    /// `(x - radius, y - radius)`, clipped to the image. Only colours
    /// classified by an earlier [`extract`](Self::extract) are touched.
    ///
    /// # Arguments
    /// * `threshold` - Alpha below this becomes 0.0. `Add` expects
    ///   (0.0, 1.0], `Subtract` expects [0.0, 1.0)
    ///
    /// # Returns
    /// Number of pixels written
    #[allow(clippy::too_many_arguments)]
    pub fn refine_detail(
        &self,
        image: ArrayView3<u8>,
        confidence: &mut Array2<f32>,
        x: usize,
        y: usize,
        radius: usize,
        mode: BrushMode,
        threshold: f32,
    ) -> Result<usize> {
        validate_inputs(&image, confidence)?;

        if radius == 0 {
            return Err(SioxError::InvalidBrush("radius must be positive".into()));
        }
        let threshold_ok = match mode {
            BrushMode::Add => threshold > 0.0 && threshold <= 1.0,
            BrushMode::Subtract => (0.0..1.0).contains(&threshold),
        };
        if !threshold_ok {
            return Err(SioxError::InvalidBrush(format!(
                "threshold {} out of range for {:?}",
                threshold, mode
            )));
        }

        let side = radius
            .checked_mul(2)
            .ok_or_else(|| SioxError::InvalidBrush(format!("radius {} too large", radius)))?;

        let (height, width) = confidence.dim();
        let x0 = x.saturating_sub(radius);
        let y0 = y.saturating_sub(radius);
        let x1 = x0.saturating_add(side).min(width);
        let y1 = y0.saturating_add(side).min(height);

        let mut written = 0;
        for py in y0..y1 {
            for px in x0..x1 {
                let key = color_key(pixel_rgb(&image, py, px));
                let Some(result) = self.cache.get(key) else {
                    continue;
                };

                let dist_bg = result.bg_dist.sqrt();
                let dist_fg = result.fg_dist.sqrt();
                let value = confidence[[py, px]];

                let alpha = match mode {
                    BrushMode::Add => {
                        if value >= CERTAIN_FOREGROUND {
                            continue;
                        }
                        if dist_fg == 0.0 {
                            1.0
                        } else {
                            (dist_bg / dist_fg).min(1.0)
                        }
                    }
                    BrushMode::Subtract => {
                        if value < CERTAIN_FOREGROUND {
                            continue;
                        }
                        if dist_bg == 0.0 {
                            0.0
                        } else {
                            1.0 - (dist_fg / dist_bg).min(1.0)
                        }
                    }
                };

                confidence[[py, px]] = if alpha < threshold { 0.0 } else { alpha };
                written += 1;
            }
        }

        Ok(written)
    }
}

/// Segment in one shot with fresh signatures.
///
/// # Arguments
/// * `image` - Image with 1, 2, 3 or 4 channels (height, width, channels)
/// * `confidence` - Hints in 0.0-1.0 (height, width); becomes a {0, 1} mask
/// * `params` - Limits, smoothness and blob mode
pub fn segment(
    image: ArrayView3<u8>,
    confidence: &mut Array2<f32>,
    params: &SioxParams,
) -> Result<SegmentationOutcome> {
    let mut segmenter = Segmenter::new(*params)?;
    segmenter.extract(image, confidence, Refinement::RECALCULATE)
}

/// [`segment`] over flat row-major buffers.
///
/// # Arguments
/// * `pixels` - `width * height * channels` bytes
/// * `confidence` - `width * height` values, overwritten with the mask
pub fn segment_raw(
    pixels: &[u8],
    confidence: &mut [f32],
    width: usize,
    height: usize,
    channels: usize,
    params: &SioxParams,
) -> Result<SegmentationOutcome> {
    let area = width.checked_mul(height);
    let expected = area.and_then(|a| a.checked_mul(channels));
    let (area, expected) = match (area, expected) {
        (Some(area), Some(expected)) => (area, expected),
        _ => {
            return Err(SioxError::BufferLength {
                expected: usize::MAX,
                actual: pixels.len(),
            })
        }
    };
    if pixels.len() != expected {
        return Err(SioxError::BufferLength {
            expected,
            actual: pixels.len(),
        });
    }
    if confidence.len() != area {
        return Err(SioxError::BufferLength {
            expected: area,
            actual: confidence.len(),
        });
    }

    let image = ArrayView3::from_shape((height, width, channels), pixels).map_err(|_| {
        SioxError::BufferLength {
            expected,
            actual: pixels.len(),
        }
    })?;
    let mut matrix = Array2::from_shape_vec((height, width), confidence.to_vec()).map_err(|_| {
        SioxError::BufferLength {
            expected: area,
            actual: confidence.len(),
        }
    })?;

    let outcome = segment(image, &mut matrix, params)?;

    for (dst, src) in confidence.iter_mut().zip(matrix.iter()) {
        *dst = *src;
    }
    Ok(outcome)
}

fn validate_inputs(image: &ArrayView3<u8>, confidence: &Array2<f32>) -> Result<()> {
    let (height, width, channels) = image.dim();

    if !(1..=4).contains(&channels) {
        return Err(SioxError::UnsupportedChannels(channels));
    }
    if height == 0 || width == 0 {
        return Err(SioxError::EmptyImage);
    }
    if confidence.dim() != (height, width) {
        return Err(SioxError::DimensionMismatch {
            image: (height, width),
            confidence: confidence.dim(),
        });
    }
    if let Some((index, &value)) = confidence
        .iter()
        .enumerate()
        .find(|(_, v)| !(0.0..=1.0).contains(*v))
    {
        return Err(SioxError::InvalidConfidence { index, value });
    }
    Ok(())
}

/// Lab samples of the certain pixels for the classes being rebuilt.
fn sample_certain(
    image: &ArrayView3<u8>,
    confidence: &Array2<f32>,
    refinement: Refinement,
) -> (Vec<ColorSample>, Vec<ColorSample>) {
    let mut bg = Vec::new();
    let mut fg = Vec::new();

    for ((y, x), &value) in confidence.indexed_iter() {
        match Certainty::of(value) {
            Certainty::Background if refinement.add_background => bg.push(pixel_rgb(image, y, x)),
            Certainty::Foreground if refinement.add_foreground => fg.push(pixel_rgb(image, y, x)),
            _ => {}
        }
    }

    let to_lab = |rgb: Vec<(u8, u8, u8)>| -> Vec<ColorSample> {
        rgb.par_iter()
            .map(|&(r, g, b)| ColorSample::from_rgb(r, g, b))
            .collect()
    };
    (to_lab(bg), to_lab(fg))
}

/// Single-blob mode keeps the largest component only. Multi-blob mode also
/// keeps components containing a certain-foreground hint.
fn select_blobs(matrix: &mut Array2<f32>, multiblob: bool, anchors: &Array2<bool>) -> BlobStats {
    if multiblob {
        keep_large_blobs(matrix, BLOB_THRESHOLD, MULTIBLOB_SIZE_FACTOR, Some(anchors))
    } else {
        keep_largest_blob(matrix, BLOB_THRESHOLD)
    }
}

/// Certain hints always win over the computed mask.
///
/// A certain-foreground hint outside the kept blob comes back as its own
/// component, so the final mask may have more than one component even in
/// single-blob mode.
fn restore_hints(matrix: &mut Array2<f32>, hints: &Array2<Certainty>) {
    Zip::from(matrix).and(hints).for_each(|value, &hint| match hint {
        Certainty::Background => *value = 0.0,
        Certainty::Foreground => *value = 1.0,
        Certainty::Unknown => {}
    });
}
