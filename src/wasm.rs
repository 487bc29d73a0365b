//! WebAssembly exports for SIOX segmentation.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. Images and
//! confidence matrices travel as flat row-major buffers.

use wasm_bindgen::prelude::*;

use crate::segmentation::{segment_raw, SegmentationOutcome, SioxParams};

// ============================================================================
// Segmentation
// ============================================================================

/// Extract the foreground of an image.
///
/// # Arguments
/// * `data` - Flat pixel bytes (length = width * height * channels)
/// * `confidence` - Flat hints in 0.0-1.0 (length = width * height)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `channels` - 1, 2, 3 or 4
/// * `limit_l`, `limit_a`, `limit_b` - Cluster extent per Lab axis
/// * `smoothness` - Extra smoothing passes (>= 0)
/// * `multiblob` - Keep every sizeable blob, not only the largest
///
/// # Returns
/// Flat mask with values 0.0 or 1.0, or the input confidence unchanged when
/// no background signature could be built
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn siox_segment_wasm(
    data: &[u8],
    confidence: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    limit_l: f32,
    limit_a: f32,
    limit_b: f32,
    smoothness: i32,
    multiblob: bool,
) -> Result<Vec<f32>, JsError> {
    let params = SioxParams::from_signed([limit_l, limit_a, limit_b], smoothness as i64, multiblob)?;

    let mut mask = confidence.to_vec();
    let outcome = segment_raw(data, &mut mask, width, height, channels, &params)?;
    if outcome == SegmentationOutcome::NoBackground {
        log::info!("siox_segment_wasm: no background hints");
    }
    Ok(mask)
}
