//! SIOX Rust Extensions
//!
//! Foreground extraction (Simple Interactive Object Extraction) implemented
//! in Rust with Python bindings via PyO3 and WASM bindings for JavaScript.
//!
//! ## Image Format
//! The segmenter accepts multiple channel configurations:
//! - **Grayscale**: (height, width, 1) - single channel, clustered on L only
//! - **Gray + alpha**: (height, width, 2) - alpha ignored
//! - **RGB**: (height, width, 3) - 3 color channels
//! - **RGBA**: (height, width, 4) - alpha ignored
//!
//! ## Confidence Matrix
//! A (height, width) `f32` matrix in 0.0-1.0 carries the user's hints and
//! is overwritten with a binary {0.0, 1.0} mask. See [`segmentation`] for
//! the value ranges.

pub mod error;
pub mod filters;
pub mod segmentation;
pub mod selection;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{Result, SioxError};
pub use segmentation::{
    segment, segment_raw, BrushMode, Refinement, SegmentationOutcome, Segmenter, SioxParams,
};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray2, PyReadonlyArray2, PyReadonlyArray3};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::error::SioxError;
    use crate::segmentation::{self, SioxParams};

    fn value_error(err: SioxError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }

    // ========================================================================
    // Segmentation
    // ========================================================================

    /// Extract the foreground of an image.
    ///
    /// # Arguments
    /// * `image` - uint8 array (H, W, C) with C in 1-4
    /// * `confidence` - float32 array (H, W): <=0.1 background, >=0.9
    ///   foreground, anything else unknown
    /// * `limits` - Cluster extent per Lab axis
    /// * `smoothness` - Extra smoothing passes (>= 0)
    /// * `multiblob` - Keep every sizeable blob, not only the largest
    ///
    /// # Returns
    /// float32 mask (H, W) with values 0.0 or 1.0. When no background
    /// signature can be built the confidence is returned unchanged.
    #[pyfunction]
    #[pyo3(signature = (image, confidence, limits=(0.64, 1.28, 2.56), smoothness=3, multiblob=false))]
    pub fn siox_segment<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        confidence: PyReadonlyArray2<'py, f32>,
        limits: (f32, f32, f32),
        smoothness: i64,
        multiblob: bool,
    ) -> PyResult<Bound<'py, PyArray2<f32>>> {
        let params = SioxParams::from_signed([limits.0, limits.1, limits.2], smoothness, multiblob)
            .map_err(value_error)?;

        let mut mask = confidence.as_array().to_owned();
        segmentation::segment(image.as_array(), &mut mask, &params).map_err(value_error)?;
        Ok(mask.into_pyarray(py))
    }

    /// Convert an sRGB colour to CIE Lab (D65).
    #[pyfunction]
    pub fn rgb_to_lab(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
        segmentation::rgb_to_lab(r, g, b)
    }

    /// SIOX Rust extension module
    #[pymodule]
    pub fn siox_rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(siox_segment, m)?)?;
        m.add_function(wrap_pyfunction!(rgb_to_lab, m)?)?;
        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::siox_rust;
