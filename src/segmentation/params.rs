//! Segmentation parameters.

use crate::error::{Result, SioxError};

use super::{DEFAULT_LIMITS, DEFAULT_SMOOTHNESS};

/// Tunables for one segmentation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SioxParams {
    /// Per-axis cluster extent (L, a, b). Smaller values give more,
    /// tighter clusters.
    pub limits: [f32; 3],
    /// Extra smoothing passes before the final threshold.
    pub smoothness: u32,
    /// Keep every sizeable blob instead of only the largest.
    pub multiblob: bool,
}

impl Default for SioxParams {
    fn default() -> Self {
        Self {
            limits: DEFAULT_LIMITS,
            smoothness: DEFAULT_SMOOTHNESS,
            multiblob: false,
        }
    }
}

impl SioxParams {
    pub fn new(limits: [f32; 3], smoothness: u32) -> Self {
        Self {
            limits,
            smoothness,
            multiblob: false,
        }
    }

    pub fn with_limits(mut self, limits: [f32; 3]) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_smoothness(mut self, smoothness: u32) -> Self {
        self.smoothness = smoothness;
        self
    }

    pub fn with_multiblob(mut self, multiblob: bool) -> Self {
        self.multiblob = multiblob;
        self
    }

    /// Build from a signed smoothness as received from bindings.
    pub fn from_signed(limits: [f32; 3], smoothness: i64, multiblob: bool) -> Result<Self> {
        if smoothness < 0 {
            return Err(SioxError::NegativeSmoothness(smoothness));
        }
        let params = Self {
            limits,
            smoothness: u32::try_from(smoothness).unwrap_or(u32::MAX),
            multiblob,
        };
        params.validate()?;
        Ok(params)
    }

    /// Reject non-finite or negative limits.
    pub fn validate(&self) -> Result<()> {
        if self.limits.iter().any(|l| !l.is_finite() || *l < 0.0) {
            return Err(SioxError::InvalidLimits(self.limits));
        }
        Ok(())
    }
}
