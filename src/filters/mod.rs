//! Matrix filters used by the segmentation pipeline.
//!
//! All filters work in place on a (height, width) `f32` confidence matrix:
//!
//! | Filter | Effect |
//! |--------|--------|
//! | `smooth` / `smooth_equal` | Weighted 3-tap blur in four directions |
//! | `normalize` | Scale so the maximum becomes 1.0 |
//! | `erode` / `dilate` | 3x3 minimum / maximum |
//! | `threshold` | Hard cut to {0.0, 1.0} |

pub mod morphology;
