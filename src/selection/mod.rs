//! Selection algorithms for mask cleanup.
//!
//! - **Blob selection**: 4-connected component labelling by flood fill,
//!   keeping the largest component (or every component of comparable size)

pub mod blob;

pub use blob::{keep_large_blobs, keep_largest_blob, label_components, BlobStats, LabelField};
