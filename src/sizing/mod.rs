//! Directory-size aggregation for the file browser.
//!
//! Directory listings report every subdirectory with its full recursive
//! size. Computing that on each request would re-walk the tree per listing,
//! so the answer is memoized per directory and repaired path-wise when a
//! mutation lands.
//!
//! # Architecture
//!
//! * [`cache`]: the shared concurrent path -> bytes map.
//! * [`aggregate`]: the recursive walk that fills it and the upward
//!   invalidation that repairs it.
//! * [`file_size`]: safe per-file size reads behind a trait seam.

pub mod aggregate;
pub mod cache;
pub mod file_size;

pub use aggregate::{Aggregator, DEFAULT_MAX_DEPTH};
pub use cache::SizeCache;
pub use file_size::{FileSizer, MetadataSizer};
