//! Collection pipeline components.
//!
//! - **discovery**: Find image files in the source directory
//! - **validate**: Size limit and magic-byte checks
//! - **probe**: Read dimensions from image headers
//! - **heic**: libheif bridge (feature `heic`)
//! - **filter**: The small-image predicate
//! - **transfer**: Copy or convert into the target directory
//! - **hash**: BLAKE3 content hashes
//! - **processor**: Runs the stages for one file
//! - **batch**: Bounded worker pool over many files

pub mod batch;
pub mod discovery;
pub mod filter;
pub mod hash;
pub mod heic;
pub mod probe;
pub mod processor;
pub mod transfer;
pub mod validate;

// Re-exports for convenient access
pub use batch::{BatchReport, BatchRunner};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use filter::SizeFilter;
pub use probe::{ImageProbe, ProbedImage};
pub use processor::{ImageProcessor, ProcessOptions};
pub use transfer::{Placement, Transfer};
pub use validate::{Signature, Validator};
