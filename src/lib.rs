//! CSV to SageMaker manifest converter
//!
//! This library converts a delimited table of bounding-box annotations (one row
//! per object) into a newline-delimited JSON manifest with one record per image,
//! in the layout SageMaker Ground Truth uses for object detection.

pub mod config;
pub mod conversion;
pub mod dataset;
pub mod error;
pub mod io;
pub mod manifest;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use config::Args;
pub use conversion::{apply_box_geometry, compute_box_geometry};
pub use dataset::{convert_table, process_dataset};
pub use error::{ManifestError, Result};
pub use io::{load_annotations, read_annotations, save_manifest, write_manifest};
pub use manifest::{
    build_manifest_record, build_manifest_records, group_by_filename, ManifestOptions,
};
pub use types::{AnnotationRow, ManifestRecord, Numeric, ProcessingStats};
