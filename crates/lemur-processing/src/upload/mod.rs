//! Upload pipeline: validate → sanitize → extract metadata.

pub mod svg_processor;
pub mod traits;
pub mod types;

mod pipeline;

pub use pipeline::{sanitize_filename, upload_pipeline};
pub use svg_processor::{SvgUploadMetadata, SvgUploadProcessor};
pub use traits::UploadProcessor;
pub use types::{ProcessedUpload, UploadedFile};
