//! Lemur upload processing
//!
//! SVG sanitization, bounded SVGZ handling and the upload pipeline that
//! ties them to declared-metadata validation.

pub mod svg;
pub mod upload;
pub mod validator;

pub use svg::{
    get_svg_dimensions, is_valid_svg_content, sanitize, sanitize_with_report,
    SanitizationPolicy, SanitizeReport, SvgDimensions, SvgDocument, SvgError,
};
pub use upload::{
    sanitize_filename, upload_pipeline, ProcessedUpload, SvgUploadMetadata, SvgUploadProcessor,
    UploadProcessor, UploadedFile,
};
pub use validator::{MediaValidator, ValidationError};
