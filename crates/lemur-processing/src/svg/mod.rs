//! SVG upload sanitization.
//!
//! Untrusted SVG goes through, in order: the signature pre-filter, a textual
//! pass removing DOCTYPE/ENTITY/CDATA/processing instructions, a parse that
//! never resolves entities, and an allow-list walk over the tree. SVGZ input
//! is decompressed under a hard size ceiling first.

mod attributes;
mod dimensions;
mod document;
mod gzip;
mod policy;
mod sanitizer;
mod signature;

use std::io;

use lemur_core::AppError;

use crate::validator::ValidationError;

pub use attributes::{
    is_allowed_href, is_dangerous_url, sanitize_attributes, sanitize_style_attribute,
};
pub use dimensions::{get_svg_dimensions, SvgDimensions, FALLBACK_DIMENSIONS};
pub use document::{Attribute, Element, Node, SvgDocument, MAX_ELEMENT_DEPTH, XML_DECLARATION};
pub use gzip::{
    compress_gzip, decompress_gzip, is_gzip, read_bounded, read_gzipped_file, GZIP_CHUNK_SIZE,
};
pub use policy::{
    SanitizationPolicy, DANGEROUS_URL_SCHEMES, DEFAULT_ALLOWED_ELEMENTS, DENIED_ELEMENTS,
    EVENT_HANDLER_ATTRIBUTES,
};
pub use sanitizer::{
    sanitize, sanitize_node, sanitize_with_report, strip_dangerous_markup, SanitizeReport,
};
pub use signature::is_valid_svg_content;

/// Why an SVG upload was refused.
#[derive(Debug, thiserror::Error)]
pub enum SvgError {
    #[error("SVG is not well-formed XML")]
    NotXml,

    #[error("Root element is not <svg>")]
    NotSvgRoot,

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error("Failed to read SVG data: {0}")]
    Read(#[from] io::Error),

    #[error("File content does not look like SVG")]
    InvalidSignature,

    #[error("Upload rejected: {0}")]
    Validation(ValidationError),
}

impl From<ValidationError> for SvgError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooLarge { size, max } => SvgError::TooLarge { size, max },
            other => SvgError::Validation(other),
        }
    }
}

impl From<SvgError> for AppError {
    fn from(err: SvgError) -> Self {
        match err {
            SvgError::NotXml | SvgError::NotSvgRoot | SvgError::InvalidSignature => {
                AppError::InvalidSvg(err.to_string())
            }
            SvgError::TooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            SvgError::Read(_) => AppError::InvalidSvg(err.to_string()),
            SvgError::Validation(
                e @ (ValidationError::InvalidExtension { .. }
                | ValidationError::InvalidContentType { .. }),
            ) => AppError::UnsupportedMediaType(e.to_string()),
            SvgError::Validation(e) => AppError::InvalidInput(e.to_string()),
        }
    }
}
