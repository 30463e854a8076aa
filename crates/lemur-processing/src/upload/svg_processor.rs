//! SVG upload processor: signature check, bounded SVGZ inflate, tree sanitize.

use lemur_core::SvgUploadConfig;
use serde::Serialize;

use super::pipeline::upload_pipeline;
use super::traits::UploadProcessor;
use super::types::{ProcessedUpload, UploadedFile};
use crate::svg::{
    compress_gzip, decompress_gzip, get_svg_dimensions, is_gzip, is_valid_svg_content,
    sanitize_with_report, SanitizationPolicy, SvgDimensions, SvgError,
};
use crate::validator::MediaValidator;

/// SVG metadata from upload pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SvgUploadMetadata {
    pub dimensions: SvgDimensions,
    pub compressed: bool,
}

/// SVG upload processor.
///
/// Gzip input is detected by magic bytes, not by extension. Compressed uploads
/// are stored compressed again after sanitization.
#[derive(Debug, Clone)]
pub struct SvgUploadProcessor {
    policy: SanitizationPolicy,
    validator: MediaValidator,
    max_decompressed_bytes: usize,
}

impl SvgUploadProcessor {
    pub fn new(
        policy: SanitizationPolicy,
        validator: MediaValidator,
        max_decompressed_bytes: usize,
    ) -> Self {
        Self {
            policy,
            validator,
            max_decompressed_bytes,
        }
    }

    pub fn from_config(config: &SvgUploadConfig) -> Self {
        Self::new(
            SanitizationPolicy::from_config(config),
            MediaValidator::for_svg(config.max_upload_bytes),
            config.max_decompressed_bytes,
        )
    }

    /// Validate, sanitize and measure one upload.
    pub fn process(
        &self,
        file: UploadedFile,
    ) -> Result<ProcessedUpload<SvgUploadMetadata>, SvgError> {
        upload_pipeline(file, &self.validator, self)
    }

    fn inflate(&self, data: &[u8]) -> Result<Vec<u8>, SvgError> {
        decompress_gzip(data, self.max_decompressed_bytes)
    }
}

impl UploadProcessor for SvgUploadProcessor {
    type Metadata = SvgUploadMetadata;
    type Error = SvgError;

    fn sanitize(&self, data: Vec<u8>) -> Result<Vec<u8>, SvgError> {
        let compressed = is_gzip(&data);
        let content = if compressed {
            self.inflate(&data)?
        } else {
            data
        };

        if !is_valid_svg_content(&content) {
            tracing::warn!(
                size = content.len(),
                compressed,
                "Rejected upload without SVG signature"
            );
            return Err(SvgError::InvalidSignature);
        }

        let (document, report) = sanitize_with_report(&content, &self.policy)?;
        if report.is_clean() {
            tracing::debug!(compressed, "SVG upload sanitized, nothing removed");
        } else {
            tracing::info!(
                removed_elements = report.removed_elements,
                removed_attributes = report.removed_attributes,
                removed_nodes = report.removed_nodes,
                compressed,
                "SVG upload sanitized"
            );
        }

        let output = document.into_bytes();
        if compressed {
            compress_gzip(&output)
        } else {
            Ok(output)
        }
    }

    fn extract_metadata(&self, data: &[u8]) -> Result<SvgUploadMetadata, SvgError> {
        let compressed = is_gzip(data);
        let dimensions = if compressed {
            let content = self.inflate(data)?;
            get_svg_dimensions(&String::from_utf8_lossy(&content))
        } else {
            get_svg_dimensions(&String::from_utf8_lossy(data))
        };

        Ok(SvgUploadMetadata {
            dimensions,
            compressed,
        })
    }
}
