//! Traits for the upload pipeline.

use crate::validator::ValidationError;

/// Media-specific processing (sanitize, extract metadata).
pub trait UploadProcessor: Send + Sync {
    type Metadata: Send;
    type Error: From<ValidationError>;

    /// Rewrite the upload into its stored form.
    fn sanitize(&self, data: Vec<u8>) -> Result<Vec<u8>, Self::Error>;

    /// Metadata of already-sanitized data.
    fn extract_metadata(&self, data: &[u8]) -> Result<Self::Metadata, Self::Error>;
}
