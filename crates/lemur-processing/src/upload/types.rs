//! Types for the upload pipeline.

/// Raw upload as received from the client.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub data: Vec<u8>,
    pub original_filename: String,
    pub content_type: String,
}

impl UploadedFile {
    pub fn new(
        data: Vec<u8>,
        original_filename: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            data,
            original_filename: original_filename.into(),
            content_type: content_type.into(),
        }
    }
}

/// Data produced by the upload pipeline, ready to be stored.
#[derive(Clone, Debug)]
pub struct ProcessedUpload<M> {
    pub data: Vec<u8>,
    pub original_filename: String,
    pub safe_filename: String,
    pub content_type: String,
    pub file_size: usize,
    pub metadata: M,
}
