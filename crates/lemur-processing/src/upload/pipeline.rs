//! Upload pipeline: validate → sanitize → extract metadata.
//!
//! Validation is delegated to [`MediaValidator`] so every declared-metadata
//! rule lives in one place. Metadata is read from the sanitized bytes, never
//! from the raw upload.

use super::traits::UploadProcessor;
use super::types::{ProcessedUpload, UploadedFile};
use crate::validator::MediaValidator;

/// Reduce a client filename to a safe basename.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX: usize = 255;
    let path = std::path::Path::new(filename);
    let base = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    if base.contains("..") {
        return "invalid_filename".to_string();
    }
    let s: String = base
        .chars()
        .take(MAX)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.trim().is_empty() || s.len() < 3 {
        "file".to_string()
    } else {
        s
    }
}

/// Run the upload pipeline: validate → sanitize → extract metadata.
pub fn upload_pipeline<P>(
    file: UploadedFile,
    validator: &MediaValidator,
    processor: &P,
) -> Result<ProcessedUpload<P::Metadata>, P::Error>
where
    P: UploadProcessor + ?Sized,
{
    validator.validate_all(&file.original_filename, &file.content_type, file.data.len())?;

    let UploadedFile {
        data,
        original_filename,
        content_type,
    } = file;

    let data = processor.sanitize(data)?;
    let metadata = processor.extract_metadata(&data)?;
    let safe_filename = sanitize_filename(&original_filename);

    tracing::debug!(
        original_filename = %original_filename,
        safe_filename = %safe_filename,
        file_size = data.len(),
        "Upload processed"
    );

    Ok(ProcessedUpload {
        file_size: data.len(),
        data,
        original_filename,
        safe_filename,
        content_type,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::ValidationError;

    struct UppercaseProcessor;

    impl UploadProcessor for UppercaseProcessor {
        type Metadata = usize;
        type Error = ValidationError;

        fn sanitize(&self, data: Vec<u8>) -> Result<Vec<u8>, ValidationError> {
            Ok(data.to_ascii_uppercase())
        }

        fn extract_metadata(&self, data: &[u8]) -> Result<usize, ValidationError> {
            Ok(data.iter().filter(|b| b.is_ascii_uppercase()).count())
        }
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("logo.svg"), "logo.svg");
        assert_eq!(sanitize_filename("/var/www/uploads/club logo.svg"), "club_logo.svg");
        assert_eq!(sanitize_filename("..svg"), "invalid_filename");
        assert_eq!(sanitize_filename("a"), "file");
        assert_eq!(sanitize_filename("<svg>.svg"), "_svg_.svg");
    }

    #[test]
    fn test_pipeline_validates_before_processing() {
        let validator = MediaValidator::for_svg(16);
        let file = UploadedFile::new(b"<svg/>".to_vec(), "shell.php", "image/svg+xml");
        assert!(matches!(
            upload_pipeline(file, &validator, &UppercaseProcessor),
            Err(ValidationError::InvalidExtension { .. })
        ));

        let file = UploadedFile::new(vec![b'a'; 17], "big.svg", "image/svg+xml");
        assert!(matches!(
            upload_pipeline(file, &validator, &UppercaseProcessor),
            Err(ValidationError::FileTooLarge { size: 17, max: 16 })
        ));
    }

    #[test]
    fn test_pipeline_metadata_reads_sanitized_data() {
        let validator = MediaValidator::for_svg(64);
        let file = UploadedFile::new(b"<svg/>".to_vec(), "my logo.svg", "image/svg+xml");
        let processed = upload_pipeline(file, &validator, &UppercaseProcessor).unwrap();

        assert_eq!(processed.data, b"<SVG/>");
        assert_eq!(processed.metadata, 3);
        assert_eq!(processed.file_size, 6);
        assert_eq!(processed.safe_filename, "my_logo.svg");
        assert_eq!(processed.original_filename, "my logo.svg");
    }
}
