use std::path::Path;

use lemur_core::{download_token, AppError, Config, SvgUploadConfig};
use lemur_processing::svg::{decompress_gzip, is_gzip};
use lemur_processing::{
    get_svg_dimensions, is_valid_svg_content, ProcessedUpload, SvgDimensions, SvgError,
    SvgUploadMetadata, SvgUploadProcessor, UploadedFile,
};
use serde::Serialize;

/// Load and validate configuration from the environment.
pub fn load_config() -> Result<Config, AppError> {
    Config::from_env().map_err(|e| AppError::Configuration(e.to_string()))
}

/// Configured token secret, or a configuration error when it is unset.
pub fn token_secret(config: &Config) -> Result<&[u8], AppError> {
    config
        .token_secret()
        .map_err(|e| AppError::Configuration(e.to_string()))
}

/// Content type declared for a local file, from its extension.
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("svg") => "image/svg+xml",
        Some("svgz") => "image/svg+xml-compressed",
        _ => "application/octet-stream",
    }
}

/// Run the upload pipeline on a local file. With `output`, the sanitized
/// bytes are also written there.
pub fn sanitize_file(
    config: &SvgUploadConfig,
    input: &Path,
    output: Option<&Path>,
) -> Result<ProcessedUpload<SvgUploadMetadata>, AppError> {
    let data = std::fs::read(input)?;
    let filename = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let file = UploadedFile::new(data, filename, content_type_for(input));

    let processed = SvgUploadProcessor::from_config(config).process(file)?;

    if let Some(path) = output {
        std::fs::write(path, &processed.data)?;
        tracing::info!(
            output = %path.display(),
            file_size = processed.file_size,
            "Sanitized SVG written"
        );
    }

    Ok(processed)
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Inspection {
    pub size: usize,
    pub compressed: bool,
    pub valid_signature: bool,
    pub dimensions: Option<SvgDimensions>,
}

/// Look at an SVG without rewriting it.
pub fn inspect_svg(data: &[u8], max_decompressed_bytes: usize) -> Result<Inspection, SvgError> {
    let compressed = is_gzip(data);
    let content = if compressed {
        decompress_gzip(data, max_decompressed_bytes)?
    } else {
        data.to_vec()
    };

    let valid_signature = is_valid_svg_content(&content);
    let dimensions =
        valid_signature.then(|| get_svg_dimensions(&String::from_utf8_lossy(&content)));

    Ok(Inspection {
        size: data.len(),
        compressed,
        valid_signature,
        dimensions,
    })
}

#[derive(Debug, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub path: String,
    pub expires_at: i64,
}

/// Sign a download token with the configured secret.
pub fn issue_token(
    config: &Config,
    document_id: u64,
    user_id: u64,
    ttl_secs: Option<i64>,
    now: i64,
) -> Result<IssuedToken, AppError> {
    let ttl_secs = ttl_secs.unwrap_or(config.tokens.ttl_secs);
    if ttl_secs <= 0 {
        return Err(AppError::InvalidInput(format!(
            "Token TTL must be positive, got {}",
            ttl_secs
        )));
    }

    let secret = token_secret(config)?;
    let token = download_token::generate_at(document_id, user_id, ttl_secs, secret, now);

    Ok(IssuedToken {
        path: download_token::download_path(&config.tokens.download_path, &token),
        expires_at: now.saturating_add(ttl_secs),
        token,
    })
}

/// Initialize tracing for CLI binaries. Logs go to stderr so stdout stays
/// machine-readable.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
