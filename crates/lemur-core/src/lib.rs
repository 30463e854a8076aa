//! Lemur Core Library
//!
//! This crate provides the error types, configuration, download token codec
//! and asset manifest resolution shared by all Lemur components.

pub mod asset_manifest;
pub mod config;
pub mod download_token;
pub mod error;

// Re-export commonly used types
pub use asset_manifest::{AssetResolver, ManifestState, ResolvedAsset};
pub use config::{AssetConfig, Config, DocumentTokenConfig, SvgUploadConfig};
pub use download_token::{DownloadToken, TokenError};
pub use error::{AppError, ErrorMetadata, LogLevel};
