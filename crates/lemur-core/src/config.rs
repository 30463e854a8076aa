//! Configuration module
//!
//! Settings for SVG uploads, gated document downloads and front-end asset
//! resolution. Values come from the process environment (optionally seeded
//! from a `.env` file); every setting has a default except the token secret,
//! which production requires.

use std::env;
use std::path::PathBuf;

const SVG_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;
const SVG_MAX_DECOMPRESSED_BYTES: usize = 10 * 1024 * 1024;
const DOCUMENT_TOKEN_TTL_SECS: i64 = 3600;
const MIN_PRODUCTION_SECRET_LEN: usize = 32;
const DOCUMENT_DOWNLOAD_PATH: &str = "/members/documents/download";
const ASSET_MANIFEST_PATH: &str = "dist/.vite/manifest.json";
const ASSET_BASE_URL: &str = "/dist";

/// SVG upload limits and policy extension.
#[derive(Clone, Debug)]
pub struct SvgUploadConfig {
    pub max_upload_bytes: usize,
    pub max_decompressed_bytes: usize,
    /// Element names added on top of the default allow-list.
    pub extra_allowed_elements: Vec<String>,
}

impl Default for SvgUploadConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: SVG_MAX_UPLOAD_BYTES,
            max_decompressed_bytes: SVG_MAX_DECOMPRESSED_BYTES,
            extra_allowed_elements: Vec::new(),
        }
    }
}

/// Download token settings.
#[derive(Clone, Debug)]
pub struct DocumentTokenConfig {
    pub secret: Option<String>,
    pub ttl_secs: i64,
    pub download_path: String,
}

impl Default for DocumentTokenConfig {
    fn default() -> Self {
        Self {
            secret: None,
            ttl_secs: DOCUMENT_TOKEN_TTL_SECS,
            download_path: DOCUMENT_DOWNLOAD_PATH.to_string(),
        }
    }
}

/// Vite manifest location.
#[derive(Clone, Debug)]
pub struct AssetConfig {
    pub manifest_path: PathBuf,
    pub base_url: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from(ASSET_MANIFEST_PATH),
            base_url: ASSET_BASE_URL.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub svg: SvgUploadConfig,
    pub tokens: DocumentTokenConfig,
    pub assets: AssetConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let max_upload_bytes = parse_or(&lookup, "SVG_MAX_UPLOAD_BYTES", SVG_MAX_UPLOAD_BYTES);
        let max_decompressed_bytes = parse_or(
            &lookup,
            "SVG_MAX_DECOMPRESSED_BYTES",
            SVG_MAX_DECOMPRESSED_BYTES,
        );

        let extra_allowed_elements = lookup("SVG_EXTRA_ALLOWED_ELEMENTS")
            .map(|s| {
                s.split(',')
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let secret = lookup("DOCUMENT_TOKEN_SECRET").filter(|s| !s.trim().is_empty());
        let ttl_secs = parse_or(&lookup, "DOCUMENT_TOKEN_TTL_SECS", DOCUMENT_TOKEN_TTL_SECS);
        let download_path = lookup("DOCUMENT_DOWNLOAD_PATH")
            .unwrap_or_else(|| DOCUMENT_DOWNLOAD_PATH.to_string());

        let manifest_path = lookup("ASSET_MANIFEST_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(ASSET_MANIFEST_PATH));
        let base_url = lookup("ASSET_BASE_URL").unwrap_or_else(|| ASSET_BASE_URL.to_string());

        let config = Config {
            environment,
            svg: SvgUploadConfig {
                max_upload_bytes,
                max_decompressed_bytes,
                extra_allowed_elements,
            },
            tokens: DocumentTokenConfig {
                secret,
                ttl_secs,
                download_path,
            },
            assets: AssetConfig {
                manifest_path,
                base_url,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.svg.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("SVG_MAX_UPLOAD_BYTES must be greater than 0"));
        }
        if self.svg.max_decompressed_bytes < self.svg.max_upload_bytes {
            return Err(anyhow::anyhow!(
                "SVG_MAX_DECOMPRESSED_BYTES ({}) must not be smaller than SVG_MAX_UPLOAD_BYTES ({})",
                self.svg.max_decompressed_bytes,
                self.svg.max_upload_bytes
            ));
        }
        if self.tokens.ttl_secs <= 0 {
            return Err(anyhow::anyhow!("DOCUMENT_TOKEN_TTL_SECS must be positive"));
        }

        if self.is_production() {
            match self.tokens.secret.as_deref() {
                None => {
                    return Err(anyhow::anyhow!(
                        "DOCUMENT_TOKEN_SECRET is required in production"
                    ))
                }
                Some(secret) if secret.len() < MIN_PRODUCTION_SECRET_LEN => {
                    return Err(anyhow::anyhow!(
                        "DOCUMENT_TOKEN_SECRET must be at least {} bytes in production",
                        MIN_PRODUCTION_SECRET_LEN
                    ))
                }
                Some(_) => {}
            }
        } else if self.tokens.secret.is_none() {
            tracing::warn!("DOCUMENT_TOKEN_SECRET not configured; download tokens are unavailable");
        }

        Ok(())
    }

    /// Secret used to sign download tokens.
    pub fn token_secret(&self) -> Result<&[u8], anyhow::Error> {
        self.tokens
            .secret
            .as_deref()
            .map(str::as_bytes)
            .ok_or_else(|| anyhow::anyhow!("DOCUMENT_TOKEN_SECRET is not set"))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid configuration value, using default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.environment, "development");
        assert!(!config.is_production());
        assert_eq!(config.svg.max_upload_bytes, SVG_MAX_UPLOAD_BYTES);
        assert_eq!(config.svg.max_decompressed_bytes, SVG_MAX_DECOMPRESSED_BYTES);
        assert!(config.svg.extra_allowed_elements.is_empty());
        assert_eq!(config.tokens.ttl_secs, 3600);
        assert!(config.tokens.secret.is_none());
        assert!(config.token_secret().is_err());
        assert_eq!(config.assets.base_url, "/dist");
    }

    #[test]
    fn test_extra_allowed_elements_are_split_and_trimmed() {
        let config =
            config_from(&[("SVG_EXTRA_ALLOWED_ELEMENTS", " animateMotion, ,mpath ")]).unwrap();
        assert_eq!(
            config.svg.extra_allowed_elements,
            vec!["animateMotion".to_string(), "mpath".to_string()]
        );
    }

    #[test]
    fn test_invalid_number_falls_back_to_default() {
        let config = config_from(&[("DOCUMENT_TOKEN_TTL_SECS", "soon")]).unwrap();
        assert_eq!(config.tokens.ttl_secs, 3600);
    }

    #[test]
    fn test_production_requires_secret() {
        let err = config_from(&[("ENVIRONMENT", "production")]).unwrap_err();
        assert!(err.to_string().contains("DOCUMENT_TOKEN_SECRET"));

        let err = config_from(&[("APP_ENV", "prod"), ("DOCUMENT_TOKEN_SECRET", "short")])
            .unwrap_err();
        assert!(err.to_string().contains("at least"));

        let secret = "x".repeat(MIN_PRODUCTION_SECRET_LEN);
        let config = config_from(&[
            ("ENVIRONMENT", "Production"),
            ("DOCUMENT_TOKEN_SECRET", secret.as_str()),
        ])
        .unwrap();
        assert!(config.is_production());
        assert_eq!(config.token_secret().unwrap(), secret.as_bytes());
    }

    #[test]
    fn test_decompressed_limit_must_cover_upload_limit() {
        let err = config_from(&[
            ("SVG_MAX_UPLOAD_BYTES", "2048"),
            ("SVG_MAX_DECOMPRESSED_BYTES", "1024"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("SVG_MAX_DECOMPRESSED_BYTES"));
    }

    #[test]
    fn test_blank_secret_is_treated_as_missing() {
        let config = config_from(&[("DOCUMENT_TOKEN_SECRET", "   ")]).unwrap();
        assert!(config.tokens.secret.is_none());
    }
}
