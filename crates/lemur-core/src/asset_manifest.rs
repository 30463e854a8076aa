//! Vite build manifest lookup.
//!
//! The manifest is read lazily on first use. A failed read is remembered so
//! a missing build does not hit the disk on every page render.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::AssetConfig;

/// One entry of `.vite/manifest.json`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ManifestChunk {
    pub file: String,
    #[serde(default)]
    pub css: Vec<String>,
    #[serde(default)]
    pub imports: Vec<String>,
}

pub type AssetManifest = HashMap<String, ManifestChunk>;

/// Memoized manifest state.
#[derive(Debug, Default)]
pub enum ManifestState {
    #[default]
    Uninitialized,
    LoadFailed,
    Loaded(AssetManifest),
}

/// Public URLs for an entry point.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ResolvedAsset {
    pub script: String,
    pub styles: Vec<String>,
}

pub struct AssetResolver {
    manifest_path: PathBuf,
    base_url: String,
    state: ManifestState,
}

impl AssetResolver {
    pub fn new(manifest_path: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            base_url: base_url.into(),
            state: ManifestState::Uninitialized,
        }
    }

    pub fn from_config(config: &AssetConfig) -> Self {
        Self::new(config.manifest_path.clone(), config.base_url.clone())
    }

    pub fn state(&self) -> &ManifestState {
        &self.state
    }

    /// Loaded manifest, reading it on the first call only.
    pub fn manifest(&mut self) -> Option<&AssetManifest> {
        if matches!(self.state, ManifestState::Uninitialized) {
            self.state = match load_manifest(&self.manifest_path) {
                Ok(manifest) => {
                    tracing::debug!(
                        path = %self.manifest_path.display(),
                        entries = manifest.len(),
                        "Loaded asset manifest"
                    );
                    ManifestState::Loaded(manifest)
                }
                Err(e) => {
                    tracing::warn!(
                        path = %self.manifest_path.display(),
                        error = %e,
                        "Failed to load asset manifest"
                    );
                    ManifestState::LoadFailed
                }
            };
        }

        match &self.state {
            ManifestState::Loaded(manifest) => Some(manifest),
            _ => None,
        }
    }

    /// Script and stylesheet URLs for `entry` (e.g. `src/js/main.js`).
    ///
    /// Stylesheets of imported chunks are included, imports first, each once.
    pub fn resolve(&mut self, entry: &str) -> Option<ResolvedAsset> {
        let base = self.base_url.trim_end_matches('/').to_string();
        let manifest = self.manifest()?;
        let chunk = manifest.get(entry)?;

        let mut visited = HashSet::new();
        let mut css = Vec::new();
        collect_css(manifest, entry, &mut visited, &mut css);

        Some(ResolvedAsset {
            script: format!("{}/{}", base, chunk.file),
            styles: css
                .into_iter()
                .map(|file| format!("{}/{}", base, file))
                .collect(),
        })
    }
}

fn collect_css<'a>(
    manifest: &'a AssetManifest,
    key: &'a str,
    visited: &mut HashSet<&'a str>,
    css: &mut Vec<&'a str>,
) {
    if !visited.insert(key) {
        return;
    }
    let Some(chunk) = manifest.get(key) else {
        return;
    };

    for import in &chunk.imports {
        collect_css(manifest, import, visited, css);
    }
    for file in &chunk.css {
        if !css.contains(&file.as_str()) {
            css.push(file.as_str());
        }
    }
}

fn load_manifest(path: &Path) -> Result<AssetManifest, anyhow::Error> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
