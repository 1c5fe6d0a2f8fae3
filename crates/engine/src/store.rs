//! Filesystem-backed [`ManifestStore`] for `package.json` files.

use crate::core::{Manifest, ManifestStore};
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of a workspace manifest.
pub const MANIFEST_FILE: &str = "package.json";

/// Reads and writes `package.json` files on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonManifestStore;

impl JsonManifestStore {
    /// Path of the manifest inside `dir`.
    #[must_use]
    pub fn manifest_path(dir: &Path) -> PathBuf {
        dir.join(MANIFEST_FILE)
    }
}

impl ManifestStore for JsonManifestStore {
    fn contains_manifest(&self, dir: &Path) -> bool {
        Self::manifest_path(dir).is_file()
    }

    fn read(&self, dir: &Path) -> Result<Manifest> {
        let path = Self::manifest_path(dir);
        if !path.is_file() {
            return Err(Error::ManifestNotFound { path });
        }

        let content = fs::read_to_string(&path).map_err(|e| Error::Io {
            source: e,
            path: Some(path.clone()),
            operation: "reading manifest".to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| Error::Json {
            source: e,
            path: Some(path),
        })
    }

    fn write(&self, dir: &Path, manifest: &Manifest) -> Result<()> {
        let path = Self::manifest_path(dir);
        let content = manifest.to_pretty_json()?;

        fs::write(&path, content).map_err(|e| Error::Io {
            source: e,
            path: Some(path),
            operation: "writing manifest".to_string(),
        })
    }
}
