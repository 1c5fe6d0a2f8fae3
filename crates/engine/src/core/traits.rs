//! Collaborator traits the engine talks to instead of touching I/O directly.

use crate::core::types::Manifest;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Reads and writes workspace manifests.
///
/// Paths are workspace directories; the store decides which file inside the
/// directory holds the manifest.
pub trait ManifestStore {
    /// Whether `dir` contains a manifest file.
    fn contains_manifest(&self, dir: &Path) -> bool;

    /// Reads the manifest of the workspace at `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ManifestNotFound`] when the file is absent and
    /// [`crate::Error::Json`] when its contents are not a valid manifest.
    fn read(&self, dir: &Path) -> Result<Manifest>;

    /// Persists `manifest` for the workspace at `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] when the file cannot be written.
    fn write(&self, dir: &Path, manifest: &Manifest) -> Result<()>;
}

/// Looks up the latest published version of a package.
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    /// Latest version of `package`, or `None` on any lookup failure.
    async fn latest_version(&self, package: &str) -> Option<String>;
}
