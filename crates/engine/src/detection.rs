//! Package manager detection.
//!
//! The manager is inferred from the lockfiles in the monorepo root. When
//! several lockfiles coexist the first match in [`DETECTION_ORDER`] wins;
//! without any lockfile the installer falls back to npm.
//!
//! ```no_run
//! use wsalign_engine::detection::detect_package_manager;
//! use std::path::Path;
//!
//! let manager = detect_package_manager(Path::new("/path/to/monorepo"));
//! println!("Installing with {}", manager);
//! ```

use crate::core::types::PackageManager;
use std::path::{Path, PathBuf};

/// Managers in the order their lockfiles are checked.
pub const DETECTION_ORDER: [PackageManager; 3] = [
    PackageManager::Bun,
    PackageManager::Yarn,
    PackageManager::Pnpm,
];

/// Detects the package manager used at `root`.
#[must_use]
pub fn detect_package_manager(root: &Path) -> PackageManager {
    match find_lockfile(root) {
        Some((manager, lockfile)) => {
            tracing::debug!("Detected {} from {}", manager, lockfile.display());
            manager
        }
        None => {
            tracing::debug!(
                "No lockfile found in {}, defaulting to npm",
                root.display()
            );
            PackageManager::Npm
        }
    }
}

/// First lockfile under `root` that identifies a non-default manager.
fn find_lockfile(root: &Path) -> Option<(PackageManager, PathBuf)> {
    DETECTION_ORDER.into_iter().find_map(|manager| {
        manager
            .lockfile_names()
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
            .map(|path| (manager, path))
    })
}
