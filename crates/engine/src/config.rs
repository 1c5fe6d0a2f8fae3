//! Aligner configuration.
//!
//! Defaults cover the conventional `apps/` + `packages/` layout. A monorepo
//! can override them with a `.wsalign.toml` at its root:
//!
//! ```toml
//! apps_dir = "applications"
//! packages_dir = "libs"
//! install_timeout_secs = 600
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Name of the optional configuration file at the monorepo root.
pub const CONFIG_FILE: &str = ".wsalign.toml";

/// Tunables for discovery and external processes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlignerConfig {
    /// Member directory whose children are apps.
    pub apps_dir: String,
    /// Member directory whose children are libraries.
    pub packages_dir: String,
    /// Bound on a single registry lookup.
    pub registry_timeout_secs: u64,
    /// Bound on a single install run.
    pub install_timeout_secs: u64,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            apps_dir: "apps".to_string(),
            packages_dir: "packages".to_string(),
            registry_timeout_secs: 10,
            install_timeout_secs: 300,
        }
    }
}

impl AlignerConfig {
    /// Loads `<root>/.wsalign.toml`, or the defaults when the file is absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file exists but cannot be read and
    /// [`Error::Config`] if it is not valid configuration.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILE, root.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| Error::Io {
            source: e,
            path: Some(path.clone()),
            operation: "reading configuration".to_string(),
        })?;

        let config = toml::from_str(&content).map_err(|e| Error::Config {
            source: e,
            path: Some(path.clone()),
        })?;
        tracing::debug!(?config, "Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Registry lookup bound as a [`Duration`].
    #[must_use]
    pub const fn registry_timeout(&self) -> Duration {
        Duration::from_secs(self.registry_timeout_secs)
    }

    /// Install bound as a [`Duration`].
    #[must_use]
    pub const fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.install_timeout_secs)
    }
}
