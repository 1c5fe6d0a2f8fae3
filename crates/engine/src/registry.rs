//! npm registry lookups.

use crate::core::RegistryLookup;
use crate::installer::run_command;
use async_trait::async_trait;
use std::time::Duration;

/// Default bound for a registry lookup.
pub const DEFAULT_REGISTRY_TIMEOUT: Duration = Duration::from_secs(10);

/// Queries the registry through `npm view <package> version`.
///
/// Lookups fail soft: a non-zero exit, empty output, spawn error or timeout
/// all yield `None`.
#[derive(Debug, Clone)]
pub struct NpmRegistry {
    program: String,
    timeout: Duration,
}

impl NpmRegistry {
    /// Registry client bounded by `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: "npm".to_string(),
            timeout,
        }
    }

    /// Uses `program` instead of `npm`. The `view <package> version`
    /// arguments are kept.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for NpmRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_TIMEOUT)
    }
}

#[async_trait]
impl RegistryLookup for NpmRegistry {
    async fn latest_version(&self, package: &str) -> Option<String> {
        let package = package.trim();
        if package.is_empty() {
            return None;
        }

        let args = vec![
            "view".to_string(),
            package.to_string(),
            "version".to_string(),
        ];
        match run_command(&self.program, &args, None, self.timeout).await {
            Ok(output) if output.success => {
                let version = output.stdout.trim();
                if version.is_empty() {
                    tracing::debug!("Registry returned no version for {}", package);
                    None
                } else {
                    tracing::debug!("Latest {} is {}", package, version);
                    Some(version.to_string())
                }
            }
            Ok(output) => {
                tracing::debug!(
                    "Registry lookup for {} exited with {:?}",
                    package,
                    output.code
                );
                None
            }
            Err(e) => {
                tracing::warn!("Registry lookup for {} failed: {}", package, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_fails_soft() {
        let registry = NpmRegistry::new(Duration::from_secs(1))
            .with_program("wsalign-definitely-not-npm");
        assert_eq!(registry.latest_version("lodash").await, None);
    }

    #[test]
    fn test_empty_package_is_not_looked_up() {
        let registry = NpmRegistry::default();
        assert_eq!(tokio_test::block_on(registry.latest_version("  ")), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_is_trimmed() {
        // `echo view lodash version` stands in for the registry response.
        let registry = NpmRegistry::new(Duration::from_secs(5)).with_program("echo");
        assert_eq!(
            registry.latest_version("lodash").await,
            Some("view lodash version".to_string())
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_fails_soft() {
        let registry = NpmRegistry::new(Duration::from_secs(5)).with_program("false");
        assert_eq!(registry.latest_version("lodash").await, None);
    }
}
