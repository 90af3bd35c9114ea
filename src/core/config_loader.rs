//! Configuration loading for lockstep-publisher
//!
//! Loads and validates the workspace configuration file.

use crate::core::config::WorkspaceConfig;
use crate::core::error::ReleaseError;
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

/// Workspace configuration file name
pub const CONFIG_FILE: &str = ".lockstep-publisher.yml";

/// Loader for the workspace configuration file
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate the configuration from the workspace root
    ///
    /// # Arguments
    ///
    /// * `workspace_root` - Directory containing `.lockstep-publisher.yml`
    pub async fn load(workspace_root: &Path) -> Result<WorkspaceConfig, ReleaseError> {
        let path = workspace_root.join(CONFIG_FILE);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ReleaseError::ConfigNotFound { path });
            }
            Err(e) => {
                return Err(ReleaseError::ConfigInvalid {
                    message: e.to_string(),
                });
            }
        };

        let config: WorkspaceConfig =
            serde_yaml::from_str(&content).map_err(|e| ReleaseError::ConfigInvalid {
                message: e.to_string(),
            })?;

        Self::validate(&config)?;

        Ok(config)
    }

    /// Validate the declared package set
    fn validate(config: &WorkspaceConfig) -> Result<(), ReleaseError> {
        if config.packages.is_empty() {
            return Err(ReleaseError::ConfigInvalid {
                message: "packagesが空です".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for package in &config.packages {
            if package.name.trim().is_empty() {
                return Err(ReleaseError::ConfigInvalid {
                    message: "パッケージ名が空です".to_string(),
                });
            }
            if !seen.insert(package.name.as_str()) {
                return Err(ReleaseError::DuplicatePackage {
                    name: package.name.clone(),
                });
            }
        }

        Ok(())
    }

    /// Starter configuration written by the `init` subcommand
    pub fn starter_template() -> &'static str {
        r#"# lockstep-publisher workspace configuration
version: "1.0"

# Directory containing one directory per package (under the publish scope)
packagesDir: packages

# npm access level used for every publish
access: public

# Registry queried for the previously published version
registryUrl: "https://registry.npmjs.org"

# Packages released in lockstep. The first entry is the version
# reference: its published version seeds the next version number.
# Dependencies must name other packages from this list.
packages:
  - name: example-api
    dependencies: []
  - name: example-client
    dependencies: [example-api]
"#
    }
}
