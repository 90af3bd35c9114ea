//! npm registry client
//!
//! The identity check and publishing go through the npm CLI, so npm's
//! own login session stays authoritative. Version queries go straight
//! to the registry HTTP API (packument `dist-tags`), retried on
//! transient network failures.

use crate::core::config::ReleaseChannel;
use crate::core::error::ReleaseError;
use crate::core::retry::RetryManager;
use crate::core::traits::{PublishOutcome, RegistryClient};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

// Windows-specific: npm is a .cmd file, not an .exe
#[cfg(target_os = "windows")]
const NPM: &str = "npm.cmd";

#[cfg(not(target_os = "windows"))]
const NPM: &str = "npm";

/// Registry packument subset: only the dist-tags are consumed
#[derive(Debug, Deserialize)]
struct RegistryPackument {
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,
}

/// npm implementation of [`RegistryClient`]
pub struct NpmRegistry {
    registry_url: String,
    http: reqwest::Client,
    retry: RetryManager,
}

impl NpmRegistry {
    pub fn new<S: Into<String>>(registry_url: S) -> Self {
        Self {
            registry_url: registry_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            retry: RetryManager::default(),
        }
    }

    /// Packument URL; the scope separator must be %2F-encoded
    fn packument_url(&self, scoped_name: &str) -> String {
        format!("{}/{}", self.registry_url, scoped_name.replace('/', "%2F"))
    }

    async fn fetch_packument(
        &self,
        scoped_name: &str,
    ) -> anyhow::Result<Option<RegistryPackument>> {
        let url = self.packument_url(scoped_name);
        let response =
            self.http
                .get(&url)
                .send()
                .await
                .map_err(|e| ReleaseError::RegistryQuery {
                    message: e.to_string(),
                })?;

        // Never published is a regular answer, not an error
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(ReleaseError::RegistryQuery {
                message: format!("{} returned HTTP {}", url, response.status()),
            }
            .into());
        }

        let packument = response.json::<RegistryPackument>().await.map_err(|e| {
            ReleaseError::RegistryQuery {
                message: e.to_string(),
            }
        })?;

        Ok(Some(packument))
    }
}

#[async_trait]
impl RegistryClient for NpmRegistry {
    async fn authenticated_user(&self) -> anyhow::Result<Option<String>> {
        let output = Command::new(NPM)
            .arg("whoami")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ReleaseError::CommandFailed {
                command: "npm whoami".to_string(),
                message: e.to_string(),
            })?;

        // npm exits non-zero when there is no login session
        if !output.status.success() {
            return Ok(None);
        }

        let user = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(if user.is_empty() { None } else { Some(user) })
    }

    async fn published_version(
        &self,
        scoped_name: &str,
        channel: ReleaseChannel,
    ) -> anyhow::Result<Option<String>> {
        let packument = self
            .retry
            .retry(|| self.fetch_packument(scoped_name))
            .await?;

        Ok(packument.and_then(|p| p.dist_tags.get(channel.as_str()).cloned()))
    }

    async fn publish(
        &self,
        package_dir: &Path,
        scoped_name: &str,
        channel: ReleaseChannel,
        access: &str,
        dry_run: bool,
    ) -> PublishOutcome {
        let mut args = vec![
            "publish".to_string(),
            format!("--access={}", access),
            format!("--tag={}", channel),
        ];
        if dry_run {
            args.push("--dry-run".to_string());
        }

        let result = Command::new(NPM)
            .args(&args)
            .current_dir(package_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();

                if output.status.success() {
                    PublishOutcome::succeeded(scoped_name, stdout + &stderr)
                } else {
                    let error = if stderr.trim().is_empty() { stdout } else { stderr };
                    PublishOutcome::failed(scoped_name, error)
                }
            }
            Err(e) => PublishOutcome::failed(scoped_name, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packument_url_encodes_scope_separator() {
        let registry = NpmRegistry::new("https://registry.npmjs.org");
        assert_eq!(
            registry.packument_url("@alice/tstuto-api"),
            "https://registry.npmjs.org/@alice%2Ftstuto-api"
        );
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        let registry = NpmRegistry::new("https://registry.example.com/");
        assert_eq!(
            registry.packument_url("@alice/tstuto-api"),
            "https://registry.example.com/@alice%2Ftstuto-api"
        );
    }

    #[test]
    fn test_packument_parse_reads_dist_tags() {
        let json = r#"{
            "name": "@alice/tstuto-api",
            "dist-tags": {
                "latest": "1.2.3",
                "next": "1.3.0-next.0"
            },
            "versions": {}
        }"#;

        let packument: RegistryPackument = serde_json::from_str(json).unwrap();
        assert_eq!(
            packument.dist_tags.get("next").map(String::as_str),
            Some("1.3.0-next.0")
        );
        assert_eq!(
            packument.dist_tags.get("latest").map(String::as_str),
            Some("1.2.3")
        );
    }

    #[test]
    fn test_packument_parse_without_dist_tags() {
        let packument: RegistryPackument =
            serde_json::from_str(r#"{"name": "@alice/tstuto-api"}"#).unwrap();
        assert!(packument.dist_tags.is_empty());
    }
}
