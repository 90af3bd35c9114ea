//! Core traits for the release workflow
//!
//! These are the orchestrator's seams: the registry and the operator
//! prompts are injected as trait objects so the pipeline can be tested
//! without a terminal or a network.

use crate::core::config::{ReleaseChannel, ReleaseConfig};
use async_trait::async_trait;
use semver::Version;
use std::path::Path;

/// Result of a single package publish attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Scoped package name the attempt was made for
    pub package: String,
    pub success: bool,
    /// Captured publish output (stdout + stderr) on success
    pub output: Option<String>,
    /// Failure description on error
    pub error: Option<String>,
}

impl PublishOutcome {
    pub fn succeeded<S: Into<String>>(package: S, output: String) -> Self {
        Self {
            package: package.into(),
            success: true,
            output: Some(output),
            error: None,
        }
    }

    pub fn failed<S: Into<String>>(package: S, error: String) -> Self {
        Self {
            package: package.into(),
            success: false,
            output: None,
            error: Some(error),
        }
    }
}

/// Registry-side operations used by the orchestrator
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// The authenticated registry identity, or `None` when not logged in
    async fn authenticated_user(&self) -> anyhow::Result<Option<String>>;

    /// The version currently published for `scoped_name` under `channel`,
    /// or `None` when the package or channel tag does not exist yet
    async fn published_version(
        &self,
        scoped_name: &str,
        channel: ReleaseChannel,
    ) -> anyhow::Result<Option<String>>;

    /// Publish the package in `package_dir` under the channel tag
    ///
    /// Failures are folded into the outcome instead of an `Err` so the
    /// batch continues with the remaining packages.
    async fn publish(
        &self,
        package_dir: &Path,
        scoped_name: &str,
        channel: ReleaseChannel,
        access: &str,
        dry_run: bool,
    ) -> PublishOutcome;
}

/// Operator decisions, decoupled from the terminal
pub trait ReleasePrompter: Send + Sync {
    /// Collect channel, release message and release type
    fn configure(&self) -> anyhow::Result<ReleaseConfig>;

    /// Explicit release confirmation; declining must abort the run
    fn confirm_release(
        &self,
        version: &Version,
        channel: ReleaseChannel,
        message: &str,
    ) -> anyhow::Result<bool>;
}
