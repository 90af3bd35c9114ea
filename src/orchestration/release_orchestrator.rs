//! Release orchestrator - drives the lockstep release pipeline
//!
//! Strict sequence per run:
//! 1. Identity gate (must be authenticated against the registry)
//! 2. Release plan (topological publish order, fails fast on cycles)
//! 3. Operator configuration (channel, message, release type)
//! 4. Version resolution from the reference package
//! 5. Confirmation gate (default: decline)
//! 6. Manifest scoping
//! 7. Sequential publishing, no short-circuit on failure
//! 8. Manifest restoration - runs on every path once mutation began

use crate::core::config::{PackageDefinition, ReleaseChannel, WorkspaceConfig, scoped_name};
use crate::core::error::ReleaseError;
use crate::core::traits::{PublishOutcome, RegistryClient, ReleasePrompter};
use crate::core::version::resolve_next_version;
use crate::manifest::{PackageManifest, manifest_path, package_dir};
use crate::orchestration::plan::ReleasePlan;
use chrono::{DateTime, Utc};
use semver::Version;
use std::path::PathBuf;
use std::time::Instant;

/// Options for a release run
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
    /// Pass --dry-run to every publish; manifests are still scoped and
    /// restored so the run exercises the full pipeline
    pub dry_run: bool,
}

/// Report returned after a release run
#[derive(Debug, Clone)]
pub struct ReleaseReport {
    /// True when every publish succeeded
    pub success: bool,
    /// True when the operator declined the confirmation gate
    pub cancelled: bool,
    pub user: String,
    pub channel: ReleaseChannel,
    pub version: String,
    pub message: String,
    pub dry_run: bool,
    /// Per-package publish outcomes, in publish order
    pub outcomes: Vec<PublishOutcome>,
    /// True when every manifest was restored to its development state
    pub restored: bool,
    pub warnings: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Main release orchestrator
pub struct ReleaseOrchestrator {
    workspace_root: PathBuf,
    config: WorkspaceConfig,
    registry: Box<dyn RegistryClient>,
    prompter: Box<dyn ReleasePrompter>,
}

impl ReleaseOrchestrator {
    pub fn new(
        workspace_root: PathBuf,
        config: WorkspaceConfig,
        registry: Box<dyn RegistryClient>,
        prompter: Box<dyn ReleasePrompter>,
    ) -> Self {
        Self {
            workspace_root,
            config,
            registry,
            prompter,
        }
    }

    /// Run the release pipeline
    pub async fn run(&self, options: ReleaseOptions) -> anyhow::Result<ReleaseReport> {
        let start_time = Instant::now();
        let started_at = Utc::now();
        let mut warnings = Vec::new();

        // 1. Identity gate - fatal before any side effect
        let user = self
            .registry
            .authenticated_user()
            .await?
            .filter(|u| !u.trim().is_empty())
            .ok_or(ReleaseError::NotAuthenticated)?;
        println!("👤 Logged in as {}", user);

        // 2. Publish order, validated before any prompt
        let plan = ReleasePlan::build(&self.config.packages)?;
        println!(
            "🗂️  Publish order: {}\n",
            plan.publish_order()
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        // 3. Operator decisions
        let release = self.prompter.configure()?;

        // 4. Version resolution, seeded by the reference package
        let reference = scoped_name(&user, &self.config.reference_package().name);
        println!("\n🔍 Determining previous version of {}@{}", reference, release.channel);
        let previous = self
            .registry
            .published_version(&reference, release.channel)
            .await?;
        let version = resolve_next_version(
            &reference,
            previous.as_deref(),
            release.release_type,
            release.channel,
        )?;
        println!("   Next version: {}\n", version);

        // 5. Confirmation gate - nothing has been written yet
        if !self
            .prompter
            .confirm_release(&version, release.channel, &release.message)?
        {
            println!("Release cancelled by user");
            return Ok(ReleaseReport {
                success: false,
                cancelled: true,
                user,
                channel: release.channel,
                version: version.to_string(),
                message: release.message,
                dry_run: options.dry_run,
                outcomes: Vec::new(),
                restored: false,
                warnings,
                started_at,
                duration_ms: start_time.elapsed().as_millis() as u64,
            });
        }

        // 6. Manifest scoping; partial failure restores what was written
        println!("📝 Preparing manifests...");
        if let Err(e) = self
            .prepare_packages(&user, &version, plan.publish_order())
            .await
        {
            eprintln!("  ❌ Preparation failed, restoring manifests");
            for warning in self.restore_packages(&user, plan.publish_order()).await {
                eprintln!("  ⚠️  {}", warning);
            }
            return Err(e.into());
        }

        // 7. Sequential publish, no short-circuit
        let outcomes = self
            .publish_packages(&user, &release.channel, options.dry_run, plan.publish_order())
            .await;

        // 8. Restoration runs regardless of publish outcome
        println!("♻️  Restoring manifests...");
        let restore_warnings = self.restore_packages(&user, plan.publish_order()).await;
        let restored = restore_warnings.is_empty();
        warnings.extend(restore_warnings);

        let success = outcomes.iter().all(|o| o.success);

        Ok(ReleaseReport {
            success,
            cancelled: false,
            user,
            channel: release.channel,
            version: version.to_string(),
            message: release.message,
            dry_run: options.dry_run,
            outcomes,
            restored,
            warnings,
            started_at,
            duration_ms: start_time.elapsed().as_millis() as u64,
        })
    }

    /// Rewrite every manifest to its published shape, in publish order
    async fn prepare_packages(
        &self,
        user: &str,
        version: &Version,
        order: &[PackageDefinition],
    ) -> Result<(), ReleaseError> {
        for definition in order {
            let path = manifest_path(&self.package_dir(user, &definition.name));
            let mut manifest = PackageManifest::load(&path).await?;
            manifest.scope_for_release(user, version, definition);
            manifest.save(&path).await?;
            println!("  📦 {} -> {}@{}", definition.name, manifest.name, version);
        }
        Ok(())
    }

    /// Publish every package; a failure is recorded and the batch continues
    async fn publish_packages(
        &self,
        user: &str,
        channel: &ReleaseChannel,
        dry_run: bool,
        order: &[PackageDefinition],
    ) -> Vec<PublishOutcome> {
        let mut outcomes = Vec::with_capacity(order.len());

        for definition in order {
            let dir = self.package_dir(user, &definition.name);
            let scoped = scoped_name(user, &definition.name);
            println!("📤 Publishing {}...", scoped);

            let outcome = self
                .registry
                .publish(&dir, &scoped, *channel, &self.config.access, dry_run)
                .await;

            if outcome.success {
                println!("  ✅ {}", scoped);
            } else {
                eprintln!(
                    "  ❌ {}: {}",
                    scoped,
                    outcome.error.as_deref().unwrap_or("publish failed")
                );
            }
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Rewrite every manifest back to its development state
    ///
    /// Reloads each manifest from disk - no in-memory copy survives
    /// across steps. Failures are collected as warnings so one broken
    /// manifest never blocks the remaining restorations.
    async fn restore_packages(&self, user: &str, order: &[PackageDefinition]) -> Vec<String> {
        let mut warnings = Vec::new();

        for definition in order {
            let path = manifest_path(&self.package_dir(user, &definition.name));
            match PackageManifest::load(&path).await {
                Ok(mut manifest) => {
                    manifest.restore_development(user, definition);
                    if let Err(e) = manifest.save(&path).await {
                        warnings.push(format!("failed to restore {}: {}", definition.name, e));
                    }
                }
                Err(e) => {
                    warnings.push(format!("failed to restore {}: {}", definition.name, e));
                }
            }
        }

        warnings
    }

    fn package_dir(&self, user: &str, name: &str) -> PathBuf {
        package_dir(&self.workspace_root, &self.config.packages_dir, user, name)
    }
}
