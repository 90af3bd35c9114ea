//! Lockstep Publisher CLI
//!
//! Interactive lockstep release assistant for scoped npm package sets

use anyhow::Result;
use clap::{Parser, Subcommand};
use lockstep_publisher::{
    ConfigLoader, HistoryOptions, NpmRegistry, PresetAnswers, ReleaseChannel, ReleaseError,
    ReleaseHistory, ReleaseOptions, ReleaseOrchestrator, ReleasePlan, ReleaseType,
    RegistryClient, TerminalPrompter, validate_package_name,
};
use lockstep_publisher::core::config_loader::CONFIG_FILE;
use lockstep_publisher::manifest::{PackageManifest, manifest_path, package_dir};
use std::path::PathBuf;
use std::process;

/// Lockstep release assistant for scoped npm package sets
#[derive(Parser)]
#[command(name = "lockstep-publisher")]
#[command(version = "0.1.0")]
#[command(about = "Lockstep release assistant for scoped npm package sets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Release every package of the workspace in lockstep
    Release {
        /// Workspace root (defaults to current directory)
        #[arg(value_name = "WORKSPACE")]
        workspace: Option<PathBuf>,

        /// Release channel (next|latest)
        #[arg(long)]
        channel: Option<String>,

        /// Release type (prerelease|patch|minor|major)
        #[arg(long = "type", value_name = "TYPE")]
        release_type: Option<String>,

        /// Short release message
        #[arg(long, short = 'm')]
        message: Option<String>,

        /// Shortcut for --type prerelease
        #[arg(long = "pre-release")]
        pre_release: bool,

        /// Skip all prompts (CI/CD); requires --channel and a release type
        #[arg(long, short = 'y')]
        yes: bool,

        /// Pass --dry-run to npm publish
        #[arg(long)]
        dry_run: bool,
    },

    /// Check that the workspace is ready to release
    Check {
        /// Workspace root (defaults to current directory)
        #[arg(value_name = "WORKSPACE")]
        workspace: Option<PathBuf>,
    },

    /// Display recorded release history
    History {
        /// Workspace root (defaults to current directory)
        #[arg(value_name = "WORKSPACE")]
        workspace: Option<PathBuf>,

        /// Show only failed releases
        #[arg(long)]
        failures_only: bool,

        /// Show at most N releases
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Initialize the workspace configuration
    Init {
        /// Workspace root (defaults to current directory)
        #[arg(value_name = "WORKSPACE")]
        workspace: Option<PathBuf>,

        /// Force overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{}", e);
            if let Some(release_error) = e.downcast_ref::<ReleaseError>() {
                eprintln!("  [{}]", release_error.code());
                for action in release_error.suggested_actions() {
                    eprintln!("  💡 {}", action);
                }
            }
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Release {
            workspace,
            channel,
            release_type,
            message,
            pre_release,
            yes,
            dry_run,
        } => {
            let root = workspace.unwrap_or_else(|| PathBuf::from("."));
            release_command(root, channel, release_type, message, pre_release, yes, dry_run)
                .await
        }
        Commands::Check { workspace } => {
            let root = workspace.unwrap_or_else(|| PathBuf::from("."));
            check_command(root).await
        }
        Commands::History {
            workspace,
            failures_only,
            limit,
        } => {
            let root = workspace.unwrap_or_else(|| PathBuf::from("."));
            history_command(root, failures_only, limit).await
        }
        Commands::Init { workspace, force } => {
            let root = workspace.unwrap_or_else(|| PathBuf::from("."));
            init_command(root, force).await
        }
    }
}

async fn release_command(
    root: PathBuf,
    channel: Option<String>,
    release_type: Option<String>,
    message: Option<String>,
    pre_release: bool,
    yes: bool,
    dry_run: bool,
) -> Result<i32> {
    println!("\n📦 lockstep-publisher\n");

    let config = ConfigLoader::load(&root).await?;

    let channel = channel
        .map(|s| s.parse::<ReleaseChannel>())
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;
    let mut release_type = release_type
        .map(|s| s.parse::<ReleaseType>())
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;
    if pre_release {
        release_type = Some(ReleaseType::Prerelease);
    }

    if yes && (channel.is_none() || release_type.is_none()) {
        anyhow::bail!("--yes requires --channel and --type (or --pre-release)");
    }

    let preset = PresetAnswers {
        channel,
        release_type,
        message,
        assume_yes: yes,
    };

    let registry = NpmRegistry::new(config.registry_url.clone());
    let orchestrator = ReleaseOrchestrator::new(
        root.clone(),
        config,
        Box::new(registry),
        Box::new(TerminalPrompter::new(preset)),
    );

    let report = orchestrator.run(ReleaseOptions { dry_run }).await?;

    if report.cancelled {
        println!("\n❌ Release cancelled");
        return Ok(1);
    }

    // Record the run; a broken history file must not fail the release
    let mut history = ReleaseHistory::new(&root);
    if let Err(e) = history.initialize().await {
        eprintln!("⚠️  Failed to initialize history: {}", e);
    }
    if let Err(e) = history.record_release(&report).await {
        eprintln!("⚠️  Failed to record history: {}", e);
    }

    for warning in &report.warnings {
        eprintln!("⚠️  {}", warning);
    }

    if report.success {
        println!("\n✅ Released v{} on channel {}", report.version, report.channel);
        Ok(0)
    } else {
        println!("\n❌ Release completed with errors");
        for outcome in report.outcomes.iter().filter(|o| !o.success) {
            eprintln!(
                "  - {}: {}",
                outcome.package,
                outcome.error.as_deref().unwrap_or("publish failed")
            );
        }
        Ok(1)
    }
}

async fn check_command(root: PathBuf) -> Result<i32> {
    println!("\n🔍 Workspace check\n");

    let mut ok = true;

    let config = ConfigLoader::load(&root).await?;
    println!("✅ Configuration: {} package(s)", config.packages.len());

    match ReleasePlan::build(&config.packages) {
        Ok(plan) => {
            println!(
                "✅ Publish order: {}",
                plan.publish_order()
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>()
                    .join(" -> ")
            );
        }
        Err(e) => {
            println!("❌ Publish order: {}", e);
            ok = false;
        }
    }

    let registry = NpmRegistry::new(config.registry_url.clone());
    let user = match registry.authenticated_user().await {
        Ok(Some(user)) => {
            println!("✅ Authenticated as {}", user);
            Some(user)
        }
        Ok(None) => {
            println!("❌ Not authenticated ({})", ReleaseError::NotAuthenticated);
            ok = false;
            None
        }
        Err(e) => {
            println!("❌ Identity check failed: {}", e);
            ok = false;
            None
        }
    };

    // Manifest locations depend on the publish scope, so they can only
    // be checked with a known identity
    if let Some(user) = user {
        for definition in &config.packages {
            let path = manifest_path(&package_dir(
                &root,
                &config.packages_dir,
                &user,
                &definition.name,
            ));

            match PackageManifest::load(&path).await {
                Ok(manifest) => {
                    let mut problems = validate_package_name(&manifest.name);
                    if manifest.version.trim().is_empty() {
                        problems.push("versionは必須フィールドです".to_string());
                    }

                    if problems.is_empty() {
                        println!("✅ {}", definition.name);
                    } else {
                        println!("❌ {}", definition.name);
                        for problem in problems {
                            println!("    - {}", problem);
                        }
                        ok = false;
                    }
                }
                Err(e) => {
                    println!("❌ {}: {}", definition.name, e);
                    ok = false;
                }
            }
        }
    }

    println!();
    Ok(if ok { 0 } else { 1 })
}

async fn history_command(root: PathBuf, failures_only: bool, limit: usize) -> Result<i32> {
    println!("\n📊 Release history\n");

    let mut history = ReleaseHistory::new(&root);
    history.initialize().await?;

    let options = HistoryOptions {
        failures_only,
        limit: Some(limit),
    };
    println!("{}", history.summary(&options));

    Ok(0)
}

async fn init_command(root: PathBuf, force: bool) -> Result<i32> {
    println!("\n🎯 Initialize lockstep-publisher\n");

    let path = root.join(CONFIG_FILE);
    if path.exists() && !force {
        eprintln!(
            "⚠️  {} already exists (use --force to overwrite)",
            path.display()
        );
        return Ok(1);
    }

    tokio::fs::write(&path, ConfigLoader::starter_template()).await?;
    println!("✅ Wrote {}", path.display());
    println!("Edit the package list, then run the check subcommand.");

    Ok(0)
}
