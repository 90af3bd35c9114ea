//! Release history - persistent record of release runs
//!
//! Every run that reached the manifest-mutation step is appended to a
//! JSON data file, including the operator's release message, so release
//! notes are never silently dropped.

use crate::core::config::ReleaseChannel;
use crate::orchestration::release_orchestrator::ReleaseReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Directory holding tool state inside the workspace
pub const HISTORY_DIR: &str = ".lockstep-publisher";

/// History data file name
pub const HISTORY_FILE: &str = "history.json";

/// Outcome of one package within a recorded run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One recorded release run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseRecord {
    pub id: String,
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
    pub user: String,
    pub channel: ReleaseChannel,
    pub version: String,
    pub message: String,
    #[serde(rename = "dryRun")]
    pub dry_run: bool,
    pub success: bool,
    pub restored: bool,
    pub packages: Vec<PackageRecord>,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
}

/// Options for filtering history records
#[derive(Debug, Clone, Default)]
pub struct HistoryOptions {
    pub failures_only: bool,
    pub limit: Option<usize>,
}

/// Data file structure
#[derive(Debug, Serialize, Deserialize)]
struct HistoryDataFile {
    version: String,
    records: Vec<ReleaseRecord>,
    #[serde(rename = "lastUpdated")]
    last_updated: DateTime<Utc>,
}

/// Release history store
pub struct ReleaseHistory {
    records: Vec<ReleaseRecord>,
    data_file_path: PathBuf,
}

impl ReleaseHistory {
    /// Create a history store rooted at the workspace
    pub fn new<P: Into<PathBuf>>(workspace_root: P) -> Self {
        let data_file_path = workspace_root.into().join(HISTORY_DIR).join(HISTORY_FILE);

        Self {
            records: Vec::new(),
            data_file_path,
        }
    }

    /// Initialize by loading existing data; a missing file starts empty
    pub async fn initialize(&mut self) -> anyhow::Result<()> {
        match fs::read_to_string(&self.data_file_path).await {
            Ok(content) => {
                let data: HistoryDataFile = serde_json::from_str(&content)?;
                self.records = data.records;
                Ok(())
            }
            Err(_) => {
                self.records = Vec::new();
                Ok(())
            }
        }
    }

    /// Append a record for a finished run
    pub async fn record_release(&mut self, report: &ReleaseReport) -> anyhow::Result<()> {
        let record = ReleaseRecord {
            id: Self::generate_id(),
            started_at: report.started_at,
            user: report.user.clone(),
            channel: report.channel,
            version: report.version.clone(),
            message: report.message.clone(),
            dry_run: report.dry_run,
            success: report.success,
            restored: report.restored,
            packages: report
                .outcomes
                .iter()
                .map(|o| PackageRecord {
                    name: o.package.clone(),
                    success: o.success,
                    error: o.error.clone(),
                })
                .collect(),
            duration_ms: report.duration_ms,
        };

        self.records.push(record);
        self.save().await
    }

    /// Get filtered records, most recent first
    pub fn records(&self, options: &HistoryOptions) -> Vec<ReleaseRecord> {
        let mut filtered: Vec<_> = self
            .records
            .iter()
            .filter(|r| !options.failures_only || !r.success)
            .cloned()
            .collect();

        filtered.sort_by(|a, b| b.started_at.cmp(&a.started_at));

        if let Some(limit) = options.limit {
            filtered.truncate(limit);
        }

        filtered
    }

    /// Human-readable summary for the `history` subcommand
    pub fn summary(&self, options: &HistoryOptions) -> String {
        let records = self.records(options);

        if records.is_empty() {
            return "No releases recorded yet".to_string();
        }

        let successes = records.iter().filter(|r| r.success).count();
        let mut lines = vec![format!(
            "{} release(s), {} succeeded",
            records.len(),
            successes
        )];

        for record in &records {
            let status = if record.success { "✅" } else { "❌" };
            let dry_run = if record.dry_run { " (dry-run)" } else { "" };
            let message = if record.message.is_empty() {
                String::new()
            } else {
                format!(" - {}", record.message)
            };
            lines.push(format!(
                "{} {} v{} on {} by {}{}{}",
                status,
                record.started_at.format("%Y-%m-%d %H:%M UTC"),
                record.version,
                record.channel,
                record.user,
                dry_run,
                message,
            ));
        }

        lines.join("\n")
    }

    async fn save(&self) -> anyhow::Result<()> {
        let data = HistoryDataFile {
            version: "1.0".to_string(),
            records: self.records.clone(),
            last_updated: Utc::now(),
        };

        if let Some(parent) = self.data_file_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&data)?;
        fs::write(&self.data_file_path, json).await?;

        Ok(())
    }

    fn generate_id() -> String {
        format!("{}-{}", Utc::now().timestamp_millis(), uuid::Uuid::new_v4())
    }
}
