//! Artifact publication for a finished run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use crate::fs::FileSystemOperations;
use crate::render::RenderMode;
use crate::run_log::RunLogs;
use crate::story_script::StoryScript;

pub const STORY_SCRIPT_FILE: &str = "story-script.json";
pub const RUN_LOG_FILE: &str = "run.log";
pub const ERROR_LOG_FILE: &str = "error.log";
pub const RUN_SUMMARY_FILE: &str = "run-summary.json";

/// The single record returned for a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: String,
    pub output_dir: PathBuf,
    pub mode: RenderMode,
    pub video_path: PathBuf,
    pub story_script_path: PathBuf,
    pub run_log_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_log_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_code_path: Option<PathBuf>,
}

/// Everything a publisher needs from a completed run.
#[derive(Debug, Clone)]
pub struct CompletedRun {
    pub run_id: String,
    pub output_dir: PathBuf,
    pub script: StoryScript,
    pub mode: RenderMode,
    pub video_path: PathBuf,
    pub generated_code_path: Option<PathBuf>,
    pub logs: RunLogs,
}

/// Paths written for a run that was aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureArtifacts {
    pub run_log_path: PathBuf,
    pub error_log_path: Option<PathBuf>,
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ArtifactPublisher: Send + Sync {
    async fn publish(&self, run: &CompletedRun) -> Result<RunSummary>;

    /// Persist whatever logs an aborted run produced.
    async fn publish_failure(&self, output_dir: &Path, logs: &RunLogs) -> Result<FailureArtifacts>;
}

pub struct FsArtifactPublisher {
    fs: Arc<dyn FileSystemOperations>,
}

impl FsArtifactPublisher {
    pub fn new(fs: Arc<dyn FileSystemOperations>) -> Self {
        Self { fs }
    }

    async fn write_logs(&self, output_dir: &Path, logs: &RunLogs) -> Result<FailureArtifacts> {
        let run_log_path = output_dir.join(RUN_LOG_FILE);
        self.fs
            .write(&run_log_path, join_lines(logs.run_lines()).as_bytes())
            .await?;

        let error_log_path = if logs.has_errors() {
            let path = output_dir.join(ERROR_LOG_FILE);
            self.fs.write(&path, join_lines(logs.error_lines()).as_bytes()).await?;
            Some(path)
        } else {
            None
        };

        Ok(FailureArtifacts {
            run_log_path,
            error_log_path,
        })
    }
}

#[async_trait]
impl ArtifactPublisher for FsArtifactPublisher {
    async fn publish(&self, run: &CompletedRun) -> Result<RunSummary> {
        self.fs.create_dir_all(&run.output_dir).await?;

        let story_script_path = run.output_dir.join(STORY_SCRIPT_FILE);
        let script = serde_json::to_vec_pretty(&run.script).context("failed to serialize story script")?;
        self.fs.write(&story_script_path, &script).await?;

        let logs = self.write_logs(&run.output_dir, &run.logs).await?;

        let summary = RunSummary {
            run_id: run.run_id.clone(),
            output_dir: run.output_dir.clone(),
            mode: run.mode,
            video_path: run.video_path.clone(),
            story_script_path,
            run_log_path: logs.run_log_path,
            error_log_path: logs.error_log_path,
            generated_code_path: run.generated_code_path.clone(),
        };

        let body = serde_json::to_vec_pretty(&summary).context("failed to serialize run summary")?;
        self.fs.write(&run.output_dir.join(RUN_SUMMARY_FILE), &body).await?;

        info!(run_id = %summary.run_id, output_dir = %summary.output_dir.display(), "Published run artifacts");
        Ok(summary)
    }

    async fn publish_failure(&self, output_dir: &Path, logs: &RunLogs) -> Result<FailureArtifacts> {
        self.fs.create_dir_all(output_dir).await?;
        self.write_logs(output_dir, logs).await
    }
}

fn join_lines(lines: &[String]) -> String {
    let mut body = lines.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    body
}
