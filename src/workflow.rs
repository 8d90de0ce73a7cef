//! End-to-end run orchestration.
//!
//! A run allocates its own output directory, collects the photos, generates
//! and validates a story script, drives the render stage and finally
//! publishes the artifacts. Every step before publication is fatal on
//! failure; only render mode failures are recoverable, and that recovery
//! lives inside [`RenderStage`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use rand::distr::Alphanumeric;
use rand::Rng;
use thiserror::Error;
use tracing::{error, info, warn, Instrument};

use crate::artifacts::{ArtifactPublisher, CompletedRun, RunSummary};
use crate::config::StoryReelConfig;
use crate::fs::FileSystemOperations;
use crate::intake::{collect_assets, IntakeError};
use crate::render::{RenderModePolicy, RenderStage, RenderStageError};
use crate::run_log::RunLogs;
use crate::story_script::{
    generate_story_script, GenerationConstraints, GenerationError, GenerationOptions, StoryScriptClient, Style,
};
use crate::telemetry::{create_run_span, generate_correlation_id};

const RUN_ID_SUFFIX_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("failed to prepare output directory {path}: {message}")]
    OutputDir { path: PathBuf, message: String },
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Render(#[from] RenderStageError),
    #[error("failed to publish run artifacts: {0:#}")]
    Publish(anyhow::Error),
}

/// Knobs for a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSettings {
    pub output_root: PathBuf,
    pub max_images: usize,
    pub max_retries: u32,
    pub constraints: GenerationConstraints,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self::from(&StoryReelConfig::default())
    }
}

impl From<&StoryReelConfig> for WorkflowSettings {
    fn from(config: &StoryReelConfig) -> Self {
        Self {
            output_root: config.output.root_dir.clone(),
            max_images: config.intake.max_images,
            max_retries: config.generation.max_retries,
            constraints: config.generation.constraints(),
        }
    }
}

pub struct Workflow {
    client: Arc<dyn StoryScriptClient>,
    stage: RenderStage,
    publisher: Arc<dyn ArtifactPublisher>,
    fs: Arc<dyn FileSystemOperations>,
    settings: WorkflowSettings,
}

impl Workflow {
    pub fn new(
        client: Arc<dyn StoryScriptClient>,
        stage: RenderStage,
        publisher: Arc<dyn ArtifactPublisher>,
        fs: Arc<dyn FileSystemOperations>,
    ) -> Self {
        Self {
            client,
            stage,
            publisher,
            fs,
            settings: WorkflowSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: WorkflowSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    pub async fn run(
        &self,
        source_dir: &Path,
        style: Style,
        policy: &mut dyn RenderModePolicy,
    ) -> Result<RunSummary, WorkflowError> {
        let run_id = generate_run_id();
        let correlation_id = generate_correlation_id();
        let span = create_run_span(&run_id, &source_dir.display().to_string(), &correlation_id);

        self.run_with_id(run_id, source_dir, style, policy)
            .instrument(span)
            .await
    }

    async fn run_with_id(
        &self,
        run_id: String,
        source_dir: &Path,
        style: Style,
        policy: &mut dyn RenderModePolicy,
    ) -> Result<RunSummary, WorkflowError> {
        let output_dir = self.settings.output_root.join(&run_id);
        let mut logs = RunLogs::new();
        logs.info(format!("run {run_id} started for {}", source_dir.display()));

        self.fs
            .create_dir_all(&output_dir)
            .await
            .map_err(|e| WorkflowError::OutputDir {
                path: output_dir.clone(),
                message: format!("{e:#}"),
            })?;

        match self.execute(&run_id, &output_dir, source_dir, style, policy, &mut logs).await {
            Ok(summary) => {
                info!(run_id = %summary.run_id, mode = %summary.mode, "Run completed");
                Ok(summary)
            }
            Err(e) => {
                error!(run_id = %run_id, error = %e, "Run aborted");
                logs.error(format!("run aborted: {e}"));
                if let Err(publish_error) = self.publisher.publish_failure(&output_dir, &logs).await {
                    warn!(error = %format!("{publish_error:#}"), "Failed to persist logs of aborted run");
                }
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        run_id: &str,
        output_dir: &Path,
        source_dir: &Path,
        style: Style,
        policy: &mut dyn RenderModePolicy,
        logs: &mut RunLogs,
    ) -> Result<RunSummary, WorkflowError> {
        let assets = collect_assets(source_dir, self.settings.max_images).await?;
        logs.info(format!("collected {} image(s)", assets.len()));

        let options = GenerationOptions {
            source_dir: source_dir.display().to_string(),
            assets,
            style,
            max_retries: self.settings.max_retries,
            constraints: self.settings.constraints,
        };
        let generated = generate_story_script(self.client.as_ref(), &options).await?;
        logs.info(format!(
            "story script accepted after {} attempt(s) with {} timeline segment(s)",
            generated.attempts,
            generated.script.timeline.len()
        ));

        let rendered = self.stage.run(&generated.script, output_dir, policy, logs).await?;
        logs.info(format!(
            "rendered {} with the {} strategy",
            rendered.video_path.display(),
            rendered.mode
        ));

        let run = CompletedRun {
            run_id: run_id.to_string(),
            output_dir: output_dir.to_path_buf(),
            script: generated.script,
            mode: rendered.mode,
            video_path: rendered.video_path,
            generated_code_path: rendered.generated_code_path,
            logs: logs.clone(),
        };
        self.publisher.publish(&run).await.map_err(WorkflowError::Publish)
    }
}

/// A sortable local timestamp plus a short random suffix, e.g.
/// `20250314-093012-k3x9qa`.
pub fn generate_run_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RUN_ID_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}-{}", Local::now().format("%Y%m%d-%H%M%S"), suffix)
}
