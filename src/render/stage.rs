// Render stage: asks the policy for a mode, runs the matching adapter and
// feeds the outcome back through the render choice machine until a video
// exists or the policy exits.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::adapters::{CodeRenderOutcome, CodeRenderer, TemplateRenderer};
use super::policy::{RenderDecision, RenderModePolicy};
use super::state_machine::{
    RenderChoiceMachine, RenderChoiceState, RenderFailure, RenderMode, TransitionError,
};
use crate::run_log::RunLogs;
use crate::story_script::StoryScript;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Started,
    Success,
    Failed,
}

/// One entry of the append-only render attempt log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderAttemptRecord {
    pub time: DateTime<Utc>,
    pub mode: RenderMode,
    pub status: AttemptStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_code_path: Option<PathBuf>,
}

impl RenderAttemptRecord {
    fn new(mode: RenderMode, status: AttemptStatus) -> Self {
        Self {
            time: Utc::now(),
            mode,
            status,
            reason: None,
            video_path: None,
            generated_code_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutcome {
    pub mode: RenderMode,
    pub video_path: PathBuf,
    /// Generated source from the most recent generated-code attempt, even a
    /// failed one.
    pub generated_code_path: Option<PathBuf>,
    pub attempts: Vec<RenderAttemptRecord>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderStageError {
    #[error("render stage exited after the {mode} render failed: {reason}")]
    ExitedAfterFailure { mode: RenderMode, reason: String },
    #[error("render stage exited before successful rendering")]
    ExitedBeforeRender,
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

enum AttemptResult {
    Rendered {
        video_path: PathBuf,
        generated_code_dir: Option<PathBuf>,
    },
    Failed {
        reason: String,
        generated_code_dir: Option<PathBuf>,
    },
}

pub struct RenderStage {
    template: Arc<dyn TemplateRenderer>,
    code: Arc<dyn CodeRenderer>,
    failure_notices: Option<mpsc::UnboundedSender<RenderFailure>>,
}

impl RenderStage {
    pub fn new(template: Arc<dyn TemplateRenderer>, code: Arc<dyn CodeRenderer>) -> Self {
        Self {
            template,
            code,
            failure_notices: None,
        }
    }

    /// Every render failure is also sent on this channel.
    pub fn with_failure_notices(mut self, notices: mpsc::UnboundedSender<RenderFailure>) -> Self {
        self.failure_notices = Some(notices);
        self
    }

    pub async fn run(
        &self,
        script: &StoryScript,
        output_dir: &Path,
        policy: &mut dyn RenderModePolicy,
        logs: &mut RunLogs,
    ) -> Result<RenderOutcome, RenderStageError> {
        let mut machine = RenderChoiceMachine::new();
        let mut attempts = Vec::new();
        let mut generated_code_path: Option<PathBuf> = None;

        loop {
            if let RenderChoiceState::Completed { mode, video_path } = machine.state() {
                return Ok(RenderOutcome {
                    mode: *mode,
                    video_path: video_path.clone(),
                    generated_code_path,
                    attempts,
                });
            }

            let mode = match policy.choose(machine.state()).await {
                RenderDecision::Render(mode) => mode,
                RenderDecision::Exit => {
                    let error = match machine.state().last_failure() {
                        Some(failure) => RenderStageError::ExitedAfterFailure {
                            mode: failure.mode,
                            reason: failure.reason.clone(),
                        },
                        None => RenderStageError::ExitedBeforeRender,
                    };
                    logs.error(error.to_string());
                    return Err(error);
                }
            };

            machine.select_mode(mode)?;
            info!(mode = %mode, attempt = attempts.len() / 2 + 1, "Render attempt started");
            record(logs, &mut attempts, RenderAttemptRecord::new(mode, AttemptStatus::Started));

            match self.attempt(mode, script, output_dir).await {
                AttemptResult::Rendered {
                    video_path,
                    generated_code_dir,
                } => {
                    if generated_code_dir.is_some() {
                        generated_code_path = generated_code_dir.clone();
                    }
                    machine.mark_success(video_path.clone())?;

                    let mut entry = RenderAttemptRecord::new(mode, AttemptStatus::Success);
                    entry.video_path = Some(video_path);
                    entry.generated_code_path = generated_code_dir;
                    record(logs, &mut attempts, entry);
                }
                AttemptResult::Failed {
                    reason,
                    generated_code_dir,
                } => {
                    if generated_code_dir.is_some() {
                        generated_code_path = generated_code_dir.clone();
                    }
                    warn!(mode = %mode, reason = %reason, "Render attempt failed");

                    let mut entry = RenderAttemptRecord::new(mode, AttemptStatus::Failed);
                    entry.reason = Some(reason.clone());
                    entry.generated_code_path = generated_code_dir;
                    record(logs, &mut attempts, entry);
                    logs.error(format!("{mode} render failed: {reason}"));

                    machine.mark_failure(reason.clone())?;
                    if let Some(notices) = &self.failure_notices {
                        // A dropped receiver just means nobody is listening.
                        let _ = notices.send(RenderFailure { mode, reason });
                    }
                }
            }
        }
    }

    async fn attempt(&self, mode: RenderMode, script: &StoryScript, output_dir: &Path) -> AttemptResult {
        match mode {
            RenderMode::Template => match self.template.render(script, output_dir).await {
                Ok(video_path) => AttemptResult::Rendered {
                    video_path,
                    generated_code_dir: None,
                },
                Err(e) => AttemptResult::Failed {
                    reason: format!("{e:#}"),
                    generated_code_dir: None,
                },
            },
            RenderMode::AiCode => match self.code.render(script, output_dir).await {
                CodeRenderOutcome::Succeeded {
                    video_path,
                    generated_code_dir,
                } => AttemptResult::Rendered {
                    video_path,
                    generated_code_dir: Some(generated_code_dir),
                },
                CodeRenderOutcome::Failed {
                    generated_code_dir,
                    error,
                } => AttemptResult::Failed {
                    reason: error.reason(),
                    generated_code_dir: Some(generated_code_dir),
                },
            },
        }
    }
}

fn record(logs: &mut RunLogs, attempts: &mut Vec<RenderAttemptRecord>, entry: RenderAttemptRecord) {
    let line = serde_json::to_string(&entry)
        .unwrap_or_else(|e| format!("{{\"mode\":\"{}\",\"unserializable\":\"{e}\"}}", entry.mode));
    logs.info(format!("render_attempt {line}"));
    attempts.push(entry);
}
