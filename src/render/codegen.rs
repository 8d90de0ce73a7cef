// Generated-code render strategy: ask the agent for a render program, compile
// it, then run it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use super::adapters::{expand_placeholders, CodeRenderOutcome, CodeRenderer, CodeStage, StageError};
use crate::config::{CodeRenderConfig, CommandConfig};
use crate::external::{CommandExecutor, CommandSpec};
use crate::fs::FileSystemOperations;
use crate::story_script::StoryScript;

/// Directory, inside the run directory, that holds generated source. Later
/// attempts in the same run get `generated-code-2`, `generated-code-3`, ...
pub const GENERATED_CODE_DIR: &str = "generated-code";
/// Copy of the script placed next to the generated source.
pub const CODE_SCRIPT_FILE: &str = "story-script.json";

/// Writes render program source for a story script.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait RenderCodeAuthor: Send + Sync {
    async fn write_render_code(&self, script: &StoryScript, entry_file: &str) -> anyhow::Result<String>;
}

pub struct GeneratedCodeRenderer {
    settings: CodeRenderConfig,
    video_file_name: String,
    author: Arc<dyn RenderCodeAuthor>,
    executor: Arc<dyn CommandExecutor>,
    fs: Arc<dyn FileSystemOperations>,
}

impl GeneratedCodeRenderer {
    pub fn new(
        settings: CodeRenderConfig,
        video_file_name: impl Into<String>,
        author: Arc<dyn RenderCodeAuthor>,
        executor: Arc<dyn CommandExecutor>,
        fs: Arc<dyn FileSystemOperations>,
    ) -> Self {
        Self {
            settings,
            video_file_name: video_file_name.into(),
            author,
            executor,
            fs,
        }
    }

    /// First unused generated-code directory under `output_dir`, so earlier
    /// attempts keep their source for diagnosis.
    async fn attempt_dir(&self, output_dir: &Path) -> PathBuf {
        let first = output_dir.join(GENERATED_CODE_DIR);
        if !self.fs.exists(&first).await {
            return first;
        }
        let mut attempt = 2u32;
        loop {
            let candidate = output_dir.join(format!("{GENERATED_CODE_DIR}-{attempt}"));
            if !self.fs.exists(&candidate).await {
                return candidate;
            }
            attempt += 1;
        }
    }

    async fn prepare(&self, script: &StoryScript, code_dir: &Path) -> Result<PathBuf, StageError> {
        let source = self
            .author
            .write_render_code(script, &self.settings.entry_file)
            .await
            .map_err(|e| StageError::new(CodeStage::Compile, "render code generation failed").with_details(format!("{e:#}")))?;

        let write_failure = |e: anyhow::Error| {
            StageError::new(CodeStage::Compile, "failed to write generated code").with_details(format!("{e:#}"))
        };

        self.fs.create_dir_all(code_dir).await.map_err(write_failure)?;
        let body = serde_json::to_vec_pretty(script).map_err(|e| write_failure(e.into()))?;
        let script_path = code_dir.join(CODE_SCRIPT_FILE);
        self.fs.write(&script_path, &body).await.map_err(write_failure)?;
        self.fs
            .write(&code_dir.join(&self.settings.entry_file), source.as_bytes())
            .await
            .map_err(write_failure)?;

        Ok(script_path)
    }

    async fn run_stage(
        &self,
        stage: CodeStage,
        command: &CommandConfig,
        script_path: &Path,
        video_path: &Path,
        code_dir: &Path,
    ) -> Result<(), StageError> {
        let spec = CommandSpec::new(&command.program)
            .args(expand_placeholders(&command.args, script_path, video_path, Some(code_dir)))
            .current_dir(code_dir);

        info!(stage = %stage, command = %spec.display(), "Running generated code stage");
        let output = self
            .executor
            .execute(&spec)
            .await
            .map_err(|e| StageError::new(stage, e.to_string()))?;

        if output.success() {
            Ok(())
        } else {
            let details = if output.stderr.trim().is_empty() {
                output.stdout
            } else {
                output.stderr
            };
            Err(StageError::new(stage, format!("{} exited with status {}", command.program, output.status_code))
                .with_details(details))
        }
    }
}

#[async_trait]
impl CodeRenderer for GeneratedCodeRenderer {
    async fn render(&self, script: &StoryScript, output_dir: &Path) -> CodeRenderOutcome {
        let code_dir = self.attempt_dir(output_dir).await;
        let video_path = output_dir.join(&self.video_file_name);

        let result = async {
            let script_path = self.prepare(script, &code_dir).await?;
            self.run_stage(CodeStage::Compile, &self.settings.compile, &script_path, &video_path, &code_dir)
                .await?;
            self.run_stage(CodeStage::Render, &self.settings.render, &script_path, &video_path, &code_dir)
                .await?;
            if !self.fs.exists(&video_path).await {
                return Err(StageError::new(
                    CodeStage::Render,
                    format!("render finished but {} was not produced", video_path.display()),
                ));
            }
            Ok(())
        }
        .await;

        match result {
            Ok(()) => CodeRenderOutcome::Succeeded {
                video_path,
                generated_code_dir: code_dir,
            },
            Err(error) => {
                warn!(stage = %error.stage, message = %error.message, "Generated code render failed");
                CodeRenderOutcome::Failed {
                    generated_code_dir: code_dir,
                    error,
                }
            }
        }
    }
}
