// Render adapter interfaces consumed by the render stage.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use crate::story_script::StoryScript;

/// Renders a script through the fixed template. An `Err` carries the
/// failure reason.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    async fn render(&self, script: &StoryScript, output_dir: &Path) -> anyhow::Result<PathBuf>;
}

/// Renders a script by generating, compiling and running program code.
/// Expected failures come back as [`CodeRenderOutcome::Failed`], not `Err`.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait CodeRenderer: Send + Sync {
    async fn render(&self, script: &StoryScript, output_dir: &Path) -> CodeRenderOutcome;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeStage {
    Compile,
    Render,
}

impl fmt::Display for CodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeStage::Compile => f.write_str("compile"),
            CodeStage::Render => f.write_str("render"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageError {
    pub stage: CodeStage,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl StageError {
    pub fn new(stage: CodeStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        let details = details.into();
        if !details.trim().is_empty() {
            self.details = Some(details.trim().to_string());
        }
        self
    }

    /// Single-line reason combining stage, message and details.
    pub fn reason(&self) -> String {
        match &self.details {
            Some(details) => format!("[{}] {}: {}", self.stage, self.message, details),
            None => format!("[{}] {}", self.stage, self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeRenderOutcome {
    Succeeded {
        video_path: PathBuf,
        generated_code_dir: PathBuf,
    },
    Failed {
        generated_code_dir: PathBuf,
        error: StageError,
    },
}

impl CodeRenderOutcome {
    pub fn generated_code_dir(&self) -> &Path {
        match self {
            CodeRenderOutcome::Succeeded { generated_code_dir, .. }
            | CodeRenderOutcome::Failed { generated_code_dir, .. } => generated_code_dir,
        }
    }
}

/// Expands `{script}`, `{output}` and `{code}` placeholders in configured
/// command arguments.
pub fn expand_placeholders(args: &[String], script: &Path, output: &Path, code: Option<&Path>) -> Vec<String> {
    args.iter()
        .map(|arg| {
            let mut expanded = arg
                .replace("{script}", &script.to_string_lossy())
                .replace("{output}", &output.to_string_lossy());
            if let Some(code) = code {
                expanded = expanded.replace("{code}", &code.to_string_lossy());
            }
            expanded
        })
        .collect()
}
