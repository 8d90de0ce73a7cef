use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::Command;
use crate::agent::CommandAgentClient;
use crate::artifacts::{FsArtifactPublisher, RunSummary};
use crate::cli::interactive::InteractivePolicy;
use crate::cli::ModeArg;
use crate::config::StoryReelConfig;
use crate::external::{CommandExecutor, ProcessCommandExecutor};
use crate::fs::{FileSystemOperations, StandardFileSystem};
use crate::render::{
    CommandTemplateRenderer, FallbackPolicy, GeneratedCodeRenderer, RenderFailure, RenderMode, RenderModePolicy,
    RenderStage,
};
use crate::story_script::Style;
use crate::telemetry::{init_telemetry, shutdown_telemetry};
use crate::workflow::{Workflow, WorkflowSettings};

pub struct RunCommand {
    pub source_dir: PathBuf,
    pub mode: ModeArg,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    style: Option<String>,
    prompt: Option<String>,
    max_retries: Option<u32>,
}

impl RunCommand {
    pub fn new(source_dir: PathBuf, mode: ModeArg) -> Self {
        Self {
            source_dir,
            mode,
            config_path: None,
            output: None,
            style: None,
            prompt: None,
            max_retries: None,
        }
    }

    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    pub fn with_style(mut self, style: Option<String>, prompt: Option<String>) -> Self {
        self.style = style;
        self.prompt = prompt;
        self
    }

    pub fn with_max_retries(mut self, max_retries: Option<u32>) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Loads configuration and applies command line overrides on top.
    pub fn resolve_config(&self) -> Result<StoryReelConfig> {
        let mut config = StoryReelConfig::load(self.config_path.as_deref()).context("failed to load configuration")?;
        if let Some(output) = &self.output {
            config.output.root_dir = output.clone();
        }
        if let Some(style) = &self.style {
            config.style.preset = style.clone();
        }
        if let Some(prompt) = &self.prompt {
            config.style.prompt = Some(prompt.clone());
        }
        if let Some(max_retries) = self.max_retries {
            config.generation.max_retries = max_retries;
        }
        Ok(config)
    }

    fn policy(&self) -> Box<dyn RenderModePolicy> {
        match self.mode {
            ModeArg::Ask => Box::new(InteractivePolicy::stdin()),
            ModeArg::Auto | ModeArg::Template => Box::new(FallbackPolicy::new(RenderMode::Template)),
            ModeArg::AiCode => Box::new(FallbackPolicy::new(RenderMode::AiCode)),
        }
    }

    fn build_workflow(config: &StoryReelConfig, notices: mpsc::UnboundedSender<RenderFailure>) -> Workflow {
        let executor: Arc<dyn CommandExecutor> = Arc::new(ProcessCommandExecutor);
        let fs: Arc<dyn FileSystemOperations> = Arc::new(StandardFileSystem);
        let agent = Arc::new(CommandAgentClient::new(
            config.agent.clone(),
            config.video.clone(),
            executor.clone(),
        ));

        let template = CommandTemplateRenderer::new(
            config.render.template.clone(),
            &config.render.video_file_name,
            executor.clone(),
            fs.clone(),
        );
        let code = GeneratedCodeRenderer::new(
            config.render.code.clone(),
            &config.render.video_file_name,
            agent.clone(),
            executor,
            fs.clone(),
        );
        let stage = RenderStage::new(Arc::new(template), Arc::new(code)).with_failure_notices(notices);

        Workflow::new(agent, stage, Arc::new(FsArtifactPublisher::new(fs.clone())), fs)
            .with_settings(WorkflowSettings::from(config))
    }
}

impl Command for RunCommand {
    async fn execute(&self) -> Result<()> {
        let config = self.resolve_config()?;
        init_telemetry(&config.observability)?;

        eprintln!("🎞️  STORYREEL RUN");
        eprintln!("   📂 Photos: {}", self.source_dir.display());
        eprintln!("   📁 Output: {}", config.output.root_dir.display());

        let (notices, mut received) = mpsc::unbounded_channel::<RenderFailure>();
        let reporter = tokio::spawn(async move {
            while let Some(failure) = received.recv().await {
                eprintln!("⚠️  {} render failed: {}", failure.mode, failure.reason);
            }
        });

        let workflow = Self::build_workflow(&config, notices);
        let style: Style = config.style.to_style();
        let mut policy = self.policy();

        let result = workflow.run(&self.source_dir, style, policy.as_mut()).await;
        drop(workflow);
        let _ = reporter.await;
        shutdown_telemetry();

        let summary = result?;
        print_summary(&summary)?;
        Ok(())
    }
}

fn print_summary(summary: &RunSummary) -> Result<()> {
    eprintln!();
    eprintln!("✅ Video rendered with the {} strategy", summary.mode);
    eprintln!("   🎬 {}", summary.video_path.display());
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}
