use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::info;

use super::adapters::{expand_placeholders, TemplateRenderer};
use crate::config::CommandConfig;
use crate::external::{CommandExecutor, CommandSpec};
use crate::fs::FileSystemOperations;
use crate::story_script::StoryScript;

/// File the script is handed to the template renderer through.
pub const RENDER_INPUT_FILE: &str = "render-input.json";

/// Template renderer backed by an external command.
///
/// The script is written to `<output_dir>/render-input.json` and the
/// configured command is expected to produce `<output_dir>/<video_file_name>`.
pub struct CommandTemplateRenderer {
    command: CommandConfig,
    video_file_name: String,
    executor: Arc<dyn CommandExecutor>,
    fs: Arc<dyn FileSystemOperations>,
}

impl CommandTemplateRenderer {
    pub fn new(
        command: CommandConfig,
        video_file_name: impl Into<String>,
        executor: Arc<dyn CommandExecutor>,
        fs: Arc<dyn FileSystemOperations>,
    ) -> Self {
        Self {
            command,
            video_file_name: video_file_name.into(),
            executor,
            fs,
        }
    }
}

#[async_trait]
impl TemplateRenderer for CommandTemplateRenderer {
    async fn render(&self, script: &StoryScript, output_dir: &Path) -> Result<PathBuf> {
        let script_path = output_dir.join(RENDER_INPUT_FILE);
        let video_path = output_dir.join(&self.video_file_name);

        let body = serde_json::to_vec_pretty(script).context("failed to serialize story script")?;
        self.fs.write(&script_path, &body).await?;

        let spec = CommandSpec::new(&self.command.program)
            .args(expand_placeholders(&self.command.args, &script_path, &video_path, None))
            .current_dir(output_dir);

        info!(command = %spec.display(), "Rendering with template");
        let output = self.executor.execute(&spec).await?;
        if !output.success() {
            let details = [output.stderr.trim(), output.stdout.trim()]
                .into_iter()
                .find(|text| !text.is_empty());
            match details {
                Some(details) => bail!("template renderer exited with status {}: {details}", output.status_code),
                None => bail!("template renderer exited with status {}", output.status_code),
            }
        }
        if !self.fs.exists(&video_path).await {
            bail!(
                "template renderer finished but {} was not produced",
                video_path.display()
            );
        }

        Ok(video_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{CommandOutput, MockCommandExecutor};
    use crate::fs::MockFileSystemOperations;
    use crate::story_script::{Asset, ScriptInput, Style, Subtitle, TimelineItem, VideoSpec};

    fn script() -> StoryScript {
        StoryScript {
            version: "1.0".to_string(),
            input: ScriptInput {
                source_dir: "/photos".to_string(),
                image_count: 1,
                assets: vec![Asset::new("img_001", "/photos/a.jpg")],
            },
            video: VideoSpec { width: 1080, height: 1920, fps: 30, duration_sec: 30.0 },
            style: Style::preset("cinematic"),
            timeline: vec![TimelineItem {
                asset_id: "img_001".to_string(),
                start_sec: 0.0,
                end_sec: 30.0,
                subtitle_id: "s1".to_string(),
            }],
            subtitles: vec![Subtitle {
                id: "s1".to_string(),
                text: "Hi".to_string(),
                start_sec: 0.0,
                end_sec: 30.0,
            }],
            validation: None,
        }
    }

    fn command() -> CommandConfig {
        CommandConfig {
            program: "render-template".to_string(),
            args: vec!["--props".to_string(), "{script}".to_string(), "--out".to_string(), "{output}".to_string()],
        }
    }

    #[tokio::test]
    async fn test_successful_render_returns_video_path() {
        let mut fs = MockFileSystemOperations::new();
        fs.expect_write()
            .withf(|path, _| path == Path::new("/run/render-input.json"))
            .times(1)
            .returning(|_, _| Ok(()));
        fs.expect_exists().returning(|_| true);

        let mut executor = MockCommandExecutor::new();
        executor
            .expect_execute()
            .withf(|spec| {
                spec.args == ["--props", "/run/render-input.json", "--out", "/run/video.mp4"]
                    && spec.current_dir.as_deref() == Some(Path::new("/run"))
            })
            .times(1)
            .returning(|_| Ok(CommandOutput { status_code: 0, stdout: String::new(), stderr: String::new() }));

        let renderer = CommandTemplateRenderer::new(command(), "video.mp4", Arc::new(executor), Arc::new(fs));
        let video = renderer.render(&script(), Path::new("/run")).await.unwrap();
        assert_eq!(video, PathBuf::from("/run/video.mp4"));
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_the_failure_reason() {
        let mut fs = MockFileSystemOperations::new();
        fs.expect_write().returning(|_, _| Ok(()));

        let mut executor = MockCommandExecutor::new();
        executor.expect_execute().returning(|_| {
            Ok(CommandOutput {
                status_code: 2,
                stdout: String::new(),
                stderr: "composition not found\n".to_string(),
            })
        });

        let renderer = CommandTemplateRenderer::new(command(), "video.mp4", Arc::new(executor), Arc::new(fs));
        let err = renderer.render(&script(), Path::new("/run")).await.unwrap_err();
        assert_eq!(err.to_string(), "template renderer exited with status 2: composition not found");
    }

    #[tokio::test]
    async fn test_failure_reason_falls_back_to_stdout_then_status() {
        let outputs = [
            ("Error: props file is empty\n", "template renderer exited with status 1: Error: props file is empty"),
            ("  \n", "template renderer exited with status 1"),
        ];
        for (stdout, expected) in outputs {
            let mut fs = MockFileSystemOperations::new();
            fs.expect_write().returning(|_, _| Ok(()));

            let mut executor = MockCommandExecutor::new();
            let stdout = stdout.to_string();
            executor.expect_execute().returning(move |_| {
                Ok(CommandOutput { status_code: 1, stdout: stdout.clone(), stderr: String::new() })
            });

            let renderer = CommandTemplateRenderer::new(command(), "video.mp4", Arc::new(executor), Arc::new(fs));
            let err = renderer.render(&script(), Path::new("/run")).await.unwrap_err();
            assert_eq!(err.to_string(), expected);
        }
    }

    #[tokio::test]
    async fn test_missing_video_is_a_failure() {
        let mut fs = MockFileSystemOperations::new();
        fs.expect_write().returning(|_, _| Ok(()));
        fs.expect_exists().returning(|_| false);

        let mut executor = MockCommandExecutor::new();
        executor
            .expect_execute()
            .returning(|_| Ok(CommandOutput { status_code: 0, stdout: String::new(), stderr: String::new() }));

        let renderer = CommandTemplateRenderer::new(command(), "video.mp4", Arc::new(executor), Arc::new(fs));
        let err = renderer.render(&script(), Path::new("/run")).await.unwrap_err();
        assert!(err.to_string().contains("was not produced"));
    }
}
