use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use super::prompt::{render_code_prompt, story_script_prompt};
use crate::config::{AgentConfig, VideoConfig};
use crate::external::{CommandExecutor, CommandSpec};
use crate::render::RenderCodeAuthor;
use crate::story_script::{GenerationRequest, StoryScript, StoryScriptClient};

/// Talks to a generative agent CLI: the prompt goes to stdin, the answer is
/// read from stdout.
pub struct CommandAgentClient {
    agent: AgentConfig,
    video: VideoConfig,
    executor: Arc<dyn CommandExecutor>,
}

impl CommandAgentClient {
    pub fn new(agent: AgentConfig, video: VideoConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { agent, video, executor }
    }

    async fn ask(&self, prompt: String) -> Result<String> {
        let spec = CommandSpec::new(&self.agent.program)
            .args(self.agent.args.iter().cloned())
            .stdin(prompt);

        debug!(command = %spec.display(), "Invoking agent");
        let output = self.executor.execute(&spec).await?;
        if !output.success() {
            bail!(
                "agent exited with status {}: {}",
                output.status_code,
                output.stderr.trim()
            );
        }
        if output.stdout.trim().is_empty() {
            bail!("agent returned an empty response");
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl StoryScriptClient for CommandAgentClient {
    async fn generate_story_script(&self, request: &GenerationRequest) -> Result<Value> {
        info!(attempt = request.attempt, assets = request.assets.len(), "Requesting story script");
        let response = self.ask(story_script_prompt(request, &self.video)).await?;
        extract_json_object(&response)
    }
}

#[async_trait]
impl RenderCodeAuthor for CommandAgentClient {
    async fn write_render_code(&self, script: &StoryScript, entry_file: &str) -> Result<String> {
        info!(entry_file, "Requesting render code");
        let response = self.ask(render_code_prompt(script, entry_file)).await?;
        extract_code_block(&response).ok_or_else(|| anyhow!("agent response contained no source code"))
    }
}

/// Pulls the first JSON object out of an agent response, tolerating Markdown
/// fences and surrounding prose.
pub fn extract_json_object(response: &str) -> Result<Value> {
    let body = fenced_block(response).unwrap_or(response);
    let start = body
        .find('{')
        .ok_or_else(|| anyhow!("agent response is not JSON: no object found"))?;

    // Parse a single value from the first brace; anything after it is prose.
    let mut values = serde_json::Deserializer::from_str(&body[start..]).into_iter::<Value>();
    match values.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) if e.is_eof() => bail!("agent response is not JSON: unterminated object"),
        Some(Err(e)) => Err(e).context("agent response is not valid JSON"),
        None => bail!("agent response is not JSON: no object found"),
    }
}

/// Returns the contents of the first fenced code block, or the whole
/// response when it has no fences.
pub fn extract_code_block(response: &str) -> Option<String> {
    let code = fenced_block(response).unwrap_or(response).trim();
    if code.is_empty() {
        None
    } else {
        Some(format!("{code}\n"))
    }
}

fn fenced_block(response: &str) -> Option<&str> {
    let open = response.find("```")?;
    let after_fence = &response[open + 3..];
    // Skip the info string (```json, ```tsx, ...).
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    Some(&body[..close])
}
