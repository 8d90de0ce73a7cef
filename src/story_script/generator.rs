// Story script generation with bounded retry and feedback.
//
// Each attempt hands the accumulated failure reasons back to the agent so it
// can correct itself on the next try.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use super::semantics::validate_semantics;
use super::structure::validate_structure;
use super::types::{Asset, SemanticRules, StoryScript, Style};

/// Constraints sent to the agent and enforced by the semantic validator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConstraints {
    pub duration_sec: f64,
    pub min_duration_per_asset_sec: f64,
    pub require_all_assets_used: bool,
}

impl Default for GenerationConstraints {
    fn default() -> Self {
        Self::from(SemanticRules::default())
    }
}

impl From<SemanticRules> for GenerationConstraints {
    fn from(rules: SemanticRules) -> Self {
        Self {
            duration_sec: rules.expected_duration_sec,
            min_duration_per_asset_sec: rules.min_duration_per_asset_sec,
            require_all_assets_used: rules.require_all_assets_used,
        }
    }
}

impl From<GenerationConstraints> for SemanticRules {
    fn from(constraints: GenerationConstraints) -> Self {
        Self {
            expected_duration_sec: constraints.duration_sec,
            min_duration_per_asset_sec: constraints.min_duration_per_asset_sec,
            require_all_assets_used: constraints.require_all_assets_used,
        }
    }
}

/// One request to the generation agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub source_dir: String,
    pub assets: Vec<Asset>,
    pub style: Style,
    pub constraints: GenerationConstraints,
    pub attempt: u32,
    pub previous_errors: Vec<String>,
}

/// The external generative agent. Its output is untrusted.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait StoryScriptClient: Send + Sync {
    async fn generate_story_script(&self, request: &GenerationRequest) -> anyhow::Result<Value>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub source_dir: String,
    pub assets: Vec<Asset>,
    pub style: Style,
    pub max_retries: u32,
    pub constraints: GenerationConstraints,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedScript {
    pub script: StoryScript,
    /// Number of agent calls made, including the successful one.
    pub attempts: u32,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerationError {
    #[error("story script generation failed after {attempts} attempt(s):\n{}", .reasons.join("\n"))]
    Exhausted { attempts: u32, reasons: Vec<String> },
}

impl GenerationError {
    pub fn attempts(&self) -> u32 {
        match self {
            GenerationError::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn reasons(&self) -> &[String] {
        match self {
            GenerationError::Exhausted { reasons, .. } => reasons,
        }
    }
}

pub async fn generate_story_script(
    client: &dyn StoryScriptClient,
    options: &GenerationOptions,
) -> Result<GeneratedScript, GenerationError> {
    let total_attempts = options.max_retries.saturating_add(1);
    let rules = SemanticRules::from(options.constraints);
    let mut reasons: Vec<String> = Vec::new();

    for attempt in 1..=total_attempts {
        let request = GenerationRequest {
            source_dir: options.source_dir.clone(),
            assets: options.assets.clone(),
            style: options.style.clone(),
            constraints: options.constraints,
            attempt,
            previous_errors: reasons.clone(),
        };

        debug!(attempt, total_attempts, "Requesting story script from agent");

        let payload = match client.generate_story_script(&request).await {
            Ok(payload) => payload,
            Err(e) => {
                let reason = format!("attempt {attempt}: {e:#}");
                warn!(attempt, reason = %reason, "Story script request failed");
                reasons.push(reason);
                continue;
            }
        };

        let script = match validate_structure(&payload).into_script() {
            Ok(script) => script,
            Err(result) => {
                let reason = format!("attempt {attempt}: {}", result.joined_errors());
                warn!(attempt, reason = %reason, "Story script failed structural validation");
                reasons.push(reason);
                continue;
            }
        };

        let semantics = validate_semantics(&script, &rules);
        if !semantics.valid {
            let reason = format!("attempt {attempt}: {}", semantics.joined_errors());
            warn!(attempt, reason = %reason, "Story script failed semantic validation");
            reasons.push(reason);
            continue;
        }

        info!(
            attempt,
            segments = script.timeline.len(),
            "Story script accepted"
        );
        return Ok(GeneratedScript {
            script,
            attempts: attempt,
        });
    }

    Err(GenerationError::Exhausted {
        attempts: total_attempts,
        reasons,
    })
}
