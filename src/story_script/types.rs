use serde::{Deserialize, Serialize};

/// Story script: the validated description of how photos map onto timed
/// video segments and captions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryScript {
    pub version: String,
    pub input: ScriptInput,
    pub video: VideoSpec,
    pub style: Style,
    pub timeline: Vec<TimelineItem>,
    pub subtitles: Vec<Subtitle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationHints>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptInput {
    pub source_dir: String,
    pub image_count: u32,
    pub assets: Vec<Asset>,
}

/// A single input photograph, identified by its sequential id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub path: String,
}

impl Asset {
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub duration_sec: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    pub preset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl Style {
    pub fn preset(preset: impl Into<String>) -> Self {
        Self {
            preset: preset.into(),
            prompt: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineItem {
    pub asset_id: String,
    pub start_sec: f64,
    pub end_sec: f64,
    pub subtitle_id: String,
}

impl TimelineItem {
    pub fn duration_sec(&self) -> f64 {
        self.end_sec - self.start_sec
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtitle {
    pub id: String,
    pub text: String,
    pub start_sec: f64,
    pub end_sec: f64,
}

/// Optional hints the generator may echo back; never enforced.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_duration_sec: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_duration_per_asset_sec: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_all_assets_used: Option<bool>,
}

/// Outcome of one validator pass. Any error means invalid.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn joined_errors(&self) -> String {
        self.errors.join("; ")
    }
}

/// Rules applied by the semantic validator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticRules {
    pub expected_duration_sec: f64,
    pub min_duration_per_asset_sec: f64,
    pub require_all_assets_used: bool,
}

impl Default for SemanticRules {
    fn default() -> Self {
        Self {
            expected_duration_sec: 30.0,
            min_duration_per_asset_sec: 1.0,
            require_all_assets_used: true,
        }
    }
}
