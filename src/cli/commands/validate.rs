use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::PathBuf;

use super::Command;
use crate::config::config;
use crate::story_script::{validate_semantics, validate_structure, SemanticRules, ValidationResult};

pub struct ValidateCommand {
    pub script: PathBuf,
    duration: Option<f64>,
    min_segment: Option<f64>,
    allow_unused_assets: bool,
}

impl ValidateCommand {
    pub fn new(script: PathBuf) -> Self {
        Self {
            script,
            duration: None,
            min_segment: None,
            allow_unused_assets: false,
        }
    }

    pub fn with_duration(mut self, duration: Option<f64>) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_min_segment(mut self, min_segment: Option<f64>) -> Self {
        self.min_segment = min_segment;
        self
    }

    pub fn with_allow_unused_assets(mut self, allow: bool) -> Self {
        self.allow_unused_assets = allow;
        self
    }

    fn rules(&self) -> SemanticRules {
        // Fall back to built-in rules when no configuration can be loaded.
        let mut rules = config()
            .map(|c| SemanticRules::from(c.generation.constraints()))
            .unwrap_or_default();
        if let Some(duration) = self.duration {
            rules.expected_duration_sec = duration;
        }
        if let Some(min_segment) = self.min_segment {
            rules.min_duration_per_asset_sec = min_segment;
        }
        if self.allow_unused_assets {
            rules.require_all_assets_used = false;
        }
        rules
    }

    /// Runs both validators. Semantic checks only run on a structurally
    /// valid script.
    pub fn check(&self, value: &Value) -> ValidationResult {
        match validate_structure(value).into_script() {
            Ok(script) => validate_semantics(&script, &self.rules()),
            Err(result) => result,
        }
    }
}

impl Command for ValidateCommand {
    async fn execute(&self) -> Result<()> {
        let raw = tokio::fs::read_to_string(&self.script)
            .await
            .with_context(|| format!("failed to read {}", self.script.display()))?;
        let value: Value = serde_json::from_str(&raw)
            .with_context(|| format!("{} is not valid JSON", self.script.display()))?;

        let result = self.check(&value);
        if result.valid {
            println!("✅ {} is a valid story script", self.script.display());
            return Ok(());
        }

        println!("❌ {} is not a valid story script:", self.script.display());
        for error in &result.errors {
            println!("   • {error}");
        }
        bail!("story script is invalid ({} error(s))", result.errors.len())
    }
}
