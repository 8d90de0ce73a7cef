//! Shared builders for story scripts, fake collaborators and photo folders
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use storyreel::render::{CodeRenderOutcome, CodeRenderer, CodeStage, StageError, TemplateRenderer};
use storyreel::story_script::{Asset, GenerationRequest, StoryScript, StoryScriptClient};

pub fn assets(count: usize) -> Vec<Asset> {
    (1..=count)
        .map(|i| Asset::new(format!("img_{i:03}"), format!("/photos/{i:02}.jpg")))
        .collect()
}

/// A valid script that splits `total` seconds evenly across `assets`.
pub fn valid_script_json(assets: &[Asset], total: f64) -> Value {
    let step = total / assets.len() as f64;
    let timeline: Vec<Value> = assets
        .iter()
        .enumerate()
        .map(|(i, asset)| {
            json!({
                "assetId": asset.id,
                "startSec": step * i as f64,
                "endSec": step * (i + 1) as f64,
                "subtitleId": format!("s{}", i + 1),
            })
        })
        .collect();
    let subtitles: Vec<Value> = assets
        .iter()
        .enumerate()
        .map(|(i, _)| {
            json!({
                "id": format!("s{}", i + 1),
                "text": format!("Moment number {}", i + 1),
                "startSec": step * i as f64,
                "endSec": step * (i + 1) as f64,
            })
        })
        .collect();

    json!({
        "version": "1.0",
        "input": {
            "sourceDir": "/photos",
            "imageCount": assets.len(),
            "assets": assets,
        },
        "video": {"width": 1080, "height": 1920, "fps": 30, "durationSec": total},
        "style": {"preset": "cinematic"},
        "timeline": timeline,
        "subtitles": subtitles,
    })
}

pub fn valid_script(assets: &[Asset], total: f64) -> StoryScript {
    serde_json::from_value(valid_script_json(assets, total)).unwrap()
}

/// Replays canned agent answers and records every request it receives.
#[derive(Default)]
pub struct ScriptedClient {
    answers: Mutex<Vec<Result<Value, String>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedClient {
    pub fn new(answers: Vec<Result<Value, String>>) -> Self {
        let mut answers = answers;
        answers.reverse();
        Self {
            answers: Mutex::new(answers),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with the same value.
    pub fn repeating(answer: Value, times: usize) -> Self {
        Self::new(vec![Ok(answer); times])
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl StoryScriptClient for ScriptedClient {
    async fn generate_story_script(&self, request: &GenerationRequest) -> Result<Value> {
        self.requests.lock().unwrap().push(request.clone());
        match self.answers.lock().unwrap().pop() {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no more scripted answers")),
        }
    }
}

/// Template renderer that writes a fake video file, or fails with a fixed
/// message.
pub struct FakeTemplateRenderer {
    pub failure: Option<String>,
    pub calls: Mutex<u32>,
}

impl FakeTemplateRenderer {
    pub fn succeeding() -> Self {
        Self { failure: None, calls: Mutex::new(0) }
    }

    pub fn failing(message: &str) -> Self {
        Self { failure: Some(message.to_string()), calls: Mutex::new(0) }
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl TemplateRenderer for FakeTemplateRenderer {
    async fn render(&self, _script: &StoryScript, output_dir: &Path) -> Result<PathBuf> {
        *self.calls.lock().unwrap() += 1;
        if let Some(message) = &self.failure {
            return Err(anyhow!(message.clone()));
        }
        let video = output_dir.join("video.mp4");
        tokio::fs::write(&video, b"fake video").await?;
        Ok(video)
    }
}

/// Generated-code renderer that always fails at the compile stage.
pub struct FailingCodeRenderer {
    pub calls: Mutex<u32>,
}

impl FailingCodeRenderer {
    pub fn new() -> Self {
        Self { calls: Mutex::new(0) }
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl CodeRenderer for FailingCodeRenderer {
    async fn render(&self, _script: &StoryScript, output_dir: &Path) -> CodeRenderOutcome {
        *self.calls.lock().unwrap() += 1;
        CodeRenderOutcome::Failed {
            generated_code_dir: output_dir.join("generated-code"),
            error: StageError::new(CodeStage::Compile, "syntactic error")
                .with_details("Story.tsx(3,1): error TS1005: ';' expected."),
        }
    }
}

/// Creates `count` tiny jpg files named 01.jpg, 02.jpg, ... in `dir`.
pub fn photo_folder(dir: &Path, count: usize) {
    for i in 1..=count {
        std::fs::write(dir.join(format!("{i:02}.jpg")), b"jpeg").unwrap();
    }
}
