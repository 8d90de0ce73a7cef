// Prompt construction for the generation agent.

use crate::config::VideoConfig;
use crate::story_script::{GenerationRequest, StoryScript};

/// Version tag the agent is asked to put in the script.
pub const SCRIPT_VERSION: &str = "1.0";

pub fn story_script_prompt(request: &GenerationRequest, video: &VideoConfig) -> String {
    let constraints = &request.constraints;
    let mut lines = vec![
        "You are writing the story script for a short narrated photo video.".to_string(),
        "Reply with a single JSON object and nothing else. No Markdown, no commentary.".to_string(),
        String::new(),
        format!("Source directory: {}", request.source_dir),
        format!("Photos ({}):", request.assets.len()),
    ];
    lines.extend(request.assets.iter().map(|asset| format!("- {}: {}", asset.id, asset.path)));
    lines.push(String::new());

    lines.push(format!("Style preset: {}", request.style.preset));
    if let Some(style_prompt) = &request.style.prompt {
        lines.push(format!("Style notes: {style_prompt}"));
    }
    lines.push(String::new());

    lines.extend([
        "Requirements:".to_string(),
        format!("- \"version\" is \"{SCRIPT_VERSION}\"."),
        format!(
            "- \"input\" has \"sourceDir\", \"imageCount\" ({}) and \"assets\" as listed above (objects with \"id\" and \"path\").",
            request.assets.len()
        ),
        format!(
            "- \"video\" is {{\"width\": {}, \"height\": {}, \"fps\": {}, \"durationSec\": {}}}.",
            video.width, video.height, video.fps, constraints.duration_sec
        ),
        "- \"style\" is {\"preset\": ...} with an optional \"prompt\".".to_string(),
        "- \"timeline\" is a list of {\"assetId\", \"startSec\", \"endSec\", \"subtitleId\"} segments, contiguous and non-overlapping, starting at 0.".to_string(),
        format!(
            "- Segment durations must add up to exactly {} seconds and each must last at least {} seconds.",
            constraints.duration_sec, constraints.min_duration_per_asset_sec
        ),
    ]);
    if constraints.require_all_assets_used {
        lines.push("- Every photo id must appear in the timeline at least once.".to_string());
    }
    lines.push(
        "- \"subtitles\" is a list of {\"id\", \"text\", \"startSec\", \"endSec\"}; every subtitleId must refer to one of them.".to_string(),
    );

    if !request.previous_errors.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "This is attempt {}. Earlier attempts were rejected for these reasons; fix all of them:",
            request.attempt
        ));
        lines.extend(request.previous_errors.iter().map(|error| format!("- {error}")));
    }

    let mut prompt = lines.join("\n");
    prompt.push('\n');
    prompt
}

pub fn render_code_prompt(script: &StoryScript, entry_file: &str) -> String {
    let script_json = serde_json::to_string_pretty(script).unwrap_or_default();
    format!(
        "Write the complete source of {entry_file}, a Remotion composition that renders the story script below.\n\
         Show each timeline segment's photo between its startSec and endSec with a gentle motion effect, \
         and overlay the matching subtitle text.\n\
         The composition reads the script from its input props; do not hard-code it.\n\
         Reply with the source code only, inside a single fenced code block.\n\n\
         Story script:\n{script_json}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story_script::{Asset, GenerationConstraints, Style};

    fn request(previous_errors: Vec<String>) -> GenerationRequest {
        GenerationRequest {
            source_dir: "/photos".to_string(),
            assets: vec![Asset::new("img_001", "/photos/a.jpg"), Asset::new("img_002", "/photos/b.jpg")],
            style: Style::preset("documentary").with_prompt("quiet, reflective"),
            constraints: GenerationConstraints::default(),
            attempt: previous_errors.len() as u32 + 1,
            previous_errors,
        }
    }

    fn video() -> VideoConfig {
        VideoConfig { width: 1080, height: 1920, fps: 30 }
    }

    #[test]
    fn test_prompt_lists_assets_style_and_constraints() {
        let prompt = story_script_prompt(&request(vec![]), &video());
        assert!(prompt.contains("- img_001: /photos/a.jpg"));
        assert!(prompt.contains("Style preset: documentary"));
        assert!(prompt.contains("Style notes: quiet, reflective"));
        assert!(prompt.contains("\"durationSec\": 30}"));
        assert!(prompt.contains("exactly 30 seconds"));
        assert!(prompt.contains("contiguous and non-overlapping"));
        assert!(prompt.contains("Every photo id must appear"));
        assert!(!prompt.contains("Earlier attempts"));
    }

    #[test]
    fn test_prompt_feeds_back_previous_errors() {
        let prompt = story_script_prompt(
            &request(vec!["attempt 1: timeline total duration must be 30s, got 28s".to_string()]),
            &video(),
        );
        assert!(prompt.contains("This is attempt 2."));
        assert!(prompt.contains("- attempt 1: timeline total duration must be 30s, got 28s"));
    }

    #[test]
    fn test_prompt_layout() {
        let prompt = story_script_prompt(&request(vec![]), &video());
        assert!(prompt.starts_with("You are writing the story script"));
        assert!(prompt.contains("no commentary.\n\nSource directory: /photos\nPhotos (2):\n- img_001"));
        assert!(prompt.contains("- img_002: /photos/b.jpg\n\nStyle preset: documentary\n"));
        assert!(prompt.contains("Style notes: quiet, reflective\n\nRequirements:\n- \"version\" is \"1.0\".\n"));
        assert!(prompt.contains("- \"style\" is {\"preset\": ...} with an optional \"prompt\"."));
        assert!(prompt.ends_with("every subtitleId must refer to one of them.\n"));
    }
}
