// Structural validation of untrusted story script payloads.
//
// Every violation is collected; a malformed payload never panics or returns
// early past the root object check.

use serde_json::{Map, Value};

use super::types::{
    Asset, ScriptInput, StoryScript, Style, Subtitle, TimelineItem, ValidationHints,
    ValidationResult, VideoSpec,
};

/// Result of a structural check: the validation result plus, when valid,
/// the typed script.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureReport {
    pub result: ValidationResult,
    pub script: Option<StoryScript>,
}

impl StructureReport {
    pub fn is_valid(&self) -> bool {
        self.result.valid
    }

    pub fn into_script(self) -> Result<StoryScript, ValidationResult> {
        match self.script {
            Some(script) if self.result.valid => Ok(script),
            _ => Err(self.result),
        }
    }
}

pub fn validate_structure(value: &Value) -> StructureReport {
    let Some(root) = value.as_object() else {
        return StructureReport {
            result: ValidationResult::from_errors(vec![
                "story script must be a JSON object".to_string(),
            ]),
            script: None,
        };
    };

    let mut reader = FieldReader::default();

    let version = reader.non_empty_string(root, "version", "version");
    let input = read_input(&mut reader, root);
    let video = read_video(&mut reader, root);
    let style = read_style(&mut reader, root);
    let timeline = read_timeline(&mut reader, root);
    let subtitles = read_subtitles(&mut reader, root);

    // Hints are advisory; a malformed hints block is dropped rather than reported.
    let validation = root
        .get("validation")
        .and_then(|hints| serde_json::from_value::<ValidationHints>(hints.clone()).ok());

    let result = ValidationResult::from_errors(reader.errors);
    let script = match (version, input, video, style, timeline, subtitles) {
        (Some(version), Some(input), Some(video), Some(style), Some(timeline), Some(subtitles))
            if result.valid =>
        {
            Some(StoryScript {
                version,
                input,
                video,
                style,
                timeline,
                subtitles,
                validation,
            })
        }
        _ => None,
    };

    StructureReport { result, script }
}

fn read_input(reader: &mut FieldReader, root: &Map<String, Value>) -> Option<ScriptInput> {
    let input = reader.object(root, "input", "input")?;

    let source_dir = reader.non_empty_string(input, "sourceDir", "input.sourceDir");
    let image_count = reader.positive_integer(input, "imageCount", "input.imageCount");
    let assets = reader
        .non_empty_array(input, "assets", "input.assets")
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let path = format!("input.assets[{index}]");
                    let asset = reader.element_object(item, &path)?;
                    let id = reader.non_empty_string(asset, "id", &format!("{path}.id"));
                    let file = reader.non_empty_string(asset, "path", &format!("{path}.path"));
                    Some(Asset::new(id?, file?))
                })
                .collect::<Vec<_>>()
        });

    let assets: Option<Vec<Asset>> = assets.and_then(|items| items.into_iter().collect());
    Some(ScriptInput {
        source_dir: source_dir?,
        image_count: image_count?,
        assets: assets?,
    })
}

fn read_video(reader: &mut FieldReader, root: &Map<String, Value>) -> Option<VideoSpec> {
    let video = reader.object(root, "video", "video")?;

    let width = reader.positive_integer(video, "width", "video.width");
    let height = reader.positive_integer(video, "height", "video.height");
    let fps = reader.positive_integer(video, "fps", "video.fps");
    let duration_sec = reader.positive_number(video, "durationSec", "video.durationSec");

    Some(VideoSpec {
        width: width?,
        height: height?,
        fps: fps?,
        duration_sec: duration_sec?,
    })
}

fn read_style(reader: &mut FieldReader, root: &Map<String, Value>) -> Option<Style> {
    let style = reader.object(root, "style", "style")?;
    let preset = reader.non_empty_string(style, "preset", "style.preset")?;
    let prompt = style
        .get("prompt")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(Style { preset, prompt })
}

fn read_timeline(reader: &mut FieldReader, root: &Map<String, Value>) -> Option<Vec<TimelineItem>> {
    let items = reader.non_empty_array(root, "timeline", "timeline")?;

    let parsed: Vec<Option<TimelineItem>> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let path = format!("timeline[{index}]");
            let entry = reader.element_object(item, &path)?;
            let asset_id = reader.non_empty_string(entry, "assetId", &format!("{path}.assetId"));
            let start_sec = reader.non_negative_number(entry, "startSec", &format!("{path}.startSec"));
            let end_sec = reader.positive_number(entry, "endSec", &format!("{path}.endSec"));
            let subtitle_id =
                reader.non_empty_string(entry, "subtitleId", &format!("{path}.subtitleId"));
            Some(TimelineItem {
                asset_id: asset_id?,
                start_sec: start_sec?,
                end_sec: end_sec?,
                subtitle_id: subtitle_id?,
            })
        })
        .collect();

    parsed.into_iter().collect()
}

fn read_subtitles(reader: &mut FieldReader, root: &Map<String, Value>) -> Option<Vec<Subtitle>> {
    let items = reader.non_empty_array(root, "subtitles", "subtitles")?;

    let parsed: Vec<Option<Subtitle>> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let path = format!("subtitles[{index}]");
            let entry = reader.element_object(item, &path)?;
            let id = reader.non_empty_string(entry, "id", &format!("{path}.id"));
            let text = reader.non_empty_string(entry, "text", &format!("{path}.text"));
            let start_sec = reader.non_negative_number(entry, "startSec", &format!("{path}.startSec"));
            let end_sec = reader.positive_number(entry, "endSec", &format!("{path}.endSec"));
            Some(Subtitle {
                id: id?,
                text: text?,
                start_sec: start_sec?,
                end_sec: end_sec?,
            })
        })
        .collect();

    parsed.into_iter().collect()
}

/// Reads typed fields out of JSON objects, recording one error per
/// violation and returning `None` for the offending field.
#[derive(Debug, Default)]
struct FieldReader {
    errors: Vec<String>,
}

impl FieldReader {
    fn fail<T>(&mut self, message: String) -> Option<T> {
        self.errors.push(message);
        None
    }

    fn object<'a>(
        &mut self,
        parent: &'a Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<&'a Map<String, Value>> {
        match parent.get(key) {
            Some(Value::Object(map)) => Some(map),
            _ => self.fail(format!("{path} must be an object")),
        }
    }

    fn element_object<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            _ => self.fail(format!("{path} must be an object")),
        }
    }

    fn non_empty_string(
        &mut self,
        parent: &Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<String> {
        match parent.get(key) {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text.clone()),
            _ => self.fail(format!("{path} must be a non-empty string")),
        }
    }

    fn non_empty_array<'a>(
        &mut self,
        parent: &'a Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<&'a Vec<Value>> {
        match parent.get(key) {
            Some(Value::Array(items)) if !items.is_empty() => Some(items),
            _ => self.fail(format!("{path} must be a non-empty array")),
        }
    }

    fn positive_integer(
        &mut self,
        parent: &Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<u32> {
        let parsed = parent.get(key).and_then(as_integer);
        match parsed {
            Some(number) if number >= 1 && number <= i64::from(u32::MAX) => u32::try_from(number).ok(),
            _ => self.fail(format!("{path} must be a positive integer")),
        }
    }

    fn positive_number(&mut self, parent: &Map<String, Value>, key: &str, path: &str) -> Option<f64> {
        match parent.get(key).and_then(as_finite) {
            Some(number) if number > 0.0 => Some(number),
            _ => self.fail(format!("{path} must be a positive number")),
        }
    }

    fn non_negative_number(
        &mut self,
        parent: &Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<f64> {
        match parent.get(key).and_then(as_finite) {
            Some(number) if number >= 0.0 => Some(number),
            _ => self.fail(format!("{path} must be a number >= 0")),
        }
    }
}

fn as_finite(value: &Value) -> Option<f64> {
    value.as_f64().filter(|number| number.is_finite())
}

// Accepts `3` and `3.0` alike, as JSON does not distinguish them.
fn as_integer(value: &Value) -> Option<i64> {
    if let Some(number) = value.as_i64() {
        return Some(number);
    }
    let number = as_finite(value)?;
    if number.fract() == 0.0 && number.abs() <= i64::MAX as f64 {
        Some(number as i64)
    } else {
        None
    }
}
