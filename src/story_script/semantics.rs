use std::collections::HashSet;

use super::types::{SemanticRules, StoryScript, ValidationResult};

/// Absolute tolerance used when comparing the summed timeline duration.
pub const DURATION_TOLERANCE_SEC: f64 = 1e-6;

/// Checks timing and coverage invariants of a structurally valid script.
///
/// Ordering, gaps and overlaps between timeline items are not checked.
pub fn validate_semantics(script: &StoryScript, rules: &SemanticRules) -> ValidationResult {
    let mut errors = Vec::new();

    let total: f64 = script.timeline.iter().map(|item| item.duration_sec()).sum();
    if (total - rules.expected_duration_sec).abs() > DURATION_TOLERANCE_SEC {
        errors.push(format!(
            "timeline total duration must be {}s, got {}s",
            rules.expected_duration_sec, total
        ));
    }

    for (index, item) in script.timeline.iter().enumerate() {
        let duration = item.duration_sec();
        if duration < rules.min_duration_per_asset_sec {
            errors.push(format!(
                "timeline[{index}] duration {duration}s is below the minimum of {}s",
                rules.min_duration_per_asset_sec
            ));
        }
        if item.end_sec <= item.start_sec {
            errors.push(format!(
                "timeline[{index}] endSec ({}) must be greater than startSec ({})",
                item.end_sec, item.start_sec
            ));
        }
    }

    if rules.require_all_assets_used {
        let used: HashSet<&str> = script
            .timeline
            .iter()
            .map(|item| item.asset_id.as_str())
            .collect();
        let mut reported = HashSet::new();
        for asset in &script.input.assets {
            if !used.contains(asset.id.as_str()) && reported.insert(asset.id.as_str()) {
                errors.push(format!("asset {} is not used in the timeline", asset.id));
            }
        }
    }

    ValidationResult::from_errors(errors)
}
