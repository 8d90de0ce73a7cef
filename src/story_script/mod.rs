//! Story script model, validators and the generation retry loop.
//!
//! Generated scripts pass through two gates before anything renders them:
//! [`validate_structure`] narrows an untrusted JSON value into a
//! [`StoryScript`], then [`validate_semantics`] checks timing and coverage.

pub mod generator;
pub mod semantics;
pub mod structure;
pub mod types;

pub use generator::{
    generate_story_script, GeneratedScript, GenerationConstraints, GenerationError,
    GenerationOptions, GenerationRequest, StoryScriptClient,
};
#[cfg(any(test, feature = "testing"))]
pub use generator::MockStoryScriptClient;
pub use semantics::{validate_semantics, DURATION_TOLERANCE_SEC};
pub use structure::{validate_structure, StructureReport};
pub use types::{
    Asset, ScriptInput, SemanticRules, StoryScript, Style, Subtitle, TimelineItem,
    ValidationHints, ValidationResult, VideoSpec,
};
