// StoryReel Library - photo folder to narrated video
// This exposes the core components for testing and embedding

pub mod agent;
pub mod artifacts;
pub mod cli;
pub mod config;
pub mod external;
pub mod fs;
pub mod intake;
pub mod render;
pub mod run_log;
pub mod story_script;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use artifacts::{ArtifactPublisher, FsArtifactPublisher, RunSummary};
pub use crate::config::{config, StoryReelConfig};
pub use render::{
    RenderChoiceMachine, RenderChoiceState, RenderDecision, RenderMode, RenderModePolicy, RenderStage,
    RenderStageError,
};
pub use run_log::RunLogs;
pub use story_script::{
    generate_story_script, validate_semantics, validate_structure, GenerationError, StoryScript,
    StoryScriptClient,
};
pub use telemetry::{create_run_span, generate_correlation_id, init_telemetry, shutdown_telemetry};
pub use workflow::{Workflow, WorkflowError, WorkflowSettings};
