//! Render stage: the render choice state machine, mode policies, the two
//! rendering strategies and the orchestrator that drives them.

pub mod adapters;
pub mod codegen;
pub mod policy;
pub mod stage;
pub mod state_machine;
pub mod template;

pub use adapters::{expand_placeholders, CodeRenderOutcome, CodeRenderer, CodeStage, StageError, TemplateRenderer};
#[cfg(any(test, feature = "testing"))]
pub use adapters::{MockCodeRenderer, MockTemplateRenderer};
pub use codegen::{GeneratedCodeRenderer, RenderCodeAuthor, CODE_SCRIPT_FILE, GENERATED_CODE_DIR};
#[cfg(any(test, feature = "testing"))]
pub use codegen::MockRenderCodeAuthor;
pub use policy::{ChannelPolicy, FallbackPolicy, ModeRequest, RenderDecision, RenderModePolicy, ScriptedPolicy};
pub use stage::{AttemptStatus, RenderAttemptRecord, RenderOutcome, RenderStage, RenderStageError};
pub use state_machine::{RenderChoiceMachine, RenderChoiceState, RenderFailure, RenderMode, TransitionError};
pub use template::{CommandTemplateRenderer, RENDER_INPUT_FILE};
