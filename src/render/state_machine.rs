use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// The two mutually exclusive ways of turning a story script into video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Fixed, pre-built video template.
    Template,
    /// Render program generated by the agent for this run.
    AiCode,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Template => "template",
            RenderMode::AiCode => "ai_code",
        }
    }

    /// The strategy to fall back to when this one fails.
    pub fn other(&self) -> RenderMode {
        match self {
            RenderMode::Template => RenderMode::AiCode,
            RenderMode::AiCode => RenderMode::Template,
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "template" => Ok(RenderMode::Template),
            "ai_code" | "code" => Ok(RenderMode::AiCode),
            other => Err(format!("unknown render mode '{other}' (expected template or ai_code)")),
        }
    }
}

/// Which strategy failed last, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderFailure {
    pub mode: RenderMode,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RenderChoiceState {
    SelectMode {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_failure: Option<RenderFailure>,
    },
    Rendering {
        mode: RenderMode,
    },
    Completed {
        mode: RenderMode,
        video_path: PathBuf,
    },
}

impl Default for RenderChoiceState {
    fn default() -> Self {
        RenderChoiceState::SelectMode { last_failure: None }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("illegal render transition: {transition} is not allowed from the {state} state")]
    Illegal {
        transition: &'static str,
        state: &'static str,
    },
}

impl RenderChoiceState {
    pub fn name(&self) -> &'static str {
        match self {
            RenderChoiceState::SelectMode { .. } => "select_mode",
            RenderChoiceState::Rendering { .. } => "rendering",
            RenderChoiceState::Completed { .. } => "completed",
        }
    }

    pub fn last_failure(&self) -> Option<&RenderFailure> {
        match self {
            RenderChoiceState::SelectMode { last_failure } => last_failure.as_ref(),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RenderChoiceState::Completed { .. })
    }

    pub fn select_mode(&self, mode: RenderMode) -> Result<RenderChoiceState, TransitionError> {
        match self {
            RenderChoiceState::SelectMode { .. } => Ok(RenderChoiceState::Rendering { mode }),
            other => Err(other.illegal("select_mode")),
        }
    }

    pub fn mark_success(&self, video_path: PathBuf) -> Result<RenderChoiceState, TransitionError> {
        match self {
            RenderChoiceState::Rendering { mode } => Ok(RenderChoiceState::Completed {
                mode: *mode,
                video_path,
            }),
            other => Err(other.illegal("mark_success")),
        }
    }

    pub fn mark_failure(&self, reason: impl Into<String>) -> Result<RenderChoiceState, TransitionError> {
        match self {
            RenderChoiceState::Rendering { mode } => Ok(RenderChoiceState::SelectMode {
                last_failure: Some(RenderFailure {
                    mode: *mode,
                    reason: reason.into(),
                }),
            }),
            other => Err(other.illegal("mark_failure")),
        }
    }

    fn illegal(&self, transition: &'static str) -> TransitionError {
        TransitionError::Illegal {
            transition,
            state: self.name(),
        }
    }
}

/// Holds the render choice state for one run. Transitions from the wrong
/// state return [`TransitionError`] and leave the state untouched.
#[derive(Debug, Clone, Default)]
pub struct RenderChoiceMachine {
    state: RenderChoiceState,
}

impl RenderChoiceMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RenderChoiceState {
        &self.state
    }

    pub fn select_mode(&mut self, mode: RenderMode) -> Result<&RenderChoiceState, TransitionError> {
        let next = self.state.select_mode(mode)?;
        self.apply(next)
    }

    pub fn mark_success(&mut self, video_path: PathBuf) -> Result<&RenderChoiceState, TransitionError> {
        let next = self.state.mark_success(video_path)?;
        self.apply(next)
    }

    pub fn mark_failure(&mut self, reason: impl Into<String>) -> Result<&RenderChoiceState, TransitionError> {
        let next = self.state.mark_failure(reason)?;
        self.apply(next)
    }

    fn apply(&mut self, next: RenderChoiceState) -> Result<&RenderChoiceState, TransitionError> {
        info!(
            from_state = self.state.name(),
            to_state = next.name(),
            "Render choice transition"
        );
        self.state = next;
        Ok(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_starts_in_select_mode_without_failure() {
        let machine = RenderChoiceMachine::new();
        assert_eq!(machine.state(), &RenderChoiceState::SelectMode { last_failure: None });
        assert!(machine.state().last_failure().is_none());
    }

    #[test]
    fn test_success_path() {
        let mut machine = RenderChoiceMachine::new();
        machine.select_mode(RenderMode::Template).unwrap();
        assert_eq!(machine.state(), &RenderChoiceState::Rendering { mode: RenderMode::Template });

        machine.mark_success(PathBuf::from("/out/video.mp4")).unwrap();
        assert_eq!(
            machine.state(),
            &RenderChoiceState::Completed {
                mode: RenderMode::Template,
                video_path: PathBuf::from("/out/video.mp4"),
            }
        );
        assert!(machine.state().is_completed());
    }

    #[test]
    fn test_failure_preserves_mode_and_reason() {
        let mut machine = RenderChoiceMachine::new();
        machine.select_mode(RenderMode::AiCode).unwrap();
        machine.mark_failure("compile: syntax error").unwrap();

        let failure = machine.state().last_failure().unwrap();
        assert_eq!(failure.mode, RenderMode::AiCode);
        assert_eq!(failure.reason, "compile: syntax error");

        // A new selection is legal again after a failure.
        machine.select_mode(RenderMode::Template).unwrap();
        assert!(machine.state().last_failure().is_none());
    }

    #[test]
    fn test_illegal_transitions_fail_loudly_and_keep_state() {
        let mut machine = RenderChoiceMachine::new();

        let err = machine.mark_success(PathBuf::from("x.mp4")).unwrap_err();
        assert_eq!(
            err,
            TransitionError::Illegal {
                transition: "mark_success",
                state: "select_mode"
            }
        );
        assert!(machine.mark_failure("nope").is_err());
        assert_eq!(machine.state().name(), "select_mode");

        machine.select_mode(RenderMode::Template).unwrap();
        let err = machine.select_mode(RenderMode::AiCode).unwrap_err();
        assert_eq!(err.to_string(), "illegal render transition: select_mode is not allowed from the rendering state");
        assert_eq!(machine.state(), &RenderChoiceState::Rendering { mode: RenderMode::Template });

        machine.mark_success(PathBuf::from("v.mp4")).unwrap();
        assert!(machine.select_mode(RenderMode::Template).is_err());
        assert!(machine.mark_failure("late").is_err());
        assert!(machine.mark_success(PathBuf::from("again.mp4")).is_err());
    }

    #[test]
    fn test_render_mode_parsing_and_display() {
        assert_eq!("template".parse::<RenderMode>(), Ok(RenderMode::Template));
        assert_eq!("ai-code".parse::<RenderMode>(), Ok(RenderMode::AiCode));
        assert_eq!(" AI_CODE ".parse::<RenderMode>(), Ok(RenderMode::AiCode));
        assert!("exit".parse::<RenderMode>().is_err());
        assert_eq!(RenderMode::AiCode.to_string(), "ai_code");
        assert_eq!(RenderMode::Template.other(), RenderMode::AiCode);
        assert_eq!(serde_json::to_string(&RenderMode::AiCode).unwrap(), "\"ai_code\"");
    }
}
