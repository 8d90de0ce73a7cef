// Render mode selection policies.
//
// The render stage sends the current state snapshot and waits for a
// decision; policies never see or touch the machine itself.

use std::collections::VecDeque;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::state_machine::{RenderChoiceState, RenderMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderDecision {
    Render(RenderMode),
    Exit,
}

#[async_trait]
pub trait RenderModePolicy: Send {
    async fn choose(&mut self, state: &RenderChoiceState) -> RenderDecision;
}

/// Starts with a preferred mode and switches to the other mode after each
/// failure, giving up after `max_failures` failed attempts.
#[derive(Debug, Clone)]
pub struct FallbackPolicy {
    preferred: RenderMode,
    max_failures: usize,
    failures: usize,
}

impl FallbackPolicy {
    pub fn new(preferred: RenderMode) -> Self {
        Self {
            preferred,
            max_failures: 2,
            failures: 0,
        }
    }

    pub fn with_max_failures(mut self, max_failures: usize) -> Self {
        self.max_failures = max_failures;
        self
    }
}

#[async_trait]
impl RenderModePolicy for FallbackPolicy {
    async fn choose(&mut self, state: &RenderChoiceState) -> RenderDecision {
        match state.last_failure() {
            None => RenderDecision::Render(self.preferred),
            Some(failure) => {
                self.failures += 1;
                if self.failures >= self.max_failures {
                    debug!(failures = self.failures, "Fallback policy giving up");
                    RenderDecision::Exit
                } else {
                    RenderDecision::Render(failure.mode.other())
                }
            }
        }
    }
}

/// Replays a fixed list of decisions, then exits.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPolicy {
    decisions: VecDeque<RenderDecision>,
    seen: Vec<RenderChoiceState>,
}

impl ScriptedPolicy {
    pub fn new(decisions: impl IntoIterator<Item = RenderDecision>) -> Self {
        Self {
            decisions: decisions.into_iter().collect(),
            seen: Vec::new(),
        }
    }

    /// Every state snapshot this policy has been asked about.
    pub fn seen(&self) -> &[RenderChoiceState] {
        &self.seen
    }
}

#[async_trait]
impl RenderModePolicy for ScriptedPolicy {
    async fn choose(&mut self, state: &RenderChoiceState) -> RenderDecision {
        self.seen.push(state.clone());
        self.decisions.pop_front().unwrap_or(RenderDecision::Exit)
    }
}

/// A pending decision request carried over a [`ChannelPolicy`].
#[derive(Debug)]
pub struct ModeRequest {
    pub state: RenderChoiceState,
    pub reply: oneshot::Sender<RenderDecision>,
}

/// Forwards every decision to another task over a channel. A closed channel
/// or dropped reply counts as an exit.
#[derive(Debug, Clone)]
pub struct ChannelPolicy {
    requests: mpsc::Sender<ModeRequest>,
}

impl ChannelPolicy {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<ModeRequest>) {
        let (requests, receiver) = mpsc::channel(buffer.max(1));
        (Self { requests }, receiver)
    }
}

#[async_trait]
impl RenderModePolicy for ChannelPolicy {
    async fn choose(&mut self, state: &RenderChoiceState) -> RenderDecision {
        let (reply, response) = oneshot::channel();
        let request = ModeRequest {
            state: state.clone(),
            reply,
        };
        if self.requests.send(request).await.is_err() {
            return RenderDecision::Exit;
        }
        response.await.unwrap_or(RenderDecision::Exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::state_machine::RenderFailure;

    fn failed(mode: RenderMode) -> RenderChoiceState {
        RenderChoiceState::SelectMode {
            last_failure: Some(RenderFailure {
                mode,
                reason: "boom".to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn test_fallback_alternates_then_exits() {
        let mut policy = FallbackPolicy::new(RenderMode::Template).with_max_failures(3);
        assert_eq!(policy.choose(&RenderChoiceState::default()).await, RenderDecision::Render(RenderMode::Template));
        assert_eq!(policy.choose(&failed(RenderMode::Template)).await, RenderDecision::Render(RenderMode::AiCode));
        assert_eq!(policy.choose(&failed(RenderMode::AiCode)).await, RenderDecision::Render(RenderMode::Template));
        assert_eq!(policy.choose(&failed(RenderMode::Template)).await, RenderDecision::Exit);
    }

    #[tokio::test]
    async fn test_scripted_policy_records_states_and_exits_when_empty() {
        let mut policy = ScriptedPolicy::new([RenderDecision::Render(RenderMode::AiCode)]);
        assert_eq!(policy.choose(&RenderChoiceState::default()).await, RenderDecision::Render(RenderMode::AiCode));
        assert_eq!(policy.choose(&failed(RenderMode::AiCode)).await, RenderDecision::Exit);
        assert_eq!(policy.seen().len(), 2);
        assert_eq!(policy.seen()[1].last_failure().unwrap().mode, RenderMode::AiCode);
    }

    #[tokio::test]
    async fn test_channel_policy_round_trip() {
        let (mut policy, mut requests) = ChannelPolicy::new(1);

        let responder = tokio::spawn(async move {
            let request = requests.recv().await.unwrap();
            assert!(request.state.last_failure().is_some());
            request.reply.send(RenderDecision::Render(RenderMode::Template)).unwrap();
        });

        let decision = policy.choose(&failed(RenderMode::AiCode)).await;
        assert_eq!(decision, RenderDecision::Render(RenderMode::Template));
        responder.await.unwrap();
    }

    #[tokio::test]
    async fn test_channel_policy_exits_when_receiver_is_gone() {
        let (mut policy, requests) = ChannelPolicy::new(1);
        drop(requests);
        assert_eq!(policy.choose(&RenderChoiceState::default()).await, RenderDecision::Exit);
    }
}
