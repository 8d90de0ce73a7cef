//! Integration tests for the render stage orchestrator
//!
//! The render adapters are fakes; policies are scripted or driven over a
//! channel the way an embedding application would drive them.

use std::sync::Arc;

use storyreel::render::{
    AttemptStatus, ChannelPolicy, FallbackPolicy, RenderChoiceMachine, RenderChoiceState, RenderDecision,
    RenderFailure, RenderMode, RenderStage, RenderStageError, ScriptedPolicy, TransitionError,
};
use storyreel::run_log::RunLogs;
use tempfile::TempDir;
use tokio::sync::mpsc;

mod fixtures;
use fixtures::{assets, valid_script, FailingCodeRenderer, FakeTemplateRenderer};

#[tokio::test]
async fn test_code_failure_then_template_success_keeps_generated_code() {
    let dir = TempDir::new().unwrap();
    let template = Arc::new(FakeTemplateRenderer::succeeding());
    let code = Arc::new(FailingCodeRenderer::new());
    let (notices, mut received) = mpsc::unbounded_channel();
    let stage = RenderStage::new(template.clone(), code.clone()).with_failure_notices(notices);

    let mut policy = ScriptedPolicy::new([
        RenderDecision::Render(RenderMode::AiCode),
        RenderDecision::Render(RenderMode::Template),
    ]);
    let mut logs = RunLogs::new();

    let outcome = stage
        .run(&valid_script(&assets(2), 30.0), dir.path(), &mut policy, &mut logs)
        .await
        .unwrap();

    assert_eq!(outcome.mode, RenderMode::Template);
    assert_eq!(outcome.video_path, dir.path().join("video.mp4"));
    let generated = outcome.generated_code_path.expect("generated code path retained");
    assert!(!generated.as_os_str().is_empty());

    let failure = received.try_recv().unwrap();
    assert_eq!(failure.mode, RenderMode::AiCode);
    assert!(failure.reason.starts_with("[compile] syntactic error"));
    assert!(failure.reason.contains("TS1005"));

    let failed: Vec<_> = outcome
        .attempts
        .iter()
        .filter(|a| a.status == AttemptStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].reason.is_some());

    assert_eq!(template.calls(), 1);
    assert_eq!(code.calls(), 1);
    assert!(logs.has_errors());
    assert_eq!(
        logs.run_lines().iter().filter(|l| l.contains("render_attempt {")).count(),
        4
    );
}

#[tokio::test]
async fn test_exit_without_failure_never_touches_renderers() {
    let dir = TempDir::new().unwrap();
    let template = Arc::new(FakeTemplateRenderer::succeeding());
    let code = Arc::new(FailingCodeRenderer::new());
    let stage = RenderStage::new(template.clone(), code.clone());

    let mut policy = ScriptedPolicy::new([RenderDecision::Exit]);
    let mut logs = RunLogs::new();

    let err = stage
        .run(&valid_script(&assets(1), 30.0), dir.path(), &mut policy, &mut logs)
        .await
        .unwrap_err();

    assert_eq!(err, RenderStageError::ExitedBeforeRender);
    assert!(err.to_string().contains("exited before successful rendering"));
    assert_eq!(template.calls(), 0);
    assert_eq!(code.calls(), 0);
}

#[tokio::test]
async fn test_fallback_policy_gives_up_after_both_modes_fail() {
    let dir = TempDir::new().unwrap();
    let stage = RenderStage::new(
        Arc::new(FakeTemplateRenderer::failing("remotion: composition not found")),
        Arc::new(FailingCodeRenderer::new()),
    );
    let mut policy = FallbackPolicy::new(RenderMode::Template);
    let mut logs = RunLogs::new();

    let err = stage
        .run(&valid_script(&assets(1), 30.0), dir.path(), &mut policy, &mut logs)
        .await
        .unwrap_err();

    match err {
        RenderStageError::ExitedAfterFailure { mode, reason } => {
            assert_eq!(mode, RenderMode::AiCode);
            assert!(reason.contains("syntactic error"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_channel_policy_sees_each_failure() {
    let dir = TempDir::new().unwrap();
    let stage = RenderStage::new(
        Arc::new(FakeTemplateRenderer::succeeding()),
        Arc::new(FailingCodeRenderer::new()),
    );
    let (mut policy, mut requests) = ChannelPolicy::new(1);

    let driver = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(request) = requests.recv().await {
            let decision = match request.state.last_failure() {
                None => RenderDecision::Render(RenderMode::AiCode),
                Some(_) => RenderDecision::Render(RenderMode::Template),
            };
            seen.push(request.state);
            let _ = request.reply.send(decision);
        }
        seen
    });

    let mut logs = RunLogs::new();
    let outcome = stage
        .run(&valid_script(&assets(1), 30.0), dir.path(), &mut policy, &mut logs)
        .await
        .unwrap();
    drop(policy);

    let seen = driver.await.unwrap();
    assert_eq!(outcome.mode, RenderMode::Template);
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], RenderChoiceState::default());
    assert_eq!(seen[1].last_failure().map(|f| f.mode), Some(RenderMode::AiCode));
}

#[test]
fn test_machine_rejects_out_of_order_transitions() {
    let mut machine = RenderChoiceMachine::new();
    assert!(matches!(
        machine.mark_success("video.mp4".into()),
        Err(TransitionError::Illegal { .. })
    ));
    assert!(matches!(machine.mark_failure("boom"), Err(TransitionError::Illegal { .. })));

    machine.select_mode(RenderMode::Template).unwrap();
    assert!(matches!(
        machine.select_mode(RenderMode::AiCode),
        Err(TransitionError::Illegal { .. })
    ));
    machine.mark_failure("boom").unwrap();
    assert_eq!(
        machine.state().last_failure(),
        Some(&RenderFailure {
            mode: RenderMode::Template,
            reason: "boom".to_string(),
        })
    );
}
