// tests/flow_execution_tests.rs
mod common;

use common::*;
use orderflow::{Flow, FlowControl, FlowError, FlowOutcome, FlowState, StepDef};
use std::time::Duration;

fn three_step_flow() -> Flow<CheckoutTrace, TestError> {
  let mut flow = Flow::new(
    "trace",
    vec![
      StepDef::required("snapshot"),
      StepDef::required("commit"),
      StepDef::required("respond"),
    ],
  );
  flow.on("snapshot", recording_handler("snapshot"));
  flow.on("commit", recording_handler("commit"));
  flow.on("respond", recording_handler("respond"));
  flow
}

#[tokio::test]
async fn runs_steps_in_declaration_order() {
  setup_tracing();
  let flow = three_step_flow();
  let state = FlowState::new(CheckoutTrace::default());

  let outcome = flow.run(state.clone()).await.unwrap();

  assert_eq!(outcome, FlowOutcome::Completed);
  let guard = state.read();
  assert_eq!(guard.reserved_units, 3);
  assert_eq!(guard.steps_executed, vec!["snapshot", "commit", "respond"]);
}

#[tokio::test]
async fn stop_ends_the_flow_without_error() {
  setup_tracing();
  let flow = three_step_flow();
  let state = FlowState::new(CheckoutTrace {
    stop_at: Some("commit".to_string()),
    ..Default::default()
  });

  let outcome = flow.run(state.clone()).await.unwrap();

  assert_eq!(outcome, FlowOutcome::Stopped);
  assert_eq!(state.read().steps_executed, vec!["snapshot", "commit"]);
}

#[tokio::test]
async fn required_step_failure_aborts_remaining_steps() {
  setup_tracing();
  let mut flow = Flow::<CheckoutTrace, TestError>::new(
    "trace",
    vec![
      StepDef::required("snapshot"),
      StepDef::required("commit"),
      StepDef::required("respond"),
    ],
  );
  flow.on("snapshot", recording_handler("snapshot"));
  flow.on("commit", failing_handler("commit", "storage unavailable"));
  flow.on("respond", recording_handler("respond"));
  let state = FlowState::new(CheckoutTrace::default());

  let err = flow.run(state.clone()).await.unwrap_err();

  assert_eq!(err, TestError::Step("storage unavailable".to_string()));
  assert_eq!(state.read().steps_executed, vec!["snapshot", "commit"]);
}

#[tokio::test]
async fn best_effort_failure_is_swallowed() {
  setup_tracing();
  let mut flow = Flow::<CheckoutTrace, TestError>::new(
    "trace",
    vec![
      StepDef::required("commit"),
      StepDef::best_effort("notify"),
      StepDef::required("respond"),
    ],
  );
  flow.on("commit", recording_handler("commit"));
  flow.on("notify", failing_handler("notify", "mail relay down"));
  flow.on("respond", recording_handler("respond"));
  let state = FlowState::new(CheckoutTrace::default());

  let outcome = flow.run(state.clone()).await.unwrap();

  assert_eq!(outcome, FlowOutcome::Completed);
  assert_eq!(state.read().steps_executed, vec!["commit", "notify", "respond"]);
}

#[tokio::test]
async fn best_effort_step_without_handlers_is_skipped() {
  setup_tracing();
  let mut flow = Flow::<CheckoutTrace, TestError>::new(
    "trace",
    vec![StepDef::required("commit"), StepDef::best_effort("notify")],
  );
  flow.on("commit", recording_handler("commit"));
  let state = FlowState::new(CheckoutTrace::default());

  assert_eq!(flow.run(state).await.unwrap(), FlowOutcome::Completed);
}

#[tokio::test]
async fn required_step_without_handlers_is_reported() {
  setup_tracing();
  let flow = Flow::<CheckoutTrace, TestError>::new("trace", vec![StepDef::required("commit")]);

  let err = flow.run(FlowState::new(CheckoutTrace::default())).await.unwrap_err();

  match err {
    TestError::Flow(msg) => {
      assert!(msg.contains("HandlerMissing"));
      assert!(msg.contains("commit"));
    }
    other => panic!("expected a HandlerMissing flow error, got {:?}", other),
  }
}

#[tokio::test]
async fn skip_condition_bypasses_step() {
  setup_tracing();
  let mut flow = Flow::<CheckoutTrace, TestError>::new(
    "trace",
    vec![
      StepDef::required("commit"),
      StepDef::best_effort("notify").skip_when(|s: &FlowState<CheckoutTrace>| s.read().reserved_units > 0),
    ],
  );
  flow.on("commit", recording_handler("commit"));
  flow.on("notify", |state: FlowState<CheckoutTrace>| async move {
    state.write().receipt_sent = true;
    Ok::<_, TestError>(FlowControl::Continue)
  });
  let state = FlowState::new(CheckoutTrace::default());

  flow.run(state.clone()).await.unwrap();

  assert!(!state.read().receipt_sent);
}

#[tokio::test]
async fn after_handlers_run_once_on_handlers_continue() {
  setup_tracing();
  let mut flow = Flow::<CheckoutTrace, TestError>::new("trace", vec![StepDef::required("commit")]);
  flow.on("commit", recording_handler("commit"));
  flow.after("commit", |state: FlowState<CheckoutTrace>| async move {
    state.write().steps_executed.push("commit:after".to_string());
    Ok::<_, TestError>(FlowControl::Continue)
  });
  let state = FlowState::new(CheckoutTrace::default());

  flow.run(state.clone()).await.unwrap();

  assert_eq!(state.read().steps_executed, vec!["commit", "commit:after"]);
}

#[tokio::test(start_paused = true)]
async fn required_step_timeout_aborts() {
  setup_tracing();
  let mut flow = Flow::new(
    "trace",
    vec![
      StepDef::required("commit").with_timeout(Duration::from_millis(50)),
      StepDef::required("respond"),
    ],
  );
  flow.on("commit", |_state: FlowState<CheckoutTrace>| async move {
    tokio::time::sleep(Duration::from_secs(10)).await;
    Ok::<_, TestError>(FlowControl::Continue)
  });
  flow.on("respond", recording_handler("respond"));
  let state = FlowState::new(CheckoutTrace::default());

  let err = flow.run(state.clone()).await.unwrap_err();

  match err {
    TestError::Flow(msg) => assert!(msg.contains("StepTimedOut")),
    other => panic!("expected timeout, got {:?}", other),
  }
  assert!(state.read().steps_executed.is_empty());
}

#[tokio::test(start_paused = true)]
async fn best_effort_timeout_lets_flow_finish() {
  setup_tracing();
  let mut flow = Flow::<CheckoutTrace, TestError>::new(
    "trace",
    vec![
      StepDef::best_effort("notify").with_timeout(Duration::from_millis(50)),
      StepDef::required("respond"),
    ],
  );
  flow.on("notify", |_state: FlowState<CheckoutTrace>| async move {
    tokio::time::sleep(Duration::from_secs(10)).await;
    Ok::<_, TestError>(FlowControl::Continue)
  });
  flow.on("respond", recording_handler("respond"));
  let state = FlowState::new(CheckoutTrace::default());

  assert_eq!(flow.run(state.clone()).await.unwrap(), FlowOutcome::Completed);
  assert_eq!(state.read().steps_executed, vec!["respond"]);
}

#[tokio::test]
async fn flow_error_type_can_be_used_directly() {
  setup_tracing();
  let mut flow = Flow::<CheckoutTrace, FlowError>::new("trace", vec![StepDef::required("commit")]);
  flow.on("commit", |_state: FlowState<CheckoutTrace>| async move {
    Err::<FlowControl, _>(FlowError::Internal("ledger offline".to_string()))
  });

  let err = flow.run(FlowState::new(CheckoutTrace::default())).await.unwrap_err();

  assert!(matches!(err, FlowError::Internal(ref m) if m == "ledger offline"));
}

#[test]
#[should_panic(expected = "not declared")]
fn hook_for_unknown_step_panics_at_setup() {
  let mut flow = Flow::<CheckoutTrace, TestError>::new("trace", vec![StepDef::required("commit")]);
  flow.on("refund", recording_handler("refund"));
}

#[test]
#[should_panic(expected = "twice")]
fn duplicate_step_names_are_rejected() {
  let _ = Flow::<CheckoutTrace, TestError>::new(
    "trace",
    vec![StepDef::required("commit"), StepDef::required("commit")],
  );
}
