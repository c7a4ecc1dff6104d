// tests/common/mod.rs
#![allow(dead_code)]

use orderflow::{FlowControl, FlowError, FlowState, Handler};
use tracing::Level;

/// A cut-down checkout record used to exercise the engine.
#[derive(Clone, Debug, Default)]
pub struct CheckoutTrace {
  pub reserved_units: i32,
  pub steps_executed: Vec<String>,
  pub stop_at: Option<String>,
  pub receipt_sent: bool,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("engine error: {0}")]
  Flow(String),

  #[error("step failed: {0}")]
  Step(String),
}

impl From<FlowError> for TestError {
  fn from(err: FlowError) -> Self {
    TestError::Flow(format!("{:?}", err))
  }
}

/// Records its own name and bumps `reserved_units`; stops when `stop_at`
/// names it.
pub fn recording_handler(step_name: &'static str) -> Handler<CheckoutTrace, TestError> {
  Box::new(move |state: FlowState<CheckoutTrace>| {
    Box::pin(async move {
      let mut guard = state.write();
      guard.reserved_units += 1;
      guard.steps_executed.push(step_name.to_string());
      if guard.stop_at.as_deref() == Some(step_name) {
        return Ok(FlowControl::Stop);
      }
      Ok(FlowControl::Continue)
    })
  })
}

pub fn failing_handler(step_name: &'static str, message: &'static str) -> Handler<CheckoutTrace, TestError> {
  Box::new(move |state: FlowState<CheckoutTrace>| {
    Box::pin(async move {
      state.write().steps_executed.push(step_name.to_string());
      Err(TestError::Step(message.to_string()))
    })
  })
}

use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
