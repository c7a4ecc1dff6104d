// orderflow/src/error.rs
use anyhow::Error as AnyhowError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the flow engine itself.
///
/// Application flows usually carry their own error type; it must implement
/// `From<FlowError>` so engine failures (missing handlers, timeouts, registry
/// misses) surface through the same channel as business errors.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Handler missing for required step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Step '{step_name}' did not finish within {timeout:?}")]
  StepTimedOut { step_name: String, timeout: Duration },

  #[error("No flow registered for state type {type_name}")]
  NotRegistered { type_name: &'static str },

  #[error("State type mismatch during registry dispatch (expected {expected_type})")]
  TypeMismatch { expected_type: &'static str },

  #[error("Error in step handler. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal flow error: {0}")]
  Internal(String),
}

impl FlowError {
  /// True when the error was produced by a step exceeding its time budget.
  pub fn is_timeout(&self) -> bool {
    matches!(self, FlowError::StepTimedOut { .. })
  }
}

impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    match err.downcast::<FlowError>() {
      Ok(flow_err) => flow_err,
      Err(source) => FlowError::HandlerError { source },
    }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
