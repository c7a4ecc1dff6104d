// orderflow/src/core/control.rs

/// Returned by every step handler to tell the engine what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
  Continue,
  /// Halt the flow without error. Remaining steps are not run.
  Stop,
}

/// How a flow run ended when no error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
  Completed,
  Stopped,
}
