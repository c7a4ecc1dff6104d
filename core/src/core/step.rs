// orderflow/src/core/step.rs

use super::FlowState;
use std::sync::Arc;
use std::time::Duration;

pub type SkipCondition<TData> = Arc<dyn Fn(&FlowState<TData>) -> bool + Send + Sync + 'static>;

/// What the engine does when a step fails or times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepPolicy {
  /// The failure aborts the flow and is returned to the caller.
  #[default]
  Required,
  /// The failure is logged and the flow moves on. A best-effort step with no
  /// handlers is skipped instead of reported as missing.
  BestEffort,
}

/// Declaration of one named step.
#[derive(Clone)]
pub struct StepDef<TData: 'static + Send + Sync> {
  pub name: String,
  pub policy: StepPolicy,
  /// Upper bound for all handlers of the step together.
  pub timeout: Option<Duration>,
  pub skip_if: Option<SkipCondition<TData>>,
}

impl<TData: 'static + Send + Sync> StepDef<TData> {
  pub fn required(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      policy: StepPolicy::Required,
      timeout: None,
      skip_if: None,
    }
  }

  pub fn best_effort(name: impl Into<String>) -> Self {
    Self {
      policy: StepPolicy::BestEffort,
      ..Self::required(name)
    }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  pub fn skip_when(mut self, condition: impl Fn(&FlowState<TData>) -> bool + Send + Sync + 'static) -> Self {
    self.skip_if = Some(Arc::new(condition));
    self
  }
}

impl<TData: 'static + Send + Sync> std::fmt::Debug for StepDef<TData> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("policy", &self.policy)
      .field("timeout", &self.timeout)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}
