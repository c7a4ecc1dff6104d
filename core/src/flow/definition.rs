// orderflow/src/flow/definition.rs

use crate::core::handler::Handler;
use crate::core::step::StepDef;
use crate::error::FlowError;
use std::collections::HashMap;

/// An ordered list of named steps over state `TData`.
///
/// Each step may carry any number of `on` handlers followed by `after`
/// handlers. Handlers may return any error convertible into `Err`; the flow's
/// own failures arrive through `Err: From<FlowError>`.
pub struct Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new(name: impl Into<String>, steps: Vec<StepDef<TData>>) -> Self {
    let name = name.into();
    let mut seen = std::collections::HashSet::new();
    for step in &steps {
      if !seen.insert(step.name.as_str()) {
        panic!("Flow '{}' declares step '{}' twice.", name, step.name);
      }
    }
    Self {
      name,
      steps,
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn step_names(&self) -> impl Iterator<Item = &str> {
    self.steps.iter().map(|s| s.name.as_str())
  }

  pub fn step(&self, step_name: &str) -> Option<&StepDef<TData>> {
    self.steps.iter().find(|s| s.name == step_name)
  }

  // Registering a hook for an undeclared step is a wiring bug in the caller,
  // caught at startup.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if self.step(step_name).is_none() {
      panic!(
        "Flow '{}' setup error: step '{}' is not declared.",
        self.name, step_name
      );
    }
  }
}
