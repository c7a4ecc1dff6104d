// orderflow/src/registry.rs

//! A type-keyed registry of flows.
//!
//! Each flow is registered under the type of its state, so callers run a flow
//! by handing the registry a `FlowState<TData>`; the matching flow is found
//! through `TypeId::of::<TData>()`.

use crate::core::control::FlowOutcome;
use crate::core::state::FlowState;
use crate::error::FlowError;
use crate::flow::Flow;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, Level};

#[async_trait]
trait ErasedFlow<AppErr>: Send + Sync
where
  AppErr: std::error::Error + Send + Sync + 'static,
{
  fn name(&self) -> &str;

  async fn run_erased(&self, state: Box<dyn Any + Send>) -> Result<FlowOutcome, AppErr>;
}

struct RegisteredFlow<TData, FlowErr, AppErr>
where
  TData: 'static + Send + Sync,
  FlowErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  flow: Flow<TData, FlowErr>,
  _app_err: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<TData, FlowErr, AppErr> ErasedFlow<AppErr> for RegisteredFlow<TData, FlowErr, AppErr>
where
  TData: 'static + Send + Sync,
  FlowErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<FlowErr> + From<FlowError> + Send + Sync + 'static,
{
  fn name(&self) -> &str {
    self.flow.name()
  }

  async fn run_erased(&self, state: Box<dyn Any + Send>) -> Result<FlowOutcome, AppErr> {
    let state = match state.downcast::<FlowState<TData>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        let expected_type = std::any::type_name::<FlowState<TData>>();
        event!(Level::ERROR, expected_type, "Flow state type mismatch.");
        return Err(AppErr::from(FlowError::TypeMismatch { expected_type }));
      }
    };
    self.flow.run(state).await.map_err(AppErr::from)
  }
}

/// Registry returning `AppErr` from every run.
pub struct FlowRegistry<AppErr = FlowError>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  flows: RwLock<HashMap<TypeId, Arc<dyn ErasedFlow<AppErr>>>>,
}

impl<AppErr> FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      flows: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `flow` for its state type, replacing any earlier registration.
  pub fn register<TData, FlowErr>(&self, flow: Flow<TData, FlowErr>)
  where
    TData: 'static + Send + Sync,
    FlowErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
    AppErr: From<FlowErr>,
  {
    event!(Level::DEBUG, flow = %flow.name(), state_type = %std::any::type_name::<TData>(), "Registering flow.");
    let entry = RegisteredFlow::<TData, FlowErr, AppErr> {
      flow,
      _app_err: PhantomData,
    };
    if let Some(previous) = self.flows.write().insert(TypeId::of::<TData>(), Arc::new(entry)) {
      event!(Level::WARN, replaced = %previous.name(), "Flow registration replaced an existing flow.");
    }
  }

  pub fn is_registered<TData: 'static + Send + Sync>(&self) -> bool {
    self.flows.read().contains_key(&TypeId::of::<TData>())
  }

  /// Runs the flow registered for `TData`.
  pub async fn run<TData>(&self, state: FlowState<TData>) -> Result<FlowOutcome, AppErr>
  where
    TData: 'static + Send + Sync,
  {
    let flow = self.flows.read().get(&TypeId::of::<TData>()).cloned();
    let flow = flow.ok_or_else(|| {
      let type_name = std::any::type_name::<TData>();
      event!(Level::ERROR, state_type = type_name, "No flow registered.");
      AppErr::from(FlowError::NotRegistered { type_name })
    })?;
    event!(Level::DEBUG, flow = %flow.name(), "Dispatching flow.");
    flow.run_erased(Box::new(state)).await
  }
}

impl<AppErr> Default for FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}
