// orderflow/src/flow/hooks.rs

use crate::core::control::FlowControl;
use crate::core::handler::Handler;
use crate::core::state::FlowState;
use crate::error::FlowError;
use crate::flow::definition::Flow;
use std::future::Future;

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Adds a main handler to `step_name`. Handlers run in registration order.
  pub fn on<F, HandlerErr>(&mut self, step_name: &str, handler_fn: impl Fn(FlowState<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<FlowControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler = box_handler(handler_fn);
    self.on.entry(step_name.to_string()).or_default().push(handler);
  }

  /// Adds a handler that runs after every `on` handler of `step_name` returned
  /// `Continue`. It shares the step's timeout and failure policy.
  pub fn after<F, HandlerErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(FlowState<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<FlowControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler = box_handler(handler_fn);
    self.after.entry(step_name.to_string()).or_default().push(handler);
  }
}

fn box_handler<TData, Err, F, HandlerErr>(
  handler_fn: impl Fn(FlowState<TData>) -> F + Send + Sync + 'static,
) -> Handler<TData, Err>
where
  TData: 'static + Send + Sync,
  F: Future<Output = Result<FlowControl, HandlerErr>> + Send + 'static,
  HandlerErr: Into<Err> + Send + Sync + 'static,
{
  Box::new(move |state| {
    let fut = handler_fn(state);
    Box::pin(async move { fut.await.map_err(Into::into) })
  })
}
