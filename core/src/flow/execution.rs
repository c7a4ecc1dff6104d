// orderflow/src/flow/execution.rs

use crate::core::control::{FlowControl, FlowOutcome};
use crate::core::handler::Handler;
use crate::core::state::FlowState;
use crate::core::step::{StepDef, StepPolicy};
use crate::error::FlowError;
use crate::flow::definition::Flow;
use tracing::{event, info_span, instrument, Instrument, Level};

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step in declaration order.
  ///
  /// A `Required` step that fails or exceeds its timeout ends the run with
  /// that error. A `BestEffort` step's failure is logged and skipped over.
  #[instrument(
    name = "Flow::run",
    skip_all,
    fields(flow = %self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, state: FlowState<TData>) -> Result<FlowOutcome, Err> {
    event!(Level::DEBUG, "Flow starting.");

    for (step_idx, step) in self.steps.iter().enumerate() {
      let span = info_span!("flow_step", step = %step.name, step_index = step_idx, policy = ?step.policy);

      if let Some(skip) = &step.skip_if {
        if skip(&state) {
          event!(parent: &span, Level::INFO, "Step skipped by its skip condition.");
          continue;
        }
      }

      let has_handlers = self.on.get(&step.name).is_some_and(|v| !v.is_empty());
      if !has_handlers {
        match step.policy {
          StepPolicy::BestEffort => {
            event!(parent: &span, Level::DEBUG, "Best-effort step has no handlers, skipping.");
            continue;
          }
          StepPolicy::Required => {
            event!(parent: &span, Level::ERROR, "Required step has no 'on' handlers.");
            return Err(Err::from(FlowError::HandlerMissing {
              step_name: step.name.clone(),
            }));
          }
        }
      }

      match self.run_step(step, state.clone()).instrument(span.clone()).await {
        Ok(FlowControl::Continue) => {}
        Ok(FlowControl::Stop) => {
          event!(parent: &span, Level::INFO, "Flow stopped by step.");
          return Ok(FlowOutcome::Stopped);
        }
        Err(e) if step.policy == StepPolicy::BestEffort => {
          event!(parent: &span, Level::WARN, error = %e, "Best-effort step failed; continuing.");
        }
        Err(e) => {
          event!(parent: &span, Level::ERROR, error = %e, "Required step failed; aborting flow.");
          return Err(e);
        }
      }
    }

    event!(Level::DEBUG, "Flow completed.");
    Ok(FlowOutcome::Completed)
  }

  async fn run_step(&self, step: &StepDef<TData>, state: FlowState<TData>) -> Result<FlowControl, Err> {
    let work = async {
      let on_result = match self.on.get(&step.name) {
        Some(handlers) => run_handlers(handlers, &state, "on").await,
        None => Ok(FlowControl::Continue),
      };
      match (on_result, self.after.get(&step.name)) {
        (Ok(FlowControl::Continue), Some(handlers)) => run_handlers(handlers, &state, "after").await,
        (on_result, _) => on_result,
      }
    };

    match step.timeout {
      Some(limit) => match tokio::time::timeout(limit, work).await {
        Ok(result) => result,
        Err(_) => Err(Err::from(FlowError::StepTimedOut {
          step_name: step.name.clone(),
          timeout: limit,
        })),
      },
      None => work.await,
    }
  }
}

async fn run_handlers<TData, Err>(
  handlers: &[Handler<TData, Err>],
  state: &FlowState<TData>,
  phase: &'static str,
) -> Result<FlowControl, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + Send + Sync + 'static,
{
  for (handler_idx, handler) in handlers.iter().enumerate() {
    event!(Level::TRACE, phase, handler_index = handler_idx, "Running handler.");
    if handler(state.clone()).await? == FlowControl::Stop {
      return Ok(FlowControl::Stop);
    }
  }
  Ok(FlowControl::Continue)
}
