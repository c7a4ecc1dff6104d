// orderflow/src/core/mod.rs

pub mod control;
pub mod handler;
pub mod state;
pub mod step;

pub use control::{FlowControl, FlowOutcome};
pub use handler::Handler;
pub use state::FlowState;
pub use step::{SkipCondition, StepDef, StepPolicy};
