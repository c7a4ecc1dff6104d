// orderflow/src/lib.rs

//! orderflow: an asynchronous step-flow engine for storefront operations.
//!
//! A flow is an ordered list of named steps over shared state. Each step has
//!  - `on` handlers followed by `after` handlers,
//!  - a failure policy: `Required` steps abort the flow, `BestEffort` steps
//!    log their failure and let the flow continue,
//!  - an optional time budget enforced with `tokio::time::timeout`,
//!  - an optional skip condition evaluated against the current state.
//!
//! Flows are registered in a `FlowRegistry` keyed by their state type.

pub mod core;
pub mod error;
pub mod flow;
pub mod registry;

pub use crate::core::control::{FlowControl, FlowOutcome};
pub use crate::core::handler::Handler;
pub use crate::core::state::FlowState;
pub use crate::core::step::{SkipCondition, StepDef, StepPolicy};
pub use crate::error::{FlowError, FlowResult};
pub use crate::flow::Flow;
pub use crate::registry::FlowRegistry;
