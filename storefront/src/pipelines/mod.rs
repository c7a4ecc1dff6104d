// storefront/src/pipelines/mod.rs

//! Defines and registers the flows behind the storefront's write operations.

use crate::errors::AppError;
use crate::state::AppState;
use orderflow::FlowRegistry;

pub mod contexts;

pub mod cart_pipeline;
pub mod checkout_pipeline;

/// Registers every flow with `registry`. Called once at startup, and by tests
/// building their own state.
pub fn register_all_pipelines(registry: &FlowRegistry<AppError>, app_state: &AppState) {
  tracing::info!("Registering flows...");

  checkout_pipeline::register_checkout_pipeline(registry, app_state);
  cart_pipeline::register_add_to_cart_pipeline(registry, app_state);

  tracing::info!("All application flows registered.");
}
