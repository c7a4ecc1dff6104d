// storefront/src/state.rs

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines;
use crate::services::notifications::NotificationDispatcher;
use crate::store::Store;
use crate::web::rate_limit::RateLimiter;
use orderflow::FlowRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn Store>,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
  pub notifier: NotificationDispatcher,
  /// `None` when no shared counter store is configured.
  pub rate_limiter: Option<Arc<RateLimiter>>,
}

impl AppState {
  /// Assembles the state and registers every flow against it.
  pub fn new(
    store: Arc<dyn Store>,
    config: Arc<AppConfig>,
    notifier: NotificationDispatcher,
    rate_limiter: Option<Arc<RateLimiter>>,
  ) -> Self {
    let state = AppState {
      store,
      flows: Arc::new(FlowRegistry::new()),
      config,
      notifier,
      rate_limiter,
    };
    pipelines::register_all_pipelines(&state.flows, &state);
    state
  }
}
