// storefront/src/main.rs

use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use storefront::config::{AppConfig, LogFormat};
use storefront::services::notifications::NotificationDispatcher;
use storefront::state::AppState;
use storefront::store::{MemoryStore, PgStore, Store};
use storefront::web::configure_app_routes;
use storefront::web::rate_limit::{enforce_rate_limit, RateLimiter};

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter) // RUST_LOG overrides the default level
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  let app_config = Arc::new(AppConfig::from_env()?);
  init_tracing(app_config.log_format);
  info!("Starting storefront server...");

  let store: Arc<dyn Store> = match &app_config.database_url {
    Some(_) => {
      let pg = PgStore::connect(&app_config).await?;
      info!("Successfully connected to the database.");
      if app_config.run_migrations {
        pg.migrate().await?;
      }
      if app_config.seed_db {
        warn!("SEED_DB only applies to the in-process store; ignoring.");
      }
      Arc::new(pg)
    }
    None => {
      warn!("DATABASE_URL is not set; using the in-process store. Data will not survive a restart.");
      let memory = MemoryStore::new();
      if app_config.seed_db {
        memory.seed_demo().await;
      }
      Arc::new(memory)
    }
  };

  let (notifier, _notification_worker) = NotificationDispatcher::from_config(&app_config.notifications)?;

  let rate_limiter = match &app_config.rate_limit {
    Some(cfg) => Some(Arc::new(RateLimiter::connect(cfg).await?)),
    None => {
      info!("REDIS_URL is not set; rate limiting disabled.");
      None
    }
  };

  let app_state = AppState::new(store, app_config.clone(), notifier, rate_limiter);

  let server_address = app_config.bind_address();
  info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(app_state.clone()))
      .wrap(middleware::from_fn(enforce_rate_limit))
      .wrap(TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await?;

  Ok(())
}
