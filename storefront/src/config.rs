// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// `None` runs the server on the in-process store.
  pub database_url: Option<String>,
  pub db_max_connections: u32,
  pub run_migrations: bool,
  pub seed_db: bool,
  pub jwt_secret: String,
  pub storage_timeout: Duration,
  pub log_format: LogFormat,

  pub notifications: NotificationConfig,
  pub rate_limit: Option<RateLimitConfig>,

  pub low_stock_threshold: i32,
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
  pub enabled: bool,
  pub queue_capacity: usize,
  pub attempt_timeout: Duration,
  pub max_attempts: u32,
  pub initial_backoff: Duration,
  /// Where operator summaries go, e.g. the shop owner's phone number.
  pub operator_destination: Option<String>,
  pub messaging_gateway_url: Option<String>,
  pub messaging_gateway_token: Option<String>,
  pub mail_api_url: Option<String>,
  pub mail_api_key: Option<String>,
  pub mail_sender: String,
  pub mail_sender_name: String,
  pub currency_symbol: String,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
  pub redis_url: String,
  pub max_requests: u64,
  pub window: Duration,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    let config = Self::from_lookup(|key| env::var(key).ok())?;
    tracing::info!(
      in_process_store = config.database_url.is_none(),
      rate_limited = config.rate_limit.is_some(),
      "Application configuration loaded successfully."
    );
    Ok(config)
  }

  /// Builds the configuration from an arbitrary key lookup. `from_env` passes
  /// the process environment; tests pass a map.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let parse = |key: &str, default: &str| -> Result<String> { Ok(get(key).unwrap_or_else(|| default.to_string())) };

    let server_host = parse("SERVER_HOST", "127.0.0.1")?;
    let server_port = parse_value::<u16>("SERVER_PORT", &parse("SERVER_PORT", "8080")?)?;
    let database_url = get("DATABASE_URL");
    let db_max_connections = parse_value::<u32>("DB_MAX_CONNECTIONS", &parse("DB_MAX_CONNECTIONS", "10")?)?;
    let run_migrations = parse_value::<bool>("RUN_MIGRATIONS", &parse("RUN_MIGRATIONS", "false")?)?;
    let seed_db = parse_value::<bool>("SEED_DB", &parse("SEED_DB", "false")?)?;
    let jwt_secret = get("JWT_SECRET").ok_or_else(|| AppError::Config("Missing environment variable 'JWT_SECRET'".to_string()))?;
    let storage_timeout = millis("STORAGE_TIMEOUT_MS", &parse("STORAGE_TIMEOUT_MS", "5000")?)?;
    let log_format = match parse("LOG_FORMAT", "pretty")?.to_ascii_lowercase().as_str() {
      "pretty" | "text" => LogFormat::Pretty,
      "json" => LogFormat::Json,
      other => return Err(AppError::Config(format!("Invalid LOG_FORMAT: {}", other))),
    };

    let notifications = NotificationConfig {
      enabled: parse_value::<bool>("NOTIFICATIONS_ENABLED", &parse("NOTIFICATIONS_ENABLED", "true")?)?,
      queue_capacity: parse_value::<usize>("NOTIFY_QUEUE_CAPACITY", &parse("NOTIFY_QUEUE_CAPACITY", "256")?)?,
      attempt_timeout: millis("NOTIFY_ATTEMPT_TIMEOUT_MS", &parse("NOTIFY_ATTEMPT_TIMEOUT_MS", "5000")?)?,
      max_attempts: parse_value::<u32>("NOTIFY_MAX_ATTEMPTS", &parse("NOTIFY_MAX_ATTEMPTS", "3")?)?.max(1),
      initial_backoff: millis("NOTIFY_INITIAL_BACKOFF_MS", &parse("NOTIFY_INITIAL_BACKOFF_MS", "200")?)?,
      operator_destination: get("ADMIN_MESSAGING_DESTINATION"),
      messaging_gateway_url: get("MESSAGING_GATEWAY_URL"),
      messaging_gateway_token: get("MESSAGING_GATEWAY_TOKEN"),
      mail_api_url: get("MAIL_API_URL"),
      mail_api_key: get("MAIL_API_KEY"),
      mail_sender: parse("MAIL_SENDER", "no-reply@example.com")?,
      mail_sender_name: parse("MAIL_SENDER_NAME", "Storefront")?,
      currency_symbol: parse("CURRENCY_SYMBOL", "₹")?,
    };
    if notifications.queue_capacity == 0 {
      return Err(AppError::Config("NOTIFY_QUEUE_CAPACITY must be positive".to_string()));
    }

    let rate_limit = match get("REDIS_URL") {
      Some(redis_url) => Some(RateLimitConfig {
        redis_url,
        max_requests: parse_value::<u64>("RATE_LIMIT_MAX_REQUESTS", &parse("RATE_LIMIT_MAX_REQUESTS", "100")?)?,
        window: Duration::from_secs(parse_value::<u64>(
          "RATE_LIMIT_WINDOW_SECS",
          &parse("RATE_LIMIT_WINDOW_SECS", "900")?,
        )?),
      }),
      None => None,
    };

    let low_stock_threshold = parse_value::<i32>("LOW_STOCK_THRESHOLD", &parse("LOW_STOCK_THRESHOLD", "10")?)?;

    Ok(Self {
      server_host,
      server_port,
      database_url,
      db_max_connections,
      run_migrations,
      seed_db,
      jwt_secret,
      storage_timeout,
      log_format,
      notifications,
      rate_limit,
      low_stock_threshold,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e)))
}

fn millis(key: &str, raw: &str) -> Result<Duration> {
  parse_value::<u64>(key, raw).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| map.get(key).cloned()
  }

  #[test]
  fn defaults_apply_when_only_secret_is_set() {
    let cfg = AppConfig::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
    assert_eq!(cfg.bind_address(), "127.0.0.1:8080");
    assert!(cfg.database_url.is_none());
    assert_eq!(cfg.storage_timeout, Duration::from_secs(5));
    assert_eq!(cfg.notifications.max_attempts, 3);
    assert!(cfg.notifications.enabled);
    assert!(cfg.rate_limit.is_none());
    assert_eq!(cfg.low_stock_threshold, 10);
    assert_eq!(cfg.log_format, LogFormat::Pretty);
  }

  #[test]
  fn missing_secret_is_a_config_error() {
    let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
    assert!(matches!(err, AppError::Config(ref m) if m.contains("JWT_SECRET")));
  }

  #[test]
  fn redis_url_enables_rate_limiting() {
    let cfg = AppConfig::from_lookup(lookup(&[
      ("JWT_SECRET", "s"),
      ("REDIS_URL", "redis://127.0.0.1/"),
      ("RATE_LIMIT_MAX_REQUESTS", "5"),
      ("RATE_LIMIT_WINDOW_SECS", "60"),
    ]))
    .unwrap();
    let rl = cfg.rate_limit.unwrap();
    assert_eq!(rl.max_requests, 5);
    assert_eq!(rl.window, Duration::from_secs(60));
  }

  #[test]
  fn invalid_numbers_are_rejected() {
    let err = AppConfig::from_lookup(lookup(&[("JWT_SECRET", "s"), ("SERVER_PORT", "eighty")])).unwrap_err();
    assert!(matches!(err, AppError::Config(ref m) if m.contains("SERVER_PORT")));
  }
}
