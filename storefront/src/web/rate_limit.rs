// storefront/src/web/rate_limit.rs

//! Sliding-window request limiting keyed by client address.
//!
//! Hits live in a Redis sorted set per client (score = arrival time in ms), so
//! every server instance sees the same window. When the counter store fails
//! the request is let through.

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{web, ResponseError};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RateLimitConfig;
use crate::errors::{AppError, Result};
use crate::state::AppState;

const KEY_PREFIX: &str = "rate_limit:";

/// Hits recorded for one key inside the current window, including the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hits {
  pub count: u64,
  pub oldest_ms: Option<i64>,
}

#[async_trait]
pub trait HitCounter: Send + Sync {
  async fn hit(&self, key: &str, now_ms: i64, window: Duration) -> Result<Hits>;
}

pub struct RedisHitCounter {
  conn: ConnectionManager,
}

impl RedisHitCounter {
  pub async fn connect(redis_url: &str) -> Result<Self> {
    let client = redis::Client::open(redis_url).map_err(|e| AppError::Config(format!("Invalid REDIS_URL: {}", e)))?;
    let conn = ConnectionManager::new(client)
      .await
      .map_err(|e| AppError::Storage(format!("Redis connection failed: {}", e)))?;
    Ok(Self { conn })
  }
}

#[async_trait]
impl HitCounter for RedisHitCounter {
  async fn hit(&self, key: &str, now_ms: i64, window: Duration) -> Result<Hits> {
    let window_ms = window.as_millis() as i64;
    let member = format!("{}-{}", now_ms, Uuid::new_v4());
    let mut conn = self.conn.clone();
    let (count, oldest): (u64, Vec<(String, f64)>) = redis::pipe()
      .atomic()
      .cmd("ZREMRANGEBYSCORE")
      .arg(key)
      .arg("-inf")
      .arg(now_ms - window_ms)
      .ignore()
      .cmd("ZADD")
      .arg(key)
      .arg(now_ms)
      .arg(&member)
      .ignore()
      .cmd("ZCARD")
      .arg(key)
      .cmd("ZRANGE")
      .arg(key)
      .arg(0)
      .arg(0)
      .arg("WITHSCORES")
      .cmd("PEXPIRE")
      .arg(key)
      .arg(window_ms)
      .ignore()
      .query_async(&mut conn)
      .await
      .map_err(|e| AppError::Storage(format!("Redis rate-limit update failed: {}", e)))?;
    Ok(Hits {
      count,
      oldest_ms: oldest.first().map(|(_, score)| *score as i64),
    })
  }
}

/// Counter kept in this process. Used when a single instance is enough, and
/// by tests.
#[derive(Default)]
pub struct InProcessHitCounter {
  hits: Mutex<HashMap<String, VecDeque<i64>>>,
}

#[async_trait]
impl HitCounter for InProcessHitCounter {
  async fn hit(&self, key: &str, now_ms: i64, window: Duration) -> Result<Hits> {
    let cutoff = now_ms - window.as_millis() as i64;
    let mut hits = self.hits.lock().await;
    let entry = hits.entry(key.to_string()).or_default();
    while entry.front().is_some_and(|t| *t <= cutoff) {
      entry.pop_front();
    }
    entry.push_back(now_ms);
    Ok(Hits {
      count: entry.len() as u64,
      oldest_ms: entry.front().copied(),
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Allowed { remaining: u64 },
  Limited { retry_after_secs: u64 },
}

pub struct RateLimiter {
  counter: Arc<dyn HitCounter>,
  max_requests: u64,
  window: Duration,
}

impl RateLimiter {
  pub fn new(counter: Arc<dyn HitCounter>, max_requests: u64, window: Duration) -> Self {
    Self {
      counter,
      max_requests,
      window,
    }
  }

  pub async fn connect(config: &RateLimitConfig) -> Result<Self> {
    let counter = RedisHitCounter::connect(&config.redis_url).await?;
    info!(
      max_requests = config.max_requests,
      window_secs = config.window.as_secs(),
      "Rate limiter connected to Redis."
    );
    Ok(Self::new(Arc::new(counter), config.max_requests, config.window))
  }

  pub async fn check(&self, client: &str) -> Decision {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let key = format!("{}{}", KEY_PREFIX, client);
    match self.counter.hit(&key, now_ms, self.window).await {
      Ok(hits) if hits.count > self.max_requests => {
        let window_ms = self.window.as_millis() as i64;
        let reopens_at = hits.oldest_ms.unwrap_or(now_ms) + window_ms;
        let retry_after_secs = ((reopens_at - now_ms).max(0) as u64).div_ceil(1000).max(1);
        Decision::Limited { retry_after_secs }
      }
      Ok(hits) => Decision::Allowed {
        remaining: self.max_requests - hits.count,
      },
      Err(e) => {
        warn!(error = %e, %client, "Rate-limit counter unavailable; allowing request.");
        Decision::Allowed { remaining: 0 }
      }
    }
  }
}

/// Middleware applied to the whole app. `/health` is never limited.
pub async fn enforce_rate_limit<B: MessageBody + 'static>(
  req: ServiceRequest,
  next: Next<B>,
) -> std::result::Result<ServiceResponse<EitherBody<B>>, actix_web::Error> {
  let limiter = req
    .app_data::<web::Data<AppState>>()
    .and_then(|state| state.rate_limiter.clone());
  let Some(limiter) = limiter.filter(|_| !req.path().ends_with("/health")) else {
    return next.call(req).await.map(ServiceResponse::map_into_left_body);
  };

  let client = req
    .connection_info()
    .realip_remote_addr()
    .unwrap_or("unknown")
    .to_string();
  match limiter.check(&client).await {
    Decision::Limited { retry_after_secs } => {
      debug!(%client, retry_after_secs, "Request rate limited.");
      let response = AppError::RateLimited { retry_after_secs }.error_response();
      Ok(req.into_response(response).map_into_right_body())
    }
    Decision::Allowed { .. } => next.call(req).await.map(ServiceResponse::map_into_left_body),
  }
}
