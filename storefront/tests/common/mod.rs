// storefront/tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::Level;
use uuid::Uuid;

use storefront::config::AppConfig;
use storefront::models::{Customer, Product};
use storefront::services::notifications::{
  MailChannel, MessagingChannel, NotificationDispatcher, NotificationError, ReceiptMail,
};
use storefront::state::AppState;
use storefront::store::MemoryStore;
use storefront::web::extractors::issue_token;
use storefront::web::rate_limit::RateLimiter;

pub const JWT_SECRET: &str = "test-secret";
pub const OPERATOR: &str = "+910000000001";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// Test configuration: fast retries, an operator destination, and
/// `overrides` applied last.
pub fn test_config(overrides: &[(&str, &str)]) -> AppConfig {
  let mut vars: HashMap<String, String> = [
    ("JWT_SECRET", JWT_SECRET),
    ("ADMIN_MESSAGING_DESTINATION", OPERATOR),
    ("NOTIFY_INITIAL_BACKOFF_MS", "1"),
    ("NOTIFY_ATTEMPT_TIMEOUT_MS", "500"),
    ("NOTIFY_MAX_ATTEMPTS", "3"),
    ("STORAGE_TIMEOUT_MS", "2000"),
  ]
  .into_iter()
  .map(|(k, v)| (k.to_string(), v.to_string()))
  .collect();
  for (k, v) in overrides {
    vars.insert(k.to_string(), v.to_string());
  }
  AppConfig::from_lookup(|key| vars.get(key).cloned()).expect("test config")
}

#[derive(Default)]
pub struct RecordingMessenger {
  pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl MessagingChannel for RecordingMessenger {
  async fn send(&self, to: &str, body: &str) -> Result<(), NotificationError> {
    self.sent.lock().unwrap().push((to.to_string(), body.to_string()));
    Ok(())
  }
}

#[derive(Default)]
pub struct RecordingMailer {
  pub sent: Mutex<Vec<ReceiptMail>>,
}

#[async_trait]
impl MailChannel for RecordingMailer {
  async fn send(&self, mail: &ReceiptMail) -> Result<(), NotificationError> {
    self.sent.lock().unwrap().push(mail.clone());
    Ok(())
  }
}

/// Fails every attempt and counts them.
#[derive(Default)]
pub struct FailingChannel {
  pub attempts: Mutex<u32>,
}

#[async_trait]
impl MessagingChannel for FailingChannel {
  async fn send(&self, _to: &str, _body: &str) -> Result<(), NotificationError> {
    *self.attempts.lock().unwrap() += 1;
    Err(NotificationError::Transport("gateway down".to_string()))
  }
}

#[async_trait]
impl MailChannel for FailingChannel {
  async fn send(&self, _mail: &ReceiptMail) -> Result<(), NotificationError> {
    *self.attempts.lock().unwrap() += 1;
    Err(NotificationError::Rejected {
      status: 503,
      body: "unavailable".to_string(),
    })
  }
}

/// Polls `check` until it holds or two seconds pass.
pub async fn eventually(check: impl Fn() -> bool) -> bool {
  for _ in 0..200 {
    if check() {
      return true;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  check()
}

pub struct Harness {
  pub state: AppState,
  pub store: MemoryStore,
  pub messenger: Arc<RecordingMessenger>,
  pub mailer: Arc<RecordingMailer>,
  pub customer_id: Uuid,
  pub admin_id: Uuid,
}

impl Harness {
  pub async fn new() -> Self {
    Self::with_config(test_config(&[])).await
  }

  pub async fn with_config(config: AppConfig) -> Self {
    let messenger = Arc::new(RecordingMessenger::default());
    let mailer = Arc::new(RecordingMailer::default());
    Self::build(config, messenger, mailer, None).await
  }

  pub async fn with_rate_limiter(limiter: RateLimiter) -> Self {
    let messenger = Arc::new(RecordingMessenger::default());
    let mailer = Arc::new(RecordingMailer::default());
    Self::build(test_config(&[]), messenger, mailer, Some(Arc::new(limiter))).await
  }

  async fn build(
    config: AppConfig,
    messenger: Arc<RecordingMessenger>,
    mailer: Arc<RecordingMailer>,
    rate_limiter: Option<Arc<RateLimiter>>,
  ) -> Self {
    setup_tracing();
    let (notifier, _worker) = NotificationDispatcher::spawn(&config.notifications, messenger.clone(), mailer.clone());
    Self::assemble(config, notifier, messenger, mailer, rate_limiter).await
  }

  /// Builds a harness around a caller-made dispatcher.
  pub async fn with_dispatcher(config: AppConfig, notifier: NotificationDispatcher) -> Self {
    setup_tracing();
    let messenger = Arc::new(RecordingMessenger::default());
    let mailer = Arc::new(RecordingMailer::default());
    Self::assemble(config, notifier, messenger, mailer, None).await
  }

  async fn assemble(
    config: AppConfig,
    notifier: NotificationDispatcher,
    messenger: Arc<RecordingMessenger>,
    mailer: Arc<RecordingMailer>,
    rate_limiter: Option<Arc<RateLimiter>>,
  ) -> Self {
    let store = MemoryStore::new();
    let customer_id = Uuid::new_v4();
    store
      .insert_customer(Customer {
        id: customer_id,
        name: "Asha Rao".to_string(),
        email: Some("asha@example.com".to_string()),
        phone: Some("+919800000000".to_string()),
        role: "customer".to_string(),
      })
      .await;
    let admin_id = Uuid::new_v4();
    store
      .insert_customer(Customer {
        id: admin_id,
        name: "Shop Owner".to_string(),
        email: Some("owner@example.com".to_string()),
        phone: None,
        role: "admin".to_string(),
      })
      .await;

    let state = AppState::new(Arc::new(store.clone()), Arc::new(config), notifier, rate_limiter);
    Harness {
      state,
      store,
      messenger,
      mailer,
      customer_id,
      admin_id,
    }
  }

  pub async fn add_product(&self, name: &str, price_cents: i64, discount_price_cents: Option<i64>, stock: i32) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now();
    self
      .store
      .insert_product(Product {
        id,
        name: name.to_string(),
        description: None,
        images: vec![format!("https://cdn.example.com/{}.jpg", id)],
        price_cents,
        discount_price_cents,
        stock_quantity: stock,
        is_active: true,
        created_at: now,
        updated_at: now,
      })
      .await;
    id
  }

  pub async fn add_customer(&self, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    self
      .store
      .insert_customer(Customer {
        id,
        name: name.to_string(),
        email: Some(format!("{}@example.com", id)),
        phone: None,
        role: "customer".to_string(),
      })
      .await;
    id
  }

  pub fn customer_token(&self) -> String {
    issue_token(JWT_SECRET, self.customer_id, "customer", chrono::Duration::minutes(10)).unwrap()
  }

  pub fn admin_token(&self) -> String {
    issue_token(JWT_SECRET, self.admin_id, "admin", chrono::Duration::minutes(10)).unwrap()
  }
}

pub fn address() -> storefront::models::ShippingAddress {
  storefront::models::ShippingAddress {
    full_name: Some("Asha Rao".to_string()),
    phone: Some("+919800000000".to_string()),
    address: "12 MG Road".to_string(),
    city: "Bengaluru".to_string(),
    state: "Karnataka".to_string(),
    pincode: "560001".to_string(),
  }
}
