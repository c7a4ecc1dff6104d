// storefront/src/services/notifications/dispatcher.rs

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, info_span, warn, Instrument};

use super::mailer::{render_receipt, HttpMailApi, LogMailer, MailChannel};
use super::operator::{format_order_message, HttpMessagingGateway, LogMessenger, MessagingChannel};
use super::retry::{with_retry, RetryConfig};
use super::{NotificationError, OrderNotice};
use crate::config::NotificationConfig;
use crate::errors::{AppError, Result};

struct Worker {
  messenger: Arc<dyn MessagingChannel>,
  mailer: Arc<dyn MailChannel>,
  retry: RetryConfig,
  operator_destination: Option<String>,
  currency_symbol: String,
}

/// Hands committed orders to a background worker.
///
/// `notify` never waits on a collaborator: it only pushes onto a bounded
/// queue. The worker delivers each channel on its own task with per-attempt
/// timeouts and bounded retries, and only logs failures.
#[derive(Clone)]
pub struct NotificationDispatcher {
  tx: mpsc::Sender<OrderNotice>,
}

impl NotificationDispatcher {
  pub fn spawn(
    config: &NotificationConfig,
    messenger: Arc<dyn MessagingChannel>,
    mailer: Arc<dyn MailChannel>,
  ) -> (Self, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
    let worker = Arc::new(Worker {
      messenger,
      mailer,
      retry: RetryConfig::from(config),
      operator_destination: config.operator_destination.clone(),
      currency_symbol: config.currency_symbol.clone(),
    });
    let handle = tokio::spawn(run(worker, rx));
    (Self { tx }, handle)
  }

  /// Picks HTTP collaborators where they are configured and logging
  /// stand-ins elsewhere.
  pub fn from_config(config: &NotificationConfig) -> Result<(Self, JoinHandle<()>)> {
    let client = reqwest::Client::builder()
      .connect_timeout(config.attempt_timeout)
      .timeout(config.attempt_timeout + Duration::from_millis(100))
      .build()
      .map_err(|e| AppError::Config(format!("HTTP client: {}", e)))?;

    let messenger: Arc<dyn MessagingChannel> = match &config.messaging_gateway_url {
      Some(url) => Arc::new(HttpMessagingGateway::new(
        client.clone(),
        url.clone(),
        config.messaging_gateway_token.clone(),
      )),
      None => Arc::new(LogMessenger),
    };
    let mailer: Arc<dyn MailChannel> = match (&config.mail_api_url, &config.mail_api_key) {
      (Some(url), Some(key)) => Arc::new(HttpMailApi::new(
        client,
        url.clone(),
        key.clone(),
        config.mail_sender.clone(),
        config.mail_sender_name.clone(),
      )),
      _ => Arc::new(LogMailer),
    };
    info!(
      messaging_gateway = config.messaging_gateway_url.is_some(),
      mail_api = config.mail_api_url.is_some() && config.mail_api_key.is_some(),
      "Notification channels configured."
    );
    Ok(Self::spawn(config, messenger, mailer))
  }

  pub fn notify(&self, notice: OrderNotice) -> std::result::Result<(), NotificationError> {
    self.tx.try_send(notice).map_err(|e| match e {
      mpsc::error::TrySendError::Full(_) => NotificationError::QueueFull,
      mpsc::error::TrySendError::Closed(_) => NotificationError::QueueClosed,
    })
  }
}

async fn run(worker: Arc<Worker>, mut rx: mpsc::Receiver<OrderNotice>) {
  info!("Notification worker started.");
  while let Some(notice) = rx.recv().await {
    let notice = Arc::new(notice);
    let span = info_span!("order_notifications", order_number = %notice.order.order_number);
    tokio::spawn(deliver_operator_summary(worker.clone(), notice.clone()).instrument(span.clone()));
    tokio::spawn(deliver_receipt(worker.clone(), notice).instrument(span));
  }
  info!("Notification queue closed; worker stopped.");
}

async fn deliver_operator_summary(worker: Arc<Worker>, notice: Arc<OrderNotice>) {
  let Some(destination) = worker.operator_destination.as_deref() else {
    warn!("No operator destination configured; skipping operator message.");
    return;
  };
  let body = format_order_message(&notice, &worker.currency_symbol);
  let messenger = &worker.messenger;
  let body = body.as_str();
  if with_retry(&worker.retry, "operator", move || messenger.send(destination, body))
    .await
    .is_ok()
  {
    info!("Operator notified.");
  }
}

async fn deliver_receipt(worker: Arc<Worker>, notice: Arc<OrderNotice>) {
  let mail = match render_receipt(&notice, &worker.currency_symbol) {
    Ok(mail) => mail,
    Err(e) => {
      warn!(error = %e, "Skipping receipt email.");
      return;
    }
  };
  let mailer = &worker.mailer;
  let mail = &mail;
  if with_retry(&worker.retry, "mail", move || mailer.send(mail)).await.is_ok() {
    info!("Receipt email sent.");
  }
}
