// storefront/src/services/notifications/mod.rs

//! Post-commit notifications: an operator summary over a messaging gateway and
//! a customer receipt over a mail API. Delivery is best-effort and never
//! reaches back into the order that triggered it.

use std::time::Duration;
use thiserror::Error;

use crate::models::{Customer, Order, OrderItemView};

pub mod dispatcher;
pub mod mailer;
pub mod operator;
pub mod retry;

pub use dispatcher::NotificationDispatcher;
pub use mailer::{HttpMailApi, LogMailer, MailChannel, ReceiptMail};
pub use operator::{HttpMessagingGateway, LogMessenger, MessagingChannel};
pub use retry::RetryConfig;

#[derive(Debug, Error)]
pub enum NotificationError {
  #[error("Notification queue is full")]
  QueueFull,

  #[error("Notification queue is closed")]
  QueueClosed,

  #[error("Transport error: {0}")]
  Transport(String),

  #[error("Collaborator rejected the request with status {status}: {body}")]
  Rejected { status: u16, body: String },

  #[error("Attempt timed out after {0:?}")]
  TimedOut(Duration),

  #[error("Missing recipient: {0}")]
  MissingRecipient(&'static str),
}

impl NotificationError {
  /// Transient failures worth another attempt.
  pub fn is_retryable(&self) -> bool {
    match self {
      NotificationError::Transport(_) | NotificationError::TimedOut(_) => true,
      NotificationError::Rejected { status, .. } => *status == 429 || *status >= 500,
      _ => false,
    }
  }
}

impl From<reqwest::Error> for NotificationError {
  fn from(err: reqwest::Error) -> Self {
    NotificationError::Transport(err.to_string())
  }
}

/// Everything both channels need about a committed order.
#[derive(Debug, Clone)]
pub struct OrderNotice {
  pub order: Order,
  pub customer: Customer,
  pub items: Vec<OrderItemView>,
}

pub fn format_money(cents: i64, currency_symbol: &str) -> String {
  let sign = if cents < 0 { "-" } else { "" };
  let abs = cents.unsigned_abs();
  format!("{}{}{}.{:02}", sign, currency_symbol, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn money_has_two_decimals() {
    assert_eq!(format_money(25_000, "₹"), "₹250.00");
    assert_eq!(format_money(5, "$"), "$0.05");
    assert_eq!(format_money(-1234, "$"), "-$12.34");
  }

  #[test]
  fn only_transient_failures_are_retried() {
    assert!(NotificationError::TimedOut(Duration::from_secs(1)).is_retryable());
    assert!(NotificationError::Rejected { status: 503, body: String::new() }.is_retryable());
    assert!(NotificationError::Rejected { status: 429, body: String::new() }.is_retryable());
    assert!(!NotificationError::Rejected { status: 400, body: String::new() }.is_retryable());
    assert!(!NotificationError::MissingRecipient("email").is_retryable());
  }
}
