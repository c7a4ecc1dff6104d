// storefront/src/services/notifications/mailer.rs

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use super::{format_money, NotificationError, OrderNotice};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptMail {
  pub to_email: String,
  pub to_name: String,
  pub subject: String,
  pub html: String,
  pub text: String,
}

#[async_trait]
pub trait MailChannel: Send + Sync {
  async fn send(&self, mail: &ReceiptMail) -> Result<(), NotificationError>;
}

fn escape_html(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  for c in raw.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(c),
    }
  }
  out
}

/// Builds the customer receipt. Fails when the customer has no email address.
pub fn render_receipt(notice: &OrderNotice, currency_symbol: &str) -> Result<ReceiptMail, NotificationError> {
  let to_email = notice
    .customer
    .email
    .clone()
    .filter(|e| !e.trim().is_empty())
    .ok_or(NotificationError::MissingRecipient("customer email"))?;
  let order = &notice.order;
  let money = |cents: i64| format_money(cents, currency_symbol);

  let items_html: String = notice
    .items
    .iter()
    .map(|it| {
      format!(
        "<li>{} × {} - {}</li>",
        escape_html(&it.product_name),
        it.quantity,
        escape_html(&money(it.unit_price_cents))
      )
    })
    .collect();
  let html = format!(
    "<div>\
     <p>Hi {name},</p>\
     <p>Thank you for your order. Here are your details:</p>\
     <p><strong>Order #:</strong> {number}</p>\
     <ul>{items}</ul>\
     <p><strong>Total:</strong> {total}</p>\
     <p>Status: {status}</p>\
     <p>We will notify you when your order ships.</p>\
     </div>",
    name = escape_html(&notice.customer.name),
    number = escape_html(&order.order_number),
    items = items_html,
    total = escape_html(&money(order.total_amount_cents)),
    status = order.status,
  );

  let items_text: String = notice
    .items
    .iter()
    .map(|it| format!("- {} x {} - {}\n", it.product_name, it.quantity, money(it.unit_price_cents)))
    .collect();
  let text = format!(
    "Hi {},\n\nThank you for your order {}.\n\n{}\nTotal: {}\nStatus: {}\n",
    notice.customer.name,
    order.order_number,
    items_text,
    money(order.total_amount_cents),
    order.status,
  );

  Ok(ReceiptMail {
    to_email,
    to_name: notice.customer.name.clone(),
    subject: format!("Order Confirmation - {}", order.order_number),
    html,
    text,
  })
}

/// Transactional mail API taking a Brevo-style JSON body and an `api-key` header.
pub struct HttpMailApi {
  client: reqwest::Client,
  url: String,
  api_key: String,
  sender_email: String,
  sender_name: String,
}

impl HttpMailApi {
  pub fn new(
    client: reqwest::Client,
    url: impl Into<String>,
    api_key: impl Into<String>,
    sender_email: impl Into<String>,
    sender_name: impl Into<String>,
  ) -> Self {
    Self {
      client,
      url: url.into(),
      api_key: api_key.into(),
      sender_email: sender_email.into(),
      sender_name: sender_name.into(),
    }
  }
}

#[async_trait]
impl MailChannel for HttpMailApi {
  async fn send(&self, mail: &ReceiptMail) -> Result<(), NotificationError> {
    let payload = json!({
      "sender": { "name": self.sender_name, "email": self.sender_email },
      "to": [{ "email": mail.to_email, "name": mail.to_name }],
      "subject": mail.subject,
      "htmlContent": mail.html,
      "textContent": mail.text,
    });
    let response = self
      .client
      .post(&self.url)
      .header("api-key", &self.api_key)
      .json(&payload)
      .send()
      .await?;
    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(NotificationError::Rejected {
        status: status.as_u16(),
        body,
      });
    }
    info!(to = %mail.to_email, subject = %mail.subject, "Receipt email delivered.");
    Ok(())
  }
}

/// Used when no mail API is configured.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl MailChannel for LogMailer {
  async fn send(&self, mail: &ReceiptMail) -> Result<(), NotificationError> {
    info!(
      to = %mail.to_email,
      subject = %mail.subject,
      text = %mail.text,
      "Mail API not configured; receipt logged only."
    );
    Ok(())
  }
}
