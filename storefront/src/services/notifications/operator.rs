// storefront/src/services/notifications/operator.rs

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use super::{format_money, NotificationError, OrderNotice};

#[async_trait]
pub trait MessagingChannel: Send + Sync {
  async fn send(&self, to: &str, body: &str) -> Result<(), NotificationError>;
}

/// The operator summary sent to the shop's messaging destination.
pub fn format_order_message(notice: &OrderNotice, currency_symbol: &str) -> String {
  let order = &notice.order;
  let address = &order.shipping_address.0;
  let items = notice
    .items
    .iter()
    .map(|item| {
      format!(
        "• {} x{} - {}",
        item.product_name,
        item.quantity,
        format_money(item.unit_price_cents, currency_symbol)
      )
    })
    .collect::<Vec<_>>()
    .join("\n");

  format!(
    "🛒 *New Order Received!*\n\n\
     📋 *Order Details:*\n\
     • Order #: {order_number}\n\
     • Customer: {customer}\n\
     • Phone: {phone}\n\
     • Total: {total}\n\
     • Payment: {payment}\n\n\
     📦 *Items:*\n{items}\n\n\
     📍 *Shipping Address:*\n\
     {street}\n\
     {city}, {state} - {pincode}\n\n\
     ⏰ Order placed at: {placed_at}\n\n\
     Please process this order promptly! 🚀",
    order_number = order.order_number,
    customer = notice.customer.name,
    phone = notice.customer.phone.as_deref().unwrap_or("-"),
    total = format_money(order.total_amount_cents, currency_symbol),
    payment = order.payment_method.as_str().to_uppercase(),
    items = items,
    street = address.address,
    city = address.city,
    state = address.state,
    pincode = address.pincode,
    placed_at = order.created_at.format("%d/%m/%Y, %H:%M:%S UTC"),
  )
}

/// Posts `{ "to", "body" }` to an HTTP messaging gateway.
pub struct HttpMessagingGateway {
  client: reqwest::Client,
  url: String,
  token: Option<String>,
}

impl HttpMessagingGateway {
  pub fn new(client: reqwest::Client, url: impl Into<String>, token: Option<String>) -> Self {
    Self {
      client,
      url: url.into(),
      token,
    }
  }
}

#[async_trait]
impl MessagingChannel for HttpMessagingGateway {
  async fn send(&self, to: &str, body: &str) -> Result<(), NotificationError> {
    let mut request = self.client.post(&self.url).json(&json!({ "to": to, "body": body }));
    if let Some(token) = &self.token {
      request = request.bearer_auth(token);
    }
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(NotificationError::Rejected {
        status: status.as_u16(),
        body,
      });
    }
    info!(%to, "Operator message delivered.");
    Ok(())
  }
}

/// Used when no gateway is configured: the message only goes to the log.
#[derive(Debug, Default)]
pub struct LogMessenger;

#[async_trait]
impl MessagingChannel for LogMessenger {
  async fn send(&self, to: &str, body: &str) -> Result<(), NotificationError> {
    info!(%to, message = %body, "Messaging gateway not configured; operator message logged only.");
    Ok(())
  }
}
