// storefront/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, Type as SqlxType};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::order_item::OrderItemView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  Shipped,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Confirmed => "confirmed",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| format!("Unknown order status '{}'", s))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "payment_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  Paid,
  Failed,
  Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "payment_method_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
  /// Cash on delivery.
  #[default]
  Cod,
  Online,
}

impl PaymentMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentMethod::Cod => "cod",
      PaymentMethod::Online => "online",
    }
  }
}

/// Missing fields deserialize as blank so validation can name them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingAddress {
  pub full_name: Option<String>,
  pub phone: Option<String>,
  pub address: String,
  pub city: String,
  pub state: String,
  pub pincode: String,
}

impl ShippingAddress {
  /// Names of the required fields left blank.
  pub fn missing_fields(&self) -> Vec<&'static str> {
    [
      ("address", &self.address),
      ("city", &self.city),
      ("state", &self.state),
      ("pincode", &self.pincode),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name)
    .collect()
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub order_number: String,
  pub user_id: Uuid,
  pub total_amount_cents: i64,
  pub payment_method: PaymentMethod,
  pub payment_status: PaymentStatus,
  pub status: OrderStatus,
  pub shipping_address: Json<ShippingAddress>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Order row as listed in the back office, with the customer's contact details.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdminOrderView {
  #[sqlx(flatten)]
  #[serde(flatten)]
  pub order: Order,
  pub customer_name: String,
  pub customer_phone: Option<String>,
  pub customer_email: Option<String>,
  #[sqlx(skip)]
  pub items: Vec<OrderItemView>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_round_trips_through_its_wire_name() {
    for status in OrderStatus::ALL {
      assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
    }
    assert!("paid".parse::<OrderStatus>().is_err());
  }

  #[test]
  fn blank_address_fields_are_reported() {
    let addr = ShippingAddress {
      full_name: None,
      phone: None,
      address: "12 Lake Road".to_string(),
      city: " ".to_string(),
      state: "KA".to_string(),
      pincode: String::new(),
    };
    assert_eq!(addr.missing_fields(), vec!["city", "pincode"]);
  }
}
