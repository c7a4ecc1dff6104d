// storefront/src/models/cart_item.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::product::effective_price;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartItem {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub added_at: DateTime<Utc>,
}

/// A cart line joined with the product columns checkout and the cart view need.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartLineView {
  pub product_id: Uuid,
  pub product_name: String,
  pub images: Vec<String>,
  pub price_cents: i64,
  pub discount_price_cents: Option<i64>,
  pub stock_quantity: i32,
  pub is_active: bool,
  pub quantity: i32,
  pub added_at: DateTime<Utc>,
}

impl CartLineView {
  pub fn unit_price_cents(&self) -> i64 {
    effective_price(self.price_cents, self.discount_price_cents)
  }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
  /// Total units across all lines.
  pub count: i64,
  pub unique_items: usize,
}

impl CartSummary {
  pub fn of(lines: &[CartLineView]) -> Self {
    Self {
      count: lines.iter().map(|l| i64::from(l.quantity)).sum(),
      unique_items: lines.len(),
    }
  }
}
