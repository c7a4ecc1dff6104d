// storefront/src/models/order_item.rs

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::order::Order;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  /// Copied from the product at checkout and never recomputed.
  pub unit_price_cents: i64,
}

/// An order item joined with the product's display columns.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItemView {
  pub id: Uuid,
  pub product_id: Uuid,
  pub product_name: String,
  pub images: Vec<String>,
  pub quantity: i32,
  pub unit_price_cents: i64,
  pub line_total_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderItemView>,
}
