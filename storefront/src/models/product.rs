// storefront/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub images: Vec<String>,
  pub price_cents: i64,
  pub discount_price_cents: Option<i64>,
  pub stock_quantity: i32,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// The discount price when one is set, the list price otherwise.
pub fn effective_price(price_cents: i64, discount_price_cents: Option<i64>) -> i64 {
  discount_price_cents.unwrap_or(price_cents)
}
