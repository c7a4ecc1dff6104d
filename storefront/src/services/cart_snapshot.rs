// storefront/src/services/cart_snapshot.rs

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::CartLineView;
use crate::store::Store;

/// One cart line priced at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedLine {
  pub product_id: Uuid,
  pub product_name: String,
  pub quantity: i32,
  pub unit_price_cents: i64,
}

impl PricedLine {
  pub fn line_total_cents(&self) -> Option<i64> {
    self.unit_price_cents.checked_mul(i64::from(self.quantity))
  }
}

/// Reads the user's cart and prices it. Performs no writes.
///
/// Fails on an empty cart, on an inactive product, and on the first line whose
/// requested quantity exceeds current stock.
pub async fn snapshot(store: &dyn Store, user_id: Uuid) -> Result<Vec<PricedLine>> {
  let lines = store.cart_lines(user_id).await?;
  let priced = price_lines(&lines)?;
  info!(%user_id, lines = priced.len(), "Cart snapshot taken.");
  Ok(priced)
}

pub fn price_lines(lines: &[CartLineView]) -> Result<Vec<PricedLine>> {
  if lines.is_empty() {
    return Err(AppError::EmptyCart);
  }
  lines
    .iter()
    .map(|line| {
      if !line.is_active {
        warn!(product_id = %line.product_id, "Cart holds an inactive product.");
        return Err(AppError::ProductUnavailable {
          product_id: line.product_id,
          product_name: line.product_name.clone(),
        });
      }
      if line.stock_quantity < line.quantity {
        return Err(AppError::InsufficientStock {
          product_id: line.product_id,
          product_name: line.product_name.clone(),
          available: line.stock_quantity,
          requested: line.quantity,
        });
      }
      Ok(PricedLine {
        product_id: line.product_id,
        product_name: line.product_name.clone(),
        quantity: line.quantity,
        unit_price_cents: line.unit_price_cents(),
      })
    })
    .collect()
}

/// Exact sum of `unit_price * quantity`.
pub fn order_total(lines: &[PricedLine]) -> Result<i64> {
  lines.iter().try_fold(0i64, |acc, line| {
    line
      .line_total_cents()
      .and_then(|t| acc.checked_add(t))
      .ok_or_else(|| AppError::Validation("Order total is out of range".to_string()))
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn line(name: &str, qty: i32, price: i64, discount: Option<i64>, stock: i32) -> CartLineView {
    CartLineView {
      product_id: Uuid::new_v4(),
      product_name: name.to_string(),
      images: vec![],
      price_cents: price,
      discount_price_cents: discount,
      stock_quantity: stock,
      is_active: true,
      quantity: qty,
      added_at: Utc::now(),
    }
  }

  #[test]
  fn discount_price_wins_and_total_is_exact() {
    let lines = vec![line("A", 2, 100, None, 5), line("B", 1, 80, Some(50), 1)];
    let priced = price_lines(&lines).unwrap();
    assert_eq!(priced[0].unit_price_cents, 100);
    assert_eq!(priced[1].unit_price_cents, 50);
    assert_eq!(order_total(&priced).unwrap(), 250);
  }

  #[test]
  fn empty_cart_is_rejected() {
    assert!(matches!(price_lines(&[]), Err(AppError::EmptyCart)));
  }

  #[test]
  fn first_short_line_is_named() {
    let lines = vec![line("A", 1, 100, None, 5), line("B", 4, 10, None, 3), line("C", 9, 10, None, 0)];
    match price_lines(&lines) {
      Err(AppError::InsufficientStock {
        product_name,
        available,
        requested,
        ..
      }) => {
        assert_eq!(product_name, "B");
        assert_eq!(available, 3);
        assert_eq!(requested, 4);
      }
      other => panic!("unexpected result: {:?}", other),
    }
  }

  #[test]
  fn inactive_product_is_unavailable() {
    let mut inactive = line("Gone", 1, 100, None, 5);
    inactive.is_active = false;
    assert!(matches!(
      price_lines(&[inactive]),
      Err(AppError::ProductUnavailable { .. })
    ));
  }

  #[test]
  fn overflowing_total_is_a_validation_error() {
    let lines = vec![PricedLine {
      product_id: Uuid::nil(),
      product_name: "Huge".into(),
      quantity: i32::MAX,
      unit_price_cents: i64::MAX / 2,
    }];
    assert!(matches!(order_total(&lines), Err(AppError::Validation(_))));
  }
}
