// storefront/src/services/inventory_ledger.rs

use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::store::OrderTx;

/// Owns every stock decrement made by checkout.
///
/// All reads and writes go through the caller's open transaction; nothing is
/// cached between calls.
pub struct InventoryLedger;

impl InventoryLedger {
  /// Takes `quantity` units of `product_id` and returns what is left.
  ///
  /// The decrement is conditional in storage, so stock never goes negative
  /// even when this races another unit of work.
  pub async fn reserve(
    tx: &mut dyn OrderTx,
    product_id: Uuid,
    product_name: &str,
    quantity: i32,
  ) -> Result<i32> {
    if quantity <= 0 {
      return Err(AppError::Validation(format!(
        "Quantity for {} must be positive",
        product_name
      )));
    }
    match tx.decrement_stock(product_id, quantity).await? {
      Some(remaining) => {
        debug!(%product_id, quantity, remaining, "Stock reserved.");
        Ok(remaining)
      }
      None => {
        let available = tx.stock_level(product_id).await?;
        warn!(%product_id, quantity, ?available, "Stock reservation refused.");
        match available {
          Some(available) => Err(AppError::InsufficientStock {
            product_id,
            product_name: product_name.to_string(),
            available,
            requested: quantity,
          }),
          None => Err(AppError::ProductUnavailable {
            product_id,
            product_name: product_name.to_string(),
          }),
        }
      }
    }
  }
}
