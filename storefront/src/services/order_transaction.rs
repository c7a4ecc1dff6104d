// storefront/src/services/order_transaction.rs

use chrono::Utc;
use sqlx::types::Json;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::cart_snapshot::{order_total, PricedLine};
use super::inventory_ledger::InventoryLedger;
use super::order_number;
use crate::errors::{AppError, Result};
use crate::models::{
  Customer, Order, OrderItem, OrderStatus, OrderWithItems, PaymentMethod, PaymentStatus, ShippingAddress,
};
use crate::store::{OrderTx, Store};

/// A committed order and the customer record read inside the same unit.
#[derive(Debug, Clone)]
pub struct CommittedOrder {
  pub placed: OrderWithItems,
  pub customer: Option<Customer>,
}

/// Writes an order for `lines` as one atomic unit.
///
/// Inside a single storage transaction: lock and re-read stock for every
/// product, insert the header and one item per line, decrement stock through
/// the ledger, and empty the user's cart. Any error drops the transaction, so
/// nothing is written.
///
/// `deadline` bounds everything up to the commit. When it expires the
/// transaction is dropped and rolled back. The commit itself is never cut
/// short, so a stored order is always reported as placed.
#[instrument(name = "order_transaction::commit", skip_all, fields(%user_id, lines = lines.len()))]
pub async fn commit(
  store: &dyn Store,
  user_id: Uuid,
  shipping_address: &ShippingAddress,
  payment_method: PaymentMethod,
  lines: &[PricedLine],
  deadline: Duration,
) -> Result<CommittedOrder> {
  if lines.is_empty() {
    return Err(AppError::EmptyCart);
  }

  let (tx, committed) = match timeout(deadline, stage(store, user_id, shipping_address, payment_method, lines)).await {
    Ok(staged) => staged?,
    Err(_) => {
      warn!(?deadline, "Order unit timed out before commit; rolled back.");
      return Err(AppError::StorageTimeout(deadline));
    }
  };
  tx.commit().await?;

  let order = &committed.placed.order;
  info!(
    order_id = %order.id,
    order_number = %order.order_number,
    total_amount_cents = order.total_amount_cents,
    "Order committed."
  );
  Ok(committed)
}

async fn stage(
  store: &dyn Store,
  user_id: Uuid,
  shipping_address: &ShippingAddress,
  payment_method: PaymentMethod,
  lines: &[PricedLine],
) -> Result<(Box<dyn OrderTx>, CommittedOrder)> {
  let mut tx = store.begin().await?;

  let product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
  let stock = tx.lock_stock(&product_ids).await?;
  for line in lines {
    match stock.get(&line.product_id) {
      None => {
        return Err(AppError::ProductUnavailable {
          product_id: line.product_id,
          product_name: line.product_name.clone(),
        })
      }
      Some(&available) if available < line.quantity => {
        warn!(product_id = %line.product_id, available, requested = line.quantity, "Stock changed since snapshot.");
        return Err(AppError::InsufficientStock {
          product_id: line.product_id,
          product_name: line.product_name.clone(),
          available,
          requested: line.quantity,
        });
      }
      Some(_) => {}
    }
  }

  let total_amount_cents = order_total(lines)?;
  let now = Utc::now();
  let order = Order {
    id: Uuid::new_v4(),
    order_number: order_number::generate(now),
    user_id,
    total_amount_cents,
    payment_method,
    payment_status: PaymentStatus::Pending,
    status: OrderStatus::Pending,
    shipping_address: Json(shipping_address.clone()),
    created_at: now,
    updated_at: now,
  };
  tx.insert_order(&order).await?;

  for line in lines {
    tx.insert_order_item(&OrderItem {
      id: Uuid::new_v4(),
      order_id: order.id,
      product_id: line.product_id,
      quantity: line.quantity,
      unit_price_cents: line.unit_price_cents,
    })
    .await?;
    InventoryLedger::reserve(tx.as_mut(), line.product_id, &line.product_name, line.quantity).await?;
  }

  let cleared = tx.clear_cart(user_id).await?;
  let items = tx.order_items(order.id).await?;
  let customer = tx.customer(user_id).await?;
  debug!(cart_lines_cleared = cleared, "Order unit staged.");

  Ok((
    tx,
    CommittedOrder {
      placed: OrderWithItems { order, items },
      customer,
    },
  ))
}
