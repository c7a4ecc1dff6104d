// storefront/src/services/order_status.rs

//! Order lifecycle after creation.
//!
//! Canonical path: pending -> confirmed -> shipped -> delivered, with
//! cancellation allowed from any non-terminal state. The back office may set
//! any state; moves off the canonical graph are applied but logged.

use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{Order, OrderStatus, PaymentStatus};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  Unchanged,
  Forward,
  Cancellation,
  Irregular,
}

pub fn is_terminal(status: OrderStatus) -> bool {
  matches!(status, OrderStatus::Delivered | OrderStatus::Cancelled)
}

pub fn classify(from: OrderStatus, to: OrderStatus) -> Transition {
  use OrderStatus::*;
  if from == to {
    return Transition::Unchanged;
  }
  match (from, to) {
    (Pending, Confirmed) | (Confirmed, Shipped) | (Shipped, Delivered) => Transition::Forward,
    (from, Cancelled) if !is_terminal(from) => Transition::Cancellation,
    _ => Transition::Irregular,
  }
}

/// Applies an admin status change. Stock is not restored on cancellation.
pub async fn apply_update(
  store: &dyn Store,
  order_id: Uuid,
  status: Option<OrderStatus>,
  payment_status: Option<PaymentStatus>,
) -> Result<Order> {
  if status.is_none() && payment_status.is_none() {
    return Err(AppError::Validation("Order ID and status are required".to_string()));
  }
  let current = store
    .order(order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

  if let Some(to) = status {
    match classify(current.status, to) {
      Transition::Irregular => warn!(
        %order_id,
        order_number = %current.order_number,
        from = %current.status,
        %to,
        "Irregular order status change applied."
      ),
      transition => info!(%order_id, from = %current.status, %to, ?transition, "Order status change."),
    }
  }

  store
    .update_order_status(order_id, status, payment_status)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}
