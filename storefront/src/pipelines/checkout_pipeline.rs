// storefront/src/pipelines/checkout_pipeline.rs

use crate::errors::{AppError, Result};
use crate::models::{OrderWithItems, PaymentMethod, ShippingAddress};
use crate::pipelines::contexts::CheckoutCtxData;
use crate::services::notifications::OrderNotice;
use crate::services::{cart_snapshot, order_transaction};
use crate::state::AppState;
use orderflow::{Flow, FlowControl, FlowOutcome, FlowRegistry, FlowState, StepDef};
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub fn register_checkout_pipeline(registry: &FlowRegistry<AppError>, app_state: &AppState) {
  let mut p = Flow::<CheckoutCtxData, AppError>::new(
    "checkout",
    vec![
      StepDef::required("validate_checkout_request"),
      StepDef::required("snapshot_cart").with_timeout(app_state.config.storage_timeout),
      // Bounded inside the unit: the deadline stops before the commit.
      StepDef::required("commit_order"),
      StepDef::best_effort("dispatch_notifications")
        .skip_when(|ctx: &FlowState<CheckoutCtxData>| !ctx.read().app_state.config.notifications.enabled),
    ],
  );

  // Step 1: Shipping address present and complete
  p.on("validate_checkout_request", |ctx: FlowState<CheckoutCtxData>| async move {
    let guard = ctx.read();
    let address = guard
      .shipping_address
      .as_ref()
      .ok_or_else(|| AppError::Validation("Shipping address is required".to_string()))?;
    let missing = address.missing_fields();
    if !missing.is_empty() {
      warn!(user_id = %guard.authenticated_user_id, ?missing, "Checkout rejected: incomplete shipping address.");
      return Err(AppError::Validation(format!(
        "Shipping address is incomplete: missing {}",
        missing.join(", ")
      )));
    }
    Ok::<_, AppError>(FlowControl::Continue)
  });

  // Step 2: Price the cart; read-only
  p.on("snapshot_cart", |ctx: FlowState<CheckoutCtxData>| async move {
    let (store, user_id) = ctx.with(|d| (d.app_state.store.clone(), d.authenticated_user_id));
    let lines = cart_snapshot::snapshot(store.as_ref(), user_id).await?;
    ctx.write().priced_lines = lines;
    Ok::<_, AppError>(FlowControl::Continue)
  });

  // Step 3: The atomic unit. On expiry of the storage timeout the
  // transaction is dropped and rolled back.
  p.on("commit_order", |ctx: FlowState<CheckoutCtxData>| async move {
    let (store, deadline, user_id, address, method, lines) = {
      let guard = ctx.read();
      (
        guard.app_state.store.clone(),
        guard.app_state.config.storage_timeout,
        guard.authenticated_user_id,
        guard.shipping_address.clone().unwrap_or_default(),
        guard.payment_method,
        guard.priced_lines.clone(),
      )
    };
    let committed = order_transaction::commit(store.as_ref(), user_id, &address, method, &lines, deadline).await?;
    let mut guard = ctx.write();
    guard.placed_order = Some(committed.placed);
    guard.customer = committed.customer;
    Ok::<_, AppError>(FlowControl::Continue)
  });

  p.after("commit_order", |ctx: FlowState<CheckoutCtxData>| async move {
    let guard = ctx.read();
    if let Some(placed) = &guard.placed_order {
      info!(
        order_number = %placed.order.order_number,
        total_amount_cents = placed.order.total_amount_cents,
        items = placed.items.len(),
        payment_method = placed.order.payment_method.as_str(),
        "Checkout committed."
      );
    }
    Ok::<_, AppError>(FlowControl::Continue)
  });

  // Step 4: Enqueue notifications. Works only from what the unit returned;
  // failures here are logged by the engine and never reach the caller.
  p.on("dispatch_notifications", |ctx: FlowState<CheckoutCtxData>| async move {
    let (notifier, user_id, placed, customer) = ctx.with(|d| {
      (
        d.app_state.notifier.clone(),
        d.authenticated_user_id,
        d.placed_order.clone(),
        d.customer.clone(),
      )
    });
    let Some(placed) = placed else {
      return Ok(FlowControl::Continue);
    };
    let Some(customer) = customer else {
      warn!(%user_id, "Customer record not found; notifications skipped.");
      return Ok(FlowControl::Continue);
    };
    notifier.notify(OrderNotice {
      order: placed.order,
      customer,
      items: placed.items,
    })?;
    ctx.write().notifications_queued = true;
    Ok::<_, AppError>(FlowControl::Continue)
  });

  registry.register(p);
  info!("Checkout pipeline registered.");
}

/// Runs the checkout flow for one user and returns the committed order.
#[instrument(name = "checkout::place_order", skip_all, fields(%user_id, ?payment_method))]
pub async fn place_order(
  app_state: &AppState,
  user_id: Uuid,
  shipping_address: Option<ShippingAddress>,
  payment_method: PaymentMethod,
) -> Result<OrderWithItems> {
  let ctx = FlowState::new(CheckoutCtxData::new(
    app_state.clone(),
    user_id,
    shipping_address,
    payment_method,
  ));

  match app_state.flows.run(ctx.clone()).await? {
    FlowOutcome::Completed => {
      let mut guard = ctx.write();
      if !guard.notifications_queued {
        info!("Order placed without queued notifications.");
      }
      guard
        .placed_order
        .take()
        .ok_or_else(|| AppError::Internal("Checkout completed without an order.".to_string()))
    }
    FlowOutcome::Stopped => {
      warn!("Checkout flow was halted by a handler.");
      Err(AppError::Internal("Checkout was halted.".to_string()))
    }
  }
}
