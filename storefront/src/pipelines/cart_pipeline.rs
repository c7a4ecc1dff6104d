// storefront/src/pipelines/cart_pipeline.rs

use crate::errors::{AppError, Result};
use crate::models::CartItem;
use crate::pipelines::contexts::AddToCartCtxData;
use crate::state::AppState;
use orderflow::{Flow, FlowControl, FlowOutcome, FlowRegistry, FlowState, StepDef};
use tracing::{info, warn};
use uuid::Uuid;

pub fn register_add_to_cart_pipeline(registry: &FlowRegistry<AppError>, app_state: &AppState) {
  let mut p = Flow::<AddToCartCtxData, AppError>::new(
    "add_to_cart",
    vec![
      StepDef::required("validate_cart_input"),
      StepDef::required("fetch_product_for_cart").with_timeout(app_state.config.storage_timeout),
      StepDef::required("check_product_stock_for_cart").with_timeout(app_state.config.storage_timeout),
      StepDef::required("add_or_update_cart_item").with_timeout(app_state.config.storage_timeout),
    ],
  );

  // Step 1: Validate input
  p.on("validate_cart_input", |ctx: FlowState<AddToCartCtxData>| async move {
    let quantity = ctx.read().quantity;
    if quantity <= 0 {
      warn!(quantity, "Add to Cart: non-positive quantity.");
      return Err(AppError::Validation("Product ID and quantity are required".to_string()));
    }
    Ok::<_, AppError>(FlowControl::Continue)
  });

  // Step 2: Product must exist and be on sale
  p.on("fetch_product_for_cart", |ctx: FlowState<AddToCartCtxData>| async move {
    let (store, product_id) = ctx.with(|d| (d.app_state.store.clone(), d.product_id));
    let product = store
      .product(product_id)
      .await?
      .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    if !product.is_active {
      return Err(AppError::ProductUnavailable {
        product_id,
        product_name: product.name,
      });
    }
    ctx.write().product = Some(product);
    Ok::<_, AppError>(FlowControl::Continue)
  });

  // Step 3: What is already in the cart counts against stock
  p.on("check_product_stock_for_cart", |ctx: FlowState<AddToCartCtxData>| async move {
    let (store, user_id, product_id, quantity, product) = ctx.with(|d| {
      (
        d.app_state.store.clone(),
        d.authenticated_user_id,
        d.product_id,
        d.quantity,
        d.product.clone(),
      )
    });
    let product = product.ok_or_else(|| AppError::Internal("Product was not loaded.".to_string()))?;
    let in_cart = store
      .cart_lines(user_id)
      .await?
      .iter()
      .find(|l| l.product_id == product_id)
      .map_or(0, |l| l.quantity);
    let requested = in_cart.saturating_add(quantity);
    if product.stock_quantity < requested {
      warn!(%product_id, available = product.stock_quantity, requested, "Add to Cart: insufficient stock.");
      return Err(AppError::InsufficientStock {
        product_id,
        product_name: product.name,
        available: product.stock_quantity,
        requested,
      });
    }
    Ok::<_, AppError>(FlowControl::Continue)
  });

  // Step 4: Upsert the cart line
  p.on("add_or_update_cart_item", |ctx: FlowState<AddToCartCtxData>| async move {
    let (store, user_id, product_id, quantity) = ctx.with(|d| {
      (
        d.app_state.store.clone(),
        d.authenticated_user_id,
        d.product_id,
        d.quantity,
      )
    });
    let item = store.add_to_cart(user_id, product_id, quantity).await?;
    info!(%user_id, %product_id, new_quantity = item.quantity, "Cart line updated.");
    ctx.write().updated_cart_item = Some(item);
    Ok::<_, AppError>(FlowControl::Continue)
  });

  registry.register(p);
  info!("Add to Cart pipeline registered.");
}

/// Runs the add-to-cart flow and returns the resulting cart line.
pub async fn add_to_cart(app_state: &AppState, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem> {
  let ctx = FlowState::new(AddToCartCtxData {
    app_state: app_state.clone(),
    authenticated_user_id: user_id,
    product_id,
    quantity,
    product: None,
    updated_cart_item: None,
  });
  match app_state.flows.run(ctx.clone()).await? {
    FlowOutcome::Completed => ctx
      .write()
      .updated_cart_item
      .take()
      .ok_or_else(|| AppError::Internal("Cart update completed, but item details are unavailable.".to_string())),
    FlowOutcome::Stopped => Err(AppError::Internal("Process to add item to cart was halted.".to_string())),
  }
}
