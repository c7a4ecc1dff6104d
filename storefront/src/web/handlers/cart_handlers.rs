// storefront/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::CartSummary;
use crate::pipelines::cart_pipeline;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct CartItemPayload {
  pub product_id: Uuid,
  pub quantity: i32,
}

#[derive(Deserialize, Debug)]
pub struct RemoveCartQuery {
  pub product_id: Option<Uuid>,
}

#[instrument(name = "handler::get_cart", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn get_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let lines = app_state.store.cart_lines(auth_user.user_id).await?;
  let summary = CartSummary::of(&lines);
  Ok::<_, AppError>(HttpResponse::Ok().json(json!({
      "cart": lines,
      "summary": summary,
  })))
}

#[instrument(
    name = "handler::add_to_cart",
    skip_all,
    fields(user_id = %auth_user.user_id, product_id = %req_payload.product_id, quantity = req_payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CartItemPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let item = cart_pipeline::add_to_cart(
    app_state.get_ref(),
    auth_user.user_id,
    req_payload.product_id,
    req_payload.quantity,
  )
  .await?;

  info!(item_id = %item.id, new_quantity = item.quantity, "Add to cart successful.");
  Ok::<_, AppError>(HttpResponse::Ok().json(json!({
      "message": "Item added to cart successfully",
      "cartItem": item,
  })))
}

/// Sets a line's quantity. Zero or less removes the line.
#[instrument(
    name = "handler::update_cart",
    skip_all,
    fields(user_id = %auth_user.user_id, product_id = %req_payload.product_id, quantity = req_payload.quantity)
)]
pub async fn update_cart_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CartItemPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let CartItemPayload { product_id, quantity } = req_payload.into_inner();

  if quantity <= 0 {
    let removed = app_state
      .store
      .remove_cart_lines(auth_user.user_id, Some(product_id))
      .await?;
    if removed == 0 {
      return Err(AppError::NotFound("Item not found in cart".to_string()));
    }
    return Ok(HttpResponse::Ok().json(json!({ "message": "Item removed from cart" })));
  }

  let product = app_state
    .store
    .product(product_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
  if !product.is_active {
    return Err(AppError::ProductUnavailable {
      product_id,
      product_name: product.name,
    });
  }
  if product.stock_quantity < quantity {
    return Err(AppError::InsufficientStock {
      product_id,
      product_name: product.name,
      available: product.stock_quantity,
      requested: quantity,
    });
  }

  let item = app_state
    .store
    .set_cart_quantity(auth_user.user_id, product_id, quantity)
    .await?
    .ok_or_else(|| AppError::NotFound("Item not found in cart".to_string()))?;
  Ok::<_, AppError>(HttpResponse::Ok().json(json!({
      "message": "Cart updated successfully",
      "cartItem": item,
  })))
}

/// Removes one line, or clears the cart when no product is given.
#[instrument(name = "handler::remove_from_cart", skip_all, fields(user_id = %auth_user.user_id, product_id = ?query.product_id))]
pub async fn remove_from_cart_handler(
  app_state: web::Data<AppState>,
  query: web::Query<RemoveCartQuery>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let removed = app_state
    .store
    .remove_cart_lines(auth_user.user_id, query.product_id)
    .await?;
  info!(removed, "Cart lines removed.");
  let message = if query.product_id.is_some() {
    "Item removed from cart"
  } else {
    "Cart cleared successfully"
  };
  Ok::<_, AppError>(HttpResponse::Ok().json(json!({ "message": message })))
}
