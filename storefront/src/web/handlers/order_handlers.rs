// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{PageQuery, PageRequest, Pagination, PaymentMethod, ShippingAddress};
use crate::pipelines::checkout_pipeline;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug, Default)]
pub struct PlaceOrderPayload {
  pub shipping_address: Option<ShippingAddress>,
  #[serde(default)]
  pub payment_method: PaymentMethod,
}

#[instrument(name = "handler::place_order", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<PlaceOrderPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let PlaceOrderPayload {
    shipping_address,
    payment_method,
  } = req_payload.into_inner();

  let placed =
    checkout_pipeline::place_order(app_state.get_ref(), auth_user.user_id, shipping_address, payment_method).await?;

  info!(order_number = %placed.order.order_number, "Order placed.");
  Ok::<_, AppError>(HttpResponse::Created().json(json!({
      "message": "Order placed successfully",
      "order": placed,
  })))
}

#[instrument(name = "handler::list_orders", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  query: web::Query<PageQuery>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let page = PageRequest::from(&query.into_inner());
  let orders = app_state.store.orders_for_user(auth_user.user_id, page).await?;
  Ok::<_, AppError>(HttpResponse::Ok().json(json!({
      "orders": orders.items,
      "pagination": Pagination::new(page, orders.total),
  })))
}

#[instrument(name = "handler::get_order", skip_all, fields(user_id = %auth_user.user_id, order_id = %path))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .store
    .order_for_user(auth_user.user_id, path.into_inner())
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  Ok::<_, AppError>(HttpResponse::Ok().json(json!({ "order": order })))
}
