// storefront/src/web/handlers/admin_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{OrderStatus, PageQuery, PageRequest, Pagination, PaymentStatus};
use crate::services::order_status;
use crate::state::AppState;
use crate::web::extractors::AdminUser;

#[derive(Deserialize, Debug)]
pub struct AdminOrdersQuery {
  pub status: Option<String>,
  pub page: Option<i64>,
  pub limit: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateOrderStatusPayload {
  pub order_id: Option<Uuid>,
  pub status: Option<OrderStatus>,
  pub payment_status: Option<PaymentStatus>,
}

#[instrument(name = "handler::admin_list_orders", skip_all, fields(admin_id = %admin.0.user_id, status = ?query.status))]
pub async fn list_all_orders_handler(
  app_state: web::Data<AppState>,
  query: web::Query<AdminOrdersQuery>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let query = query.into_inner();
  // An empty or "all" filter lists every order.
  let status = match query.status.as_deref().map(str::trim) {
    None | Some("") | Some("all") => None,
    Some(raw) => Some(raw.parse::<OrderStatus>().map_err(AppError::Validation)?),
  };
  let page = PageRequest::from(&PageQuery {
    page: query.page,
    limit: query.limit,
  });

  let orders = app_state.store.admin_orders(status, page).await?;
  Ok::<_, AppError>(HttpResponse::Ok().json(json!({
      "orders": orders.items,
      "pagination": Pagination::new(page, orders.total),
  })))
}

#[instrument(name = "handler::admin_update_order", skip_all, fields(admin_id = %admin.0.user_id, order_id = ?req_payload.order_id))]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<UpdateOrderStatusPayload>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let order_id = payload
    .order_id
    .ok_or_else(|| AppError::Validation("Order ID and status are required".to_string()))?;

  let order = order_status::apply_update(app_state.store.as_ref(), order_id, payload.status, payload.payment_status).await?;

  info!(order_number = %order.order_number, status = %order.status, "Order status updated by admin.");
  Ok::<_, AppError>(HttpResponse::Ok().json(json!({
      "message": "Order status updated successfully",
      "order": order,
  })))
}

#[instrument(name = "handler::admin_dashboard", skip_all, fields(admin_id = %admin.0.user_id))]
pub async fn dashboard_handler(app_state: web::Data<AppState>, admin: AdminUser) -> Result<HttpResponse, AppError> {
  let snapshot = app_state
    .store
    .dashboard(Utc::now(), app_state.config.low_stock_threshold)
    .await?;
  Ok::<_, AppError>(HttpResponse::Ok().json(snapshot))
}

#[instrument(name = "handler::admin_stats", skip_all, fields(admin_id = %admin.0.user_id))]
pub async fn stats_handler(app_state: web::Data<AppState>, admin: AdminUser) -> Result<HttpResponse, AppError> {
  let stats = app_state.store.stats().await?;
  Ok::<_, AppError>(HttpResponse::Ok().json(stats))
}
