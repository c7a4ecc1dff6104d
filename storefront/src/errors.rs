// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use orderflow::FlowError;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::services::notifications::NotificationError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("{0}")]
  Validation(String),

  #[error("Cart is empty")]
  EmptyCart,

  #[error("Insufficient stock for {product_name}. Available: {available}")]
  InsufficientStock {
    product_id: Uuid,
    product_name: String,
    available: i32,
    requested: i32,
  },

  #[error("{product_name} is no longer available")]
  ProductUnavailable { product_id: Uuid, product_name: String },

  #[error("{0}")]
  Auth(String),

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("Too many requests, please try again later.")]
  RateLimited { retry_after_secs: u64 },

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Storage Error: {0}")]
  Storage(String),

  #[error("Storage timed out after {0:?}")]
  StorageTimeout(Duration),

  #[error("Notification Error: {0}")]
  Notification(#[from] NotificationError),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// Storage-side failures. Nothing was written when one of these escapes a
  /// checkout.
  pub fn is_storage(&self) -> bool {
    match self {
      AppError::Sqlx(_) | AppError::Storage(_) | AppError::StorageTimeout(_) => true,
      AppError::Workflow { source } => source.is_timeout(),
      _ => false,
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_)
      | AppError::EmptyCart
      | AppError::InsufficientStock { .. }
      | AppError::ProductUnavailable { .. } => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
      AppError::Config(_)
      | AppError::Sqlx(_)
      | AppError::Storage(_)
      | AppError::StorageTimeout(_)
      | AppError::Notification(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Responding with error");
    }

    match self {
      AppError::RateLimited { retry_after_secs } => HttpResponse::TooManyRequests()
        .insert_header(("Retry-After", retry_after_secs.to_string()))
        .json(json!({"error": self.to_string()})),
      AppError::Workflow { source } => {
        tracing::error!(flow_error_source = ?source, "Workflow error details");
        HttpResponse::InternalServerError().json(json!({"error": "Internal server error"}))
      }
      // Storage and configuration details stay in the logs.
      AppError::Config(_)
      | AppError::Sqlx(_)
      | AppError::Storage(_)
      | AppError::StorageTimeout(_)
      | AppError::Notification(_)
      | AppError::Internal(_) => {
        HttpResponse::InternalServerError().json(json!({"error": "Internal server error"}))
      }
      _ => HttpResponse::build(status).json(json!({"error": self.to_string()})),
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn insufficient_stock_names_the_product() {
    let err = AppError::InsufficientStock {
      product_id: Uuid::nil(),
      product_name: "Tea Kettle".to_string(),
      available: 2,
      requested: 3,
    };
    assert_eq!(err.to_string(), "Insufficient stock for Tea Kettle. Available: 2");
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
  }

  #[test]
  fn step_timeouts_count_as_storage_failures() {
    let err = AppError::from(FlowError::StepTimedOut {
      step_name: "commit_order".to_string(),
      timeout: Duration::from_millis(10),
    });
    assert!(err.is_storage());
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    let err = AppError::StorageTimeout(Duration::from_millis(50));
    assert!(err.is_storage());
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn auth_failures_map_to_401_and_403() {
    assert_eq!(AppError::Auth("x".into()).status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
    assert_eq!(
      AppError::RateLimited { retry_after_secs: 1 }.status_code(),
      StatusCode::TOO_MANY_REQUESTS
    );
  }
}
