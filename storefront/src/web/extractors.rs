// storefront/src/web/extractors.rs

//! Request identity. Tokens are issued by the auth service; this side only
//! verifies them.

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::state::AppState;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  pub id: Uuid,
  pub role: String,
  pub exp: i64,
}

pub fn issue_token(secret: &str, user_id: Uuid, role: &str, ttl: chrono::Duration) -> Result<String> {
  let claims = Claims {
    id: user_id,
    role: role.to_string(),
    exp: (chrono::Utc::now() + ttl).timestamp(),
  };
  encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
    .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims> {
  decode::<Claims>(
    token,
    &DecodingKey::from_secret(secret.as_bytes()),
    &Validation::new(Algorithm::HS256),
  )
  .map(|data| data.claims)
  .map_err(|e| {
    warn!(error = %e, "Rejected bearer token.");
    AppError::Forbidden("Invalid or expired token".to_string())
  })
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  pub role: String,
}

impl AuthenticatedUser {
  pub fn is_admin(&self) -> bool {
    self.role == ADMIN_ROLE
  }

  fn from_http(req: &HttpRequest) -> Result<Self> {
    let token = req
      .headers()
      .get(actix_web::http::header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.strip_prefix("Bearer "))
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .ok_or_else(|| AppError::Auth("Access token required".to_string()))?;
    let state = req
      .app_data::<web::Data<AppState>>()
      .ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;
    let claims = verify_token(&state.config.jwt_secret, token)?;
    Ok(AuthenticatedUser {
      user_id: claims.id,
      role: claims.role,
    })
  }
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(Self::from_http(req))
  }
}

/// An authenticated user holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(AuthenticatedUser::from_http(req).and_then(|user| {
      if user.is_admin() {
        Ok(AdminUser(user))
      } else {
        warn!(user_id = %user.user_id, role = %user.role, "Admin route refused.");
        Err(AppError::Forbidden("Admin access required".to_string()))
      }
    }))
  }
}
