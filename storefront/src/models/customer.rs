// storefront/src/models/customer.rs

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Read-only view of a row in the identity service's `users` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Customer {
  pub id: Uuid,
  pub name: String,
  pub email: Option<String>,
  pub phone: Option<String>,
  pub role: String,
}
