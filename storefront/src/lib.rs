// storefront/src/lib.rs

//! Order core of a small storefront: cart pricing, atomic checkout against
//! the inventory ledger, background order notifications, and the back-office
//! order views.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod web;

pub use errors::{AppError, Result};
pub use state::AppState;
