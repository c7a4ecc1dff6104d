// storefront/src/store/mod.rs

//! Storage behind the order core.
//!
//! `Store` covers plain reads and single-statement writes. Checkout goes
//! through `Store::begin`, which hands out an `OrderTx`: every write made
//! through it becomes visible together on `commit`, and dropping it without
//! committing discards them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{
  AdminOrderView, CartItem, CartLineView, Customer, Order, OrderItem, OrderItemView, OrderStatus, OrderWithItems, Page,
  PageRequest, PaymentStatus, Product,
};
use crate::services::dashboard::{DashboardSnapshot, StoreStats};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
  /// The user's cart joined with current product data, oldest line first.
  async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLineView>>;

  async fn product(&self, product_id: Uuid) -> Result<Option<Product>>;

  /// Adds `quantity` to the user's line for the product, creating it if needed.
  async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem>;

  /// Overwrites the quantity of an existing line. `None` when the line does not exist.
  async fn set_cart_quantity(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<Option<CartItem>>;

  /// Removes one line, or every line of the user when `product_id` is `None`.
  async fn remove_cart_lines(&self, user_id: Uuid, product_id: Option<Uuid>) -> Result<u64>;

  async fn begin(&self) -> Result<Box<dyn OrderTx>>;

  /// Newest first.
  async fn orders_for_user(&self, user_id: Uuid, page: PageRequest) -> Result<Page<OrderWithItems>>;

  async fn order_for_user(&self, user_id: Uuid, order_id: Uuid) -> Result<Option<OrderWithItems>>;

  async fn admin_orders(&self, status: Option<OrderStatus>, page: PageRequest) -> Result<Page<AdminOrderView>>;

  async fn order(&self, order_id: Uuid) -> Result<Option<Order>>;

  /// Applies whichever of the two statuses are given. `None` when the order does not exist.
  async fn update_order_status(
    &self,
    order_id: Uuid,
    status: Option<OrderStatus>,
    payment_status: Option<PaymentStatus>,
  ) -> Result<Option<Order>>;

  async fn dashboard(&self, now: DateTime<Utc>, low_stock_threshold: i32) -> Result<DashboardSnapshot>;

  /// User and product counts plus lifetime revenue.
  async fn stats(&self) -> Result<StoreStats>;
}

/// One atomic unit of checkout writes.
#[async_trait]
pub trait OrderTx: Send {
  /// Locks the products' stock for the rest of the unit, in id order, and
  /// returns the current quantities. Unknown ids are absent from the map.
  async fn lock_stock(&mut self, product_ids: &[Uuid]) -> Result<HashMap<Uuid, i32>>;

  /// Decrements stock only if at least `quantity` is available. Returns the
  /// remaining quantity, or `None` when the decrement was refused.
  async fn decrement_stock(&mut self, product_id: Uuid, quantity: i32) -> Result<Option<i32>>;

  async fn stock_level(&mut self, product_id: Uuid) -> Result<Option<i32>>;

  async fn insert_order(&mut self, order: &Order) -> Result<()>;

  async fn insert_order_item(&mut self, item: &OrderItem) -> Result<()>;

  async fn clear_cart(&mut self, user_id: Uuid) -> Result<u64>;

  async fn customer(&mut self, user_id: Uuid) -> Result<Option<Customer>>;

  /// The order's items joined with product name and images, as seen inside the unit.
  async fn order_items(&mut self, order_id: Uuid) -> Result<Vec<OrderItemView>>;

  async fn commit(self: Box<Self>) -> Result<()>;
}
