// storefront/src/store/memory.rs

//! In-process store used when no database is configured, and by the tests.
//!
//! A transaction holds the store's lock from `begin` until it is committed or
//! dropped, so checkouts are serialized. Writes go to a staged copy of the
//! tables that replaces the live one on commit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use super::{OrderTx, Store};
use crate::errors::{AppError, Result};
use crate::models::{
  AdminOrderView, CartItem, CartLineView, Customer, Order, OrderItem, OrderItemView, OrderStatus, OrderWithItems, Page,
  PageRequest, PaymentStatus, Product,
};
use crate::services::dashboard::{self, DashboardSnapshot, StoreStats};

#[derive(Debug, Clone, Default)]
struct Tables {
  products: HashMap<Uuid, Product>,
  customers: HashMap<Uuid, Customer>,
  cart: Vec<CartItem>,
  orders: Vec<Order>,
  order_items: Vec<OrderItem>,
}

impl Tables {
  fn cart_lines(&self, user_id: Uuid) -> Vec<CartLineView> {
    let mut lines: Vec<CartLineView> = self
      .cart
      .iter()
      .filter(|c| c.user_id == user_id)
      .filter_map(|c| {
        self.products.get(&c.product_id).map(|p| CartLineView {
          product_id: p.id,
          product_name: p.name.clone(),
          images: p.images.clone(),
          price_cents: p.price_cents,
          discount_price_cents: p.discount_price_cents,
          stock_quantity: p.stock_quantity,
          is_active: p.is_active,
          quantity: c.quantity,
          added_at: c.added_at,
        })
      })
      .collect();
    lines.sort_by(|a, b| a.added_at.cmp(&b.added_at).then_with(|| a.product_id.cmp(&b.product_id)));
    lines
  }

  fn item_views(&self, order_id: Uuid) -> Vec<OrderItemView> {
    self
      .order_items
      .iter()
      .filter(|i| i.order_id == order_id)
      .map(|i| {
        let (name, images) = self
          .products
          .get(&i.product_id)
          .map(|p| (p.name.clone(), p.images.clone()))
          .unwrap_or_default();
        OrderItemView {
          id: i.id,
          product_id: i.product_id,
          product_name: name,
          images,
          quantity: i.quantity,
          unit_price_cents: i.unit_price_cents,
          line_total_cents: i.unit_price_cents * i64::from(i.quantity),
        }
      })
      .collect()
  }

  fn with_items(&self, order: &Order) -> OrderWithItems {
    OrderWithItems {
      order: order.clone(),
      items: self.item_views(order.id),
    }
  }

  /// Orders newest first.
  fn orders_newest_first<'a>(&'a self, filter: impl Fn(&Order) -> bool + 'a) -> Vec<&'a Order> {
    let mut orders: Vec<&Order> = self.orders.iter().filter(|o| filter(o)).collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
  }
}

#[derive(Debug, Default)]
struct Faults {
  unavailable: AtomicBool,
  fail_commits: AtomicBool,
  write_delay_ms: AtomicU64,
  commit_delay_ms: AtomicU64,
}

impl Faults {
  fn check(&self) -> Result<()> {
    if self.unavailable.load(Ordering::SeqCst) {
      return Err(AppError::Storage("store unavailable".to_string()));
    }
    Ok(())
  }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
  tables: Arc<Mutex<Tables>>,
  faults: Arc<Faults>,
  commits: Arc<AtomicU64>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn insert_product(&self, product: Product) {
    self.tables.lock().await.products.insert(product.id, product);
  }

  pub async fn insert_customer(&self, customer: Customer) {
    self.tables.lock().await.customers.insert(customer.id, customer);
  }

  pub async fn set_price(&self, product_id: Uuid, price_cents: i64, discount_price_cents: Option<i64>) {
    if let Some(p) = self.tables.lock().await.products.get_mut(&product_id) {
      p.price_cents = price_cents;
      p.discount_price_cents = discount_price_cents;
      p.updated_at = Utc::now();
    }
  }

  pub async fn set_active(&self, product_id: Uuid, is_active: bool) {
    if let Some(p) = self.tables.lock().await.products.get_mut(&product_id) {
      p.is_active = is_active;
    }
  }

  pub async fn stock_of(&self, product_id: Uuid) -> Option<i32> {
    self.tables.lock().await.products.get(&product_id).map(|p| p.stock_quantity)
  }

  pub async fn order_count(&self) -> usize {
    self.tables.lock().await.orders.len()
  }

  /// Number of committed transactions so far.
  pub fn commits(&self) -> u64 {
    self.commits.load(Ordering::SeqCst)
  }

  /// Makes every operation fail with a storage error.
  pub fn set_unavailable(&self, unavailable: bool) {
    self.faults.unavailable.store(unavailable, Ordering::SeqCst);
  }

  /// Makes every transaction commit fail after its writes were staged.
  pub fn set_fail_commits(&self, fail: bool) {
    self.faults.fail_commits.store(fail, Ordering::SeqCst);
  }

  /// Delays the row locking at the start of every transaction.
  pub fn set_write_delay(&self, delay: Duration) {
    self.faults.write_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
  }

  /// Delays every commit after its writes were staged.
  pub fn set_commit_delay(&self, delay: Duration) {
    self.faults.commit_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
  }

  /// Loads a small demo catalog and one customer. Returns the customer id.
  pub async fn seed_demo(&self) -> Uuid {
    let now = Utc::now();
    let catalog = [
      ("Masala Chai Tin", 24_900, Some(19_900), 40),
      ("Brass Tea Kettle", 129_900, None, 8),
      ("Handloom Cotton Throw", 89_900, Some(74_900), 15),
      ("Clay Cups (Set of 4)", 34_900, None, 3),
    ];
    let mut tables = self.tables.lock().await;
    for (name, price, discount, stock) in catalog {
      let id = Uuid::new_v4();
      tables.products.insert(
        id,
        Product {
          id,
          name: name.to_string(),
          description: None,
          images: vec![],
          price_cents: price,
          discount_price_cents: discount,
          stock_quantity: stock,
          is_active: true,
          created_at: now,
          updated_at: now,
        },
      );
    }
    let customer_id = Uuid::new_v4();
    tables.customers.insert(
      customer_id,
      Customer {
        id: customer_id,
        name: "Demo Customer".to_string(),
        email: Some("demo@example.com".to_string()),
        phone: Some("+910000000000".to_string()),
        role: "customer".to_string(),
      },
    );
    info!(products = tables.products.len(), %customer_id, "Seeded in-process store.");
    customer_id
  }
}

#[async_trait]
impl Store for MemoryStore {
  async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLineView>> {
    self.faults.check()?;
    Ok(self.tables.lock().await.cart_lines(user_id))
  }

  async fn product(&self, product_id: Uuid) -> Result<Option<Product>> {
    self.faults.check()?;
    Ok(self.tables.lock().await.products.get(&product_id).cloned())
  }

  async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem> {
    self.faults.check()?;
    let mut tables = self.tables.lock().await;
    if let Some(line) = tables
      .cart
      .iter_mut()
      .find(|c| c.user_id == user_id && c.product_id == product_id)
    {
      line.quantity += quantity;
      return Ok(line.clone());
    }
    let line = CartItem {
      id: Uuid::new_v4(),
      user_id,
      product_id,
      quantity,
      added_at: Utc::now(),
    };
    tables.cart.push(line.clone());
    Ok(line)
  }

  async fn set_cart_quantity(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<Option<CartItem>> {
    self.faults.check()?;
    let mut tables = self.tables.lock().await;
    Ok(
      tables
        .cart
        .iter_mut()
        .find(|c| c.user_id == user_id && c.product_id == product_id)
        .map(|line| {
          line.quantity = quantity;
          line.clone()
        }),
    )
  }

  async fn remove_cart_lines(&self, user_id: Uuid, product_id: Option<Uuid>) -> Result<u64> {
    self.faults.check()?;
    let mut tables = self.tables.lock().await;
    let before = tables.cart.len();
    tables
      .cart
      .retain(|c| !(c.user_id == user_id && product_id.map_or(true, |p| p == c.product_id)));
    Ok((before - tables.cart.len()) as u64)
  }

  async fn begin(&self) -> Result<Box<dyn OrderTx>> {
    self.faults.check()?;
    let guard = Arc::clone(&self.tables).lock_owned().await;
    let staged = guard.clone();
    debug!("In-process transaction started.");
    Ok(Box::new(MemoryTx {
      guard,
      staged,
      faults: Arc::clone(&self.faults),
      commits: Arc::clone(&self.commits),
    }))
  }

  async fn orders_for_user(&self, user_id: Uuid, page: PageRequest) -> Result<Page<OrderWithItems>> {
    self.faults.check()?;
    let tables = self.tables.lock().await;
    let orders = tables.orders_newest_first(move |o| o.user_id == user_id);
    let total = orders.len() as i64;
    let items = orders
      .into_iter()
      .skip(page.offset() as usize)
      .take(page.limit as usize)
      .map(|o| tables.with_items(o))
      .collect();
    Ok(Page { items, total })
  }

  async fn order_for_user(&self, user_id: Uuid, order_id: Uuid) -> Result<Option<OrderWithItems>> {
    self.faults.check()?;
    let tables = self.tables.lock().await;
    Ok(
      tables
        .orders
        .iter()
        .find(|o| o.id == order_id && o.user_id == user_id)
        .map(|o| tables.with_items(o)),
    )
  }

  async fn admin_orders(&self, status: Option<OrderStatus>, page: PageRequest) -> Result<Page<AdminOrderView>> {
    self.faults.check()?;
    let tables = self.tables.lock().await;
    let customers = &tables.customers;
    let orders =
      tables.orders_newest_first(move |o| status.map_or(true, |s| s == o.status) && customers.contains_key(&o.user_id));
    let total = orders.len() as i64;
    let items = orders
      .into_iter()
      .skip(page.offset() as usize)
      .take(page.limit as usize)
      .filter_map(|o| {
        customers.get(&o.user_id).map(|c| AdminOrderView {
          order: o.clone(),
          customer_name: c.name.clone(),
          customer_phone: c.phone.clone(),
          customer_email: c.email.clone(),
          items: tables.item_views(o.id),
        })
      })
      .collect();
    Ok(Page { items, total })
  }

  async fn order(&self, order_id: Uuid) -> Result<Option<Order>> {
    self.faults.check()?;
    Ok(self.tables.lock().await.orders.iter().find(|o| o.id == order_id).cloned())
  }

  async fn update_order_status(
    &self,
    order_id: Uuid,
    status: Option<OrderStatus>,
    payment_status: Option<PaymentStatus>,
  ) -> Result<Option<Order>> {
    self.faults.check()?;
    let mut tables = self.tables.lock().await;
    Ok(tables.orders.iter_mut().find(|o| o.id == order_id).map(|o| {
      if let Some(s) = status {
        o.status = s;
      }
      if let Some(p) = payment_status {
        o.payment_status = p;
      }
      o.updated_at = Utc::now();
      o.clone()
    }))
  }

  async fn dashboard(&self, now: DateTime<Utc>, low_stock_threshold: i32) -> Result<DashboardSnapshot> {
    self.faults.check()?;
    let tables = self.tables.lock().await;
    Ok(dashboard::project(
      now,
      low_stock_threshold,
      &tables.orders,
      &tables.order_items,
      &tables.products,
    ))
  }

  async fn stats(&self) -> Result<StoreStats> {
    self.faults.check()?;
    let tables = self.tables.lock().await;
    Ok(dashboard::stats(tables.customers.len(), tables.products.len(), &tables.orders))
  }
}

struct MemoryTx {
  guard: OwnedMutexGuard<Tables>,
  staged: Tables,
  faults: Arc<Faults>,
  commits: Arc<AtomicU64>,
}

#[async_trait]
impl OrderTx for MemoryTx {
  async fn lock_stock(&mut self, product_ids: &[Uuid]) -> Result<HashMap<Uuid, i32>> {
    let delay = self.faults.write_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
      tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    self.faults.check()?;
    Ok(
      product_ids
        .iter()
        .filter_map(|id| self.staged.products.get(id).map(|p| (*id, p.stock_quantity)))
        .collect(),
    )
  }

  async fn decrement_stock(&mut self, product_id: Uuid, quantity: i32) -> Result<Option<i32>> {
    self.faults.check()?;
    Ok(match self.staged.products.get_mut(&product_id) {
      Some(p) if p.stock_quantity >= quantity => {
        p.stock_quantity -= quantity;
        p.updated_at = Utc::now();
        Some(p.stock_quantity)
      }
      _ => None,
    })
  }

  async fn stock_level(&mut self, product_id: Uuid) -> Result<Option<i32>> {
    self.faults.check()?;
    Ok(self.staged.products.get(&product_id).map(|p| p.stock_quantity))
  }

  async fn insert_order(&mut self, order: &Order) -> Result<()> {
    self.faults.check()?;
    if self.staged.orders.iter().any(|o| o.order_number == order.order_number) {
      return Err(AppError::Storage(format!(
        "duplicate order number {}",
        order.order_number
      )));
    }
    self.staged.orders.push(order.clone());
    Ok(())
  }

  async fn insert_order_item(&mut self, item: &OrderItem) -> Result<()> {
    self.faults.check()?;
    self.staged.order_items.push(item.clone());
    Ok(())
  }

  async fn clear_cart(&mut self, user_id: Uuid) -> Result<u64> {
    self.faults.check()?;
    let before = self.staged.cart.len();
    self.staged.cart.retain(|c| c.user_id != user_id);
    Ok((before - self.staged.cart.len()) as u64)
  }

  async fn customer(&mut self, user_id: Uuid) -> Result<Option<Customer>> {
    self.faults.check()?;
    Ok(self.staged.customers.get(&user_id).cloned())
  }

  async fn order_items(&mut self, order_id: Uuid) -> Result<Vec<OrderItemView>> {
    self.faults.check()?;
    Ok(self.staged.item_views(order_id))
  }

  async fn commit(self: Box<Self>) -> Result<()> {
    let delay = self.faults.commit_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
      tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    self.faults.check()?;
    if self.faults.fail_commits.load(Ordering::SeqCst) {
      return Err(AppError::Storage("commit failed".to_string()));
    }
    let MemoryTx {
      mut guard,
      staged,
      commits,
      ..
    } = *self;
    *guard = staged;
    commits.fetch_add(1, Ordering::SeqCst);
    debug!("In-process transaction committed.");
    Ok(())
  }
}
