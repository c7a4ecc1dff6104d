// storefront/src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::{OrderTx, Store};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::models::{
  AdminOrderView, CartItem, CartLineView, Customer, Order, OrderItem, OrderItemView, OrderStatus, OrderWithItems, Page,
  PageRequest, PaymentStatus, Product,
};
use crate::services::dashboard::{
  BestSeller, DashboardSnapshot, LowStockProduct, PaymentMethodRevenue, SalesTotals, SalesWindows, StatusCount,
  StoreStats, BEST_SELLER_LIMIT, LOW_STOCK_LIMIT,
};

const ORDER_COLUMNS: &str = "o.id, o.order_number, o.user_id, o.total_amount_cents, o.payment_method, \
  o.payment_status, o.status, o.shipping_address, o.created_at, o.updated_at";

const ITEM_VIEW_SELECT: &str = "SELECT oi.id, oi.order_id, oi.product_id, p.name AS product_name, p.images, \
  oi.quantity, oi.unit_price_cents, oi.unit_price_cents * oi.quantity AS line_total_cents \
  FROM order_items oi JOIN products p ON oi.product_id = p.id";

/// `o` must be the orders alias in the surrounding query.
const REVENUE_PREDICATE: &str = "(o.payment_status = 'paid' OR o.status IN ('confirmed', 'shipped', 'delivered'))";

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
  statement_timeout: Duration,
}

impl PgStore {
  pub fn new(pool: PgPool, statement_timeout: Duration) -> Self {
    Self {
      pool,
      statement_timeout,
    }
  }

  /// Opens the pool described by `config`. Fails when no database URL is configured.
  pub async fn connect(config: &AppConfig) -> Result<Self> {
    let url = config
      .database_url
      .as_deref()
      .ok_or_else(|| AppError::Config("DATABASE_URL is not set".to_string()))?;
    let pool = PgPoolOptions::new()
      .max_connections(config.db_max_connections)
      .acquire_timeout(config.storage_timeout)
      .connect(url)
      .await?;
    info!(max_connections = config.db_max_connections, "Successfully connected to the database.");
    Ok(Self::new(pool, config.storage_timeout))
  }

  pub async fn migrate(&self) -> Result<()> {
    sqlx::migrate!("./migrations")
      .run(&self.pool)
      .await
      .map_err(|e| AppError::Storage(format!("migration failed: {}", e)))?;
    info!("Database migrations applied.");
    Ok(())
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  async fn items_for_orders(&self, order_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<OrderItemView>>> {
    if order_ids.is_empty() {
      return Ok(HashMap::new());
    }
    let rows: Vec<ItemRow> = sqlx::query_as(&format!(
      "{} WHERE oi.order_id = ANY($1) ORDER BY oi.order_id, p.name",
      ITEM_VIEW_SELECT
    ))
    .bind(order_ids)
    .fetch_all(&self.pool)
    .await?;
    let mut grouped: HashMap<Uuid, Vec<OrderItemView>> = HashMap::new();
    for row in rows {
      grouped.entry(row.order_id).or_default().push(row.item);
    }
    Ok(grouped)
  }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
  order_id: Uuid,
  #[sqlx(flatten)]
  item: OrderItemView,
}

#[derive(sqlx::FromRow)]
struct SalesRow {
  today_cents: i64,
  week_cents: i64,
  month_cents: i64,
}

#[async_trait]
impl Store for PgStore {
  async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLineView>> {
    let lines = sqlx::query_as::<_, CartLineView>(
      r#"
      SELECT c.product_id, p.name AS product_name, p.images, p.price_cents, p.discount_price_cents,
             p.stock_quantity, p.is_active, c.quantity, c.added_at
      FROM cart_items c
      JOIN products p ON c.product_id = p.id
      WHERE c.user_id = $1
      ORDER BY c.added_at, c.product_id
      "#,
    )
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(lines)
  }

  async fn product(&self, product_id: Uuid) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
      "SELECT id, name, description, images, price_cents, discount_price_cents, stock_quantity, is_active, \
       created_at, updated_at FROM products WHERE id = $1",
    )
    .bind(product_id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(product)
  }

  async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem> {
    let item = sqlx::query_as::<_, CartItem>(
      r#"
      INSERT INTO cart_items (id, user_id, product_id, quantity, added_at)
      VALUES ($1, $2, $3, $4, NOW())
      ON CONFLICT (user_id, product_id) DO UPDATE
      SET quantity = cart_items.quantity + EXCLUDED.quantity
      RETURNING id, user_id, product_id, quantity, added_at
      "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(&self.pool)
    .await?;
    Ok(item)
  }

  async fn set_cart_quantity(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<Option<CartItem>> {
    let item = sqlx::query_as::<_, CartItem>(
      "UPDATE cart_items SET quantity = $3 WHERE user_id = $1 AND product_id = $2 \
       RETURNING id, user_id, product_id, quantity, added_at",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_optional(&self.pool)
    .await?;
    Ok(item)
  }

  async fn remove_cart_lines(&self, user_id: Uuid, product_id: Option<Uuid>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND ($2::UUID IS NULL OR product_id = $2)")
      .bind(user_id)
      .bind(product_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected())
  }

  async fn begin(&self) -> Result<Box<dyn OrderTx>> {
    let mut tx = self.pool.begin().await?;
    // SET does not take bind parameters.
    sqlx::query(&format!(
      "SET LOCAL statement_timeout = {}",
      self.statement_timeout.as_millis()
    ))
    .execute(&mut *tx)
    .await?;
    debug!("Database transaction started.");
    Ok(Box::new(PgOrderTx { tx }))
  }

  async fn orders_for_user(&self, user_id: Uuid, page: PageRequest) -> Result<Page<OrderWithItems>> {
    let orders: Vec<Order> = sqlx::query_as(&format!(
      "SELECT {} FROM orders o WHERE o.user_id = $1 ORDER BY o.created_at DESC LIMIT $2 OFFSET $3",
      ORDER_COLUMNS
    ))
    .bind(user_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(&self.pool)
    .await?;
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
      .bind(user_id)
      .fetch_one(&self.pool)
      .await?;

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut items = self.items_for_orders(&ids).await?;
    let items = orders
      .into_iter()
      .map(|order| OrderWithItems {
        items: items.remove(&order.id).unwrap_or_default(),
        order,
      })
      .collect();
    Ok(Page { items, total })
  }

  async fn order_for_user(&self, user_id: Uuid, order_id: Uuid) -> Result<Option<OrderWithItems>> {
    let order: Option<Order> = sqlx::query_as(&format!(
      "SELECT {} FROM orders o WHERE o.id = $1 AND o.user_id = $2",
      ORDER_COLUMNS
    ))
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(&self.pool)
    .await?;
    let Some(order) = order else {
      return Ok(None);
    };
    let mut items = self.items_for_orders(&[order.id]).await?;
    Ok(Some(OrderWithItems {
      items: items.remove(&order.id).unwrap_or_default(),
      order,
    }))
  }

  async fn admin_orders(&self, status: Option<OrderStatus>, page: PageRequest) -> Result<Page<AdminOrderView>> {
    let mut orders: Vec<AdminOrderView> = sqlx::query_as(&format!(
      r#"
      SELECT {}, u.name AS customer_name, u.phone AS customer_phone, u.email AS customer_email
      FROM orders o
      JOIN users u ON o.user_id = u.id
      WHERE ($1::order_status_enum IS NULL OR o.status = $1)
      ORDER BY o.created_at DESC
      LIMIT $2 OFFSET $3
      "#,
      ORDER_COLUMNS
    ))
    .bind(status)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(&self.pool)
    .await?;
    let total: i64 = sqlx::query_scalar(
      "SELECT COUNT(*) FROM orders o JOIN users u ON o.user_id = u.id \
       WHERE ($1::order_status_enum IS NULL OR o.status = $1)",
    )
    .bind(status)
    .fetch_one(&self.pool)
    .await?;

    let ids: Vec<Uuid> = orders.iter().map(|o| o.order.id).collect();
    let mut items = self.items_for_orders(&ids).await?;
    for view in &mut orders {
      view.items = items.remove(&view.order.id).unwrap_or_default();
    }
    Ok(Page { items: orders, total })
  }

  async fn order(&self, order_id: Uuid) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!("SELECT {} FROM orders o WHERE o.id = $1", ORDER_COLUMNS))
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(order)
  }

  async fn update_order_status(
    &self,
    order_id: Uuid,
    status: Option<OrderStatus>,
    payment_status: Option<PaymentStatus>,
  ) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
      r#"
      UPDATE orders o
      SET status = COALESCE($2, o.status),
          payment_status = COALESCE($3, o.payment_status),
          updated_at = NOW()
      WHERE o.id = $1
      RETURNING o.id, o.order_number, o.user_id, o.total_amount_cents, o.payment_method,
                o.payment_status, o.status, o.shipping_address, o.created_at, o.updated_at
      "#,
    )
    .bind(order_id)
    .bind(status)
    .bind(payment_status)
    .fetch_optional(&self.pool)
    .await?;
    Ok(order)
  }

  async fn dashboard(&self, now: DateTime<Utc>, low_stock_threshold: i32) -> Result<DashboardSnapshot> {
    let windows = SalesWindows::at(now);

    let sales: SalesRow = sqlx::query_as(&format!(
      r#"
      SELECT COALESCE(SUM(o.total_amount_cents) FILTER (WHERE o.created_at >= $1), 0)::BIGINT AS today_cents,
             COALESCE(SUM(o.total_amount_cents) FILTER (WHERE o.created_at >= $2), 0)::BIGINT AS week_cents,
             COALESCE(SUM(o.total_amount_cents) FILTER (WHERE o.created_at >= $3), 0)::BIGINT AS month_cents
      FROM orders o
      WHERE {}
      "#,
      REVENUE_PREDICATE
    ))
    .bind(windows.today)
    .bind(windows.week)
    .bind(windows.month)
    .fetch_one(&self.pool)
    .await?;

    let orders_by_status: Vec<StatusCount> =
      sqlx::query_as("SELECT status, COUNT(*)::BIGINT AS count FROM orders GROUP BY status ORDER BY status")
        .fetch_all(&self.pool)
        .await?;

    let best_sellers: Vec<BestSeller> = sqlx::query_as(
      r#"
      SELECT p.id AS product_id, p.name, SUM(oi.quantity)::BIGINT AS units,
             SUM(oi.quantity * oi.unit_price_cents)::BIGINT AS revenue_cents
      FROM order_items oi
      JOIN products p ON p.id = oi.product_id
      GROUP BY p.id, p.name
      ORDER BY units DESC, p.id
      LIMIT $1
      "#,
    )
    .bind(BEST_SELLER_LIMIT as i64)
    .fetch_all(&self.pool)
    .await?;

    let low_stock: Vec<LowStockProduct> = sqlx::query_as(
      "SELECT id, name, stock_quantity FROM products WHERE stock_quantity < $1 \
       ORDER BY stock_quantity ASC, id LIMIT $2",
    )
    .bind(low_stock_threshold)
    .bind(LOW_STOCK_LIMIT as i64)
    .fetch_all(&self.pool)
    .await?;

    let payment_revenue: Vec<PaymentMethodRevenue> = sqlx::query_as(&format!(
      "SELECT o.payment_method AS method, COALESCE(SUM(o.total_amount_cents), 0)::BIGINT AS revenue_cents \
       FROM orders o WHERE {} GROUP BY o.payment_method ORDER BY o.payment_method",
      REVENUE_PREDICATE
    ))
    .fetch_all(&self.pool)
    .await?;

    Ok(DashboardSnapshot {
      sales: SalesTotals {
        today_cents: sales.today_cents,
        week_cents: sales.week_cents,
        month_cents: sales.month_cents,
      },
      orders_by_status,
      best_sellers,
      low_stock,
      payment_revenue,
    })
  }

  async fn stats(&self) -> Result<StoreStats> {
    let stats: StoreStats = sqlx::query_as(&format!(
      r#"
      SELECT (SELECT COUNT(*) FROM users)::BIGINT AS users,
             (SELECT COUNT(*) FROM products)::BIGINT AS products,
             (SELECT COALESCE(SUM(o.total_amount_cents), 0) FROM orders o WHERE {})::BIGINT AS revenue_cents
      "#,
      REVENUE_PREDICATE
    ))
    .fetch_one(&self.pool)
    .await?;
    Ok(stats)
  }
}

struct PgOrderTx {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl OrderTx for PgOrderTx {
  async fn lock_stock(&mut self, product_ids: &[Uuid]) -> Result<HashMap<Uuid, i32>> {
    let mut ids = product_ids.to_vec();
    ids.sort();
    ids.dedup();
    let rows: Vec<(Uuid, i32)> =
      sqlx::query_as("SELECT id, stock_quantity FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE")
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await?;
    Ok(rows.into_iter().collect())
  }

  async fn decrement_stock(&mut self, product_id: Uuid, quantity: i32) -> Result<Option<i32>> {
    let remaining: Option<i32> = sqlx::query_scalar(
      "UPDATE products SET stock_quantity = stock_quantity - $2, updated_at = NOW() \
       WHERE id = $1 AND stock_quantity >= $2 RETURNING stock_quantity",
    )
    .bind(product_id)
    .bind(quantity)
    .fetch_optional(&mut *self.tx)
    .await?;
    Ok(remaining)
  }

  async fn stock_level(&mut self, product_id: Uuid) -> Result<Option<i32>> {
    let level: Option<i32> = sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = $1")
      .bind(product_id)
      .fetch_optional(&mut *self.tx)
      .await?;
    Ok(level)
  }

  async fn insert_order(&mut self, order: &Order) -> Result<()> {
    sqlx::query(
      r#"
      INSERT INTO orders (id, order_number, user_id, total_amount_cents, payment_method, payment_status,
                          status, shipping_address, created_at, updated_at)
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
      "#,
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(order.user_id)
    .bind(order.total_amount_cents)
    .bind(order.payment_method)
    .bind(order.payment_status)
    .bind(order.status)
    .bind(&order.shipping_address)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *self.tx)
    .await?;
    Ok(())
  }

  async fn insert_order_item(&mut self, item: &OrderItem) -> Result<()> {
    sqlx::query(
      "INSERT INTO order_items (id, order_id, product_id, quantity, unit_price_cents) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(item.id)
    .bind(item.order_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .execute(&mut *self.tx)
    .await?;
    Ok(())
  }

  async fn clear_cart(&mut self, user_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
      .bind(user_id)
      .execute(&mut *self.tx)
      .await?;
    Ok(result.rows_affected())
  }

  async fn customer(&mut self, user_id: Uuid) -> Result<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>("SELECT id, name, email, phone, role FROM users WHERE id = $1")
      .bind(user_id)
      .fetch_optional(&mut *self.tx)
      .await?;
    Ok(customer)
  }

  async fn order_items(&mut self, order_id: Uuid) -> Result<Vec<OrderItemView>> {
    let rows: Vec<ItemRow> = sqlx::query_as(&format!(
      "{} WHERE oi.order_id = $1 ORDER BY p.name",
      ITEM_VIEW_SELECT
    ))
    .bind(order_id)
    .fetch_all(&mut *self.tx)
    .await?;
    Ok(rows.into_iter().map(|r| r.item).collect())
  }

  async fn commit(self: Box<Self>) -> Result<()> {
    self.tx.commit().await?;
    debug!("Database transaction committed.");
    Ok(())
  }
}
