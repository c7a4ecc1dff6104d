// storefront/src/services/dashboard.rs

//! Read-side projection behind the admin dashboard.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, Product};

pub const BEST_SELLER_LIMIT: usize = 5;
pub const LOW_STOCK_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SalesTotals {
  pub today_cents: i64,
  pub week_cents: i64,
  pub month_cents: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, sqlx::FromRow)]
pub struct StatusCount {
  pub status: OrderStatus,
  pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, sqlx::FromRow)]
pub struct BestSeller {
  pub product_id: Uuid,
  pub name: String,
  pub units: i64,
  pub revenue_cents: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, sqlx::FromRow)]
pub struct LowStockProduct {
  pub id: Uuid,
  pub name: String,
  pub stock_quantity: i32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, sqlx::FromRow)]
pub struct PaymentMethodRevenue {
  pub method: PaymentMethod,
  pub revenue_cents: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
  pub sales: SalesTotals,
  pub orders_by_status: Vec<StatusCount>,
  pub best_sellers: Vec<BestSeller>,
  pub low_stock: Vec<LowStockProduct>,
  pub payment_revenue: Vec<PaymentMethodRevenue>,
}

/// Headline counts for the admin overview.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, sqlx::FromRow)]
pub struct StoreStats {
  pub users: i64,
  pub products: i64,
  pub revenue_cents: i64,
}

/// Lower bounds (UTC) of the three sales windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesWindows {
  pub today: DateTime<Utc>,
  pub week: DateTime<Utc>,
  pub month: DateTime<Utc>,
}

impl SalesWindows {
  pub fn at(now: DateTime<Utc>) -> Self {
    let date = now.date_naive();
    let midnight = |d: chrono::NaiveDate| Utc.from_utc_datetime(&d.and_time(chrono::NaiveTime::MIN));
    let today = midnight(date);
    let month = midnight(date.with_day(1).unwrap_or(date));
    SalesWindows {
      today,
      week: today - Duration::days(7),
      month,
    }
  }
}

/// An order counts towards revenue once it is paid or has been confirmed.
pub fn counts_as_revenue(status: OrderStatus, payment_status: PaymentStatus) -> bool {
  payment_status == PaymentStatus::Paid
    || matches!(
      status,
      OrderStatus::Confirmed | OrderStatus::Shipped | OrderStatus::Delivered
    )
}

pub fn stats(users: usize, products: usize, orders: &[Order]) -> StoreStats {
  StoreStats {
    users: users as i64,
    products: products as i64,
    revenue_cents: orders
      .iter()
      .filter(|o| counts_as_revenue(o.status, o.payment_status))
      .map(|o| o.total_amount_cents)
      .sum(),
  }
}

/// Builds the dashboard from fully loaded tables. The SQL store computes the
/// same figures with aggregate queries.
pub fn project(
  now: DateTime<Utc>,
  low_stock_threshold: i32,
  orders: &[Order],
  items: &[OrderItem],
  products: &HashMap<Uuid, Product>,
) -> DashboardSnapshot {
  let windows = SalesWindows::at(now);
  let revenue: Vec<&Order> = orders
    .iter()
    .filter(|o| counts_as_revenue(o.status, o.payment_status))
    .collect();
  let since = |from: DateTime<Utc>| -> i64 {
    revenue
      .iter()
      .filter(|o| o.created_at >= from)
      .map(|o| o.total_amount_cents)
      .sum()
  };
  let sales = SalesTotals {
    today_cents: since(windows.today),
    week_cents: since(windows.week),
    month_cents: since(windows.month),
  };

  let orders_by_status = OrderStatus::ALL
    .into_iter()
    .filter_map(|status| {
      let count = orders.iter().filter(|o| o.status == status).count() as i64;
      (count > 0).then_some(StatusCount { status, count })
    })
    .collect();

  let mut sold: HashMap<Uuid, (i64, i64)> = HashMap::new();
  for item in items {
    let entry = sold.entry(item.product_id).or_default();
    entry.0 += i64::from(item.quantity);
    entry.1 += item.unit_price_cents * i64::from(item.quantity);
  }
  let mut best_sellers: Vec<BestSeller> = sold
    .into_iter()
    .filter_map(|(product_id, (units, revenue_cents))| {
      products.get(&product_id).map(|p| BestSeller {
        product_id,
        name: p.name.clone(),
        units,
        revenue_cents,
      })
    })
    .collect();
  best_sellers.sort_by(|a, b| b.units.cmp(&a.units).then_with(|| a.product_id.cmp(&b.product_id)));
  best_sellers.truncate(BEST_SELLER_LIMIT);

  let mut low_stock: Vec<LowStockProduct> = products
    .values()
    .filter(|p| p.stock_quantity < low_stock_threshold)
    .map(|p| LowStockProduct {
      id: p.id,
      name: p.name.clone(),
      stock_quantity: p.stock_quantity,
    })
    .collect();
  low_stock.sort_by(|a, b| a.stock_quantity.cmp(&b.stock_quantity).then_with(|| a.id.cmp(&b.id)));
  low_stock.truncate(LOW_STOCK_LIMIT);

  let payment_revenue = [PaymentMethod::Cod, PaymentMethod::Online]
    .into_iter()
    .filter_map(|method| {
      let mut matching = revenue.iter().filter(|o| o.payment_method == method).peekable();
      matching.peek()?;
      Some(PaymentMethodRevenue {
        method,
        revenue_cents: matching.map(|o| o.total_amount_cents).sum(),
      })
    })
    .collect();

  DashboardSnapshot {
    sales,
    orders_by_status,
    best_sellers,
    low_stock,
    payment_revenue,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::ShippingAddress;
  use chrono::TimeZone;
  use sqlx::types::Json;

  fn order(status: OrderStatus, payment: PaymentStatus, method: PaymentMethod, total: i64, at: DateTime<Utc>) -> Order {
    Order {
      id: Uuid::new_v4(),
      order_number: "ORD-1-a".to_string(),
      user_id: Uuid::nil(),
      total_amount_cents: total,
      payment_method: method,
      payment_status: payment,
      status,
      shipping_address: Json(ShippingAddress {
        full_name: None,
        phone: None,
        address: "a".into(),
        city: "c".into(),
        state: "s".into(),
        pincode: "1".into(),
      }),
      created_at: at,
      updated_at: at,
    }
  }

  fn product(name: &str, stock: i32) -> Product {
    let now = Utc::now();
    Product {
      id: Uuid::new_v4(),
      name: name.to_string(),
      description: None,
      images: vec![],
      price_cents: 100,
      discount_price_cents: None,
      stock_quantity: stock,
      is_active: true,
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn revenue_predicate() {
    assert!(counts_as_revenue(OrderStatus::Pending, PaymentStatus::Paid));
    assert!(counts_as_revenue(OrderStatus::Shipped, PaymentStatus::Pending));
    assert!(!counts_as_revenue(OrderStatus::Pending, PaymentStatus::Pending));
    assert!(!counts_as_revenue(OrderStatus::Cancelled, PaymentStatus::Refunded));
  }

  #[test]
  fn stats_sum_revenue_orders_only() {
    let now = Utc::now();
    let orders = vec![
      order(OrderStatus::Shipped, PaymentStatus::Pending, PaymentMethod::Cod, 400, now),
      order(OrderStatus::Pending, PaymentStatus::Pending, PaymentMethod::Cod, 900, now),
      order(OrderStatus::Cancelled, PaymentStatus::Paid, PaymentMethod::Online, 50, now),
    ];
    assert_eq!(
      stats(3, 7, &orders),
      StoreStats {
        users: 3,
        products: 7,
        revenue_cents: 450,
      }
    );
  }

  #[test]
  fn windows_start_at_utc_midnight() {
    let now = Utc.with_ymd_and_hms(2024, 3, 15, 13, 45, 0).unwrap();
    let w = SalesWindows::at(now);
    assert_eq!(w.today, Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
    assert_eq!(w.week, Utc.with_ymd_and_hms(2024, 3, 8, 0, 0, 0).unwrap());
    assert_eq!(w.month, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
  }

  #[test]
  fn projection_counts_only_revenue_orders_in_each_window() {
    let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
    let orders = vec![
      order(OrderStatus::Confirmed, PaymentStatus::Pending, PaymentMethod::Cod, 1000, now),
      order(OrderStatus::Pending, PaymentStatus::Pending, PaymentMethod::Cod, 5000, now),
      order(OrderStatus::Delivered, PaymentStatus::Paid, PaymentMethod::Online, 300, now - Duration::days(3)),
      order(OrderStatus::Pending, PaymentStatus::Paid, PaymentMethod::Online, 70, now - Duration::days(12)),
    ];
    let snap = project(now, 10, &orders, &[], &HashMap::new());

    assert_eq!(
      snap.sales,
      SalesTotals {
        today_cents: 1000,
        week_cents: 1300,
        month_cents: 1370,
      }
    );
    assert_eq!(
      snap.orders_by_status,
      vec![
        StatusCount { status: OrderStatus::Pending, count: 2 },
        StatusCount { status: OrderStatus::Confirmed, count: 1 },
        StatusCount { status: OrderStatus::Delivered, count: 1 },
      ]
    );
    assert_eq!(
      snap.payment_revenue,
      vec![
        PaymentMethodRevenue { method: PaymentMethod::Cod, revenue_cents: 1000 },
        PaymentMethodRevenue { method: PaymentMethod::Online, revenue_cents: 370 },
      ]
    );
  }

  #[test]
  fn best_sellers_and_low_stock_are_ranked_and_capped() {
    let products: Vec<Product> = (0..12).map(|i| product(&format!("p{}", i), i)).collect();
    let items: Vec<OrderItem> = products
      .iter()
      .enumerate()
      .map(|(i, p)| OrderItem {
        id: Uuid::new_v4(),
        order_id: Uuid::nil(),
        product_id: p.id,
        quantity: i as i32 + 1,
        unit_price_cents: 10,
      })
      .collect();
    let by_id: HashMap<Uuid, Product> = products.iter().map(|p| (p.id, p.clone())).collect();

    let snap = project(Utc::now(), 10, &[], &items, &by_id);

    assert_eq!(snap.best_sellers.len(), BEST_SELLER_LIMIT);
    assert_eq!(snap.best_sellers[0].name, "p11");
    assert_eq!(snap.best_sellers[0].units, 12);
    assert_eq!(snap.best_sellers[0].revenue_cents, 120);

    // stocks 0..=9 are below the threshold
    assert_eq!(snap.low_stock.len(), 10);
    assert_eq!(snap.low_stock[0].stock_quantity, 0);
    assert!(snap.low_stock.iter().all(|p| p.stock_quantity < 10));
  }
}
