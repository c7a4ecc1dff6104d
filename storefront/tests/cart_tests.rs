// storefront/tests/cart_tests.rs

mod common;

use common::Harness;
use storefront::errors::AppError;
use storefront::models::CartSummary;
use storefront::pipelines::cart_pipeline;
use storefront::store::Store;
use uuid::Uuid;

#[tokio::test]
async fn adding_twice_accumulates_the_line() {
  let h = Harness::new().await;
  let a = h.add_product("Masala Chai Tin", 249, Some(199), 10).await;

  cart_pipeline::add_to_cart(&h.state, h.customer_id, a, 2).await.unwrap();
  let item = cart_pipeline::add_to_cart(&h.state, h.customer_id, a, 3).await.unwrap();

  assert_eq!(item.quantity, 5);
  let lines = h.store.cart_lines(h.customer_id).await.unwrap();
  assert_eq!(lines.len(), 1);
  assert_eq!(lines[0].unit_price_cents(), 199);
  assert_eq!(CartSummary::of(&lines), CartSummary { count: 5, unique_items: 1 });
}

#[tokio::test]
async fn cart_quantity_counts_against_stock() {
  let h = Harness::new().await;
  let a = h.add_product("Clay Cups (Set of 4)", 349, None, 3).await;
  cart_pipeline::add_to_cart(&h.state, h.customer_id, a, 2).await.unwrap();

  let err = cart_pipeline::add_to_cart(&h.state, h.customer_id, a, 2).await.unwrap_err();

  match err {
    AppError::InsufficientStock {
      available, requested, ..
    } => {
      assert_eq!(available, 3);
      assert_eq!(requested, 4);
    }
    other => panic!("expected InsufficientStock, got {:?}", other),
  }
  assert_eq!(h.store.cart_lines(h.customer_id).await.unwrap()[0].quantity, 2);
}

#[tokio::test]
async fn unknown_inactive_and_non_positive_are_refused() {
  let h = Harness::new().await;
  let a = h.add_product("Brass Tea Kettle", 1_299, None, 8).await;

  let err = cart_pipeline::add_to_cart(&h.state, h.customer_id, Uuid::new_v4(), 1)
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::NotFound(ref m) if m == "Product not found"));

  let err = cart_pipeline::add_to_cart(&h.state, h.customer_id, a, 0).await.unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));

  h.store.set_active(a, false).await;
  let err = cart_pipeline::add_to_cart(&h.state, h.customer_id, a, 1).await.unwrap_err();
  assert!(matches!(err, AppError::ProductUnavailable { .. }));

  assert!(h.store.cart_lines(h.customer_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn storage_outage_surfaces_as_a_storage_error() {
  let h = Harness::new().await;
  let a = h.add_product("Brass Tea Kettle", 1_299, None, 8).await;
  h.store.set_unavailable(true);

  let err = cart_pipeline::add_to_cart(&h.state, h.customer_id, a, 1).await.unwrap_err();

  assert!(err.is_storage(), "got {:?}", err);
}
