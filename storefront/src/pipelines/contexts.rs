// storefront/src/pipelines/contexts.rs

//! State carried through each flow. Handlers receive it wrapped in
//! `orderflow::FlowState`.

use crate::models::{CartItem, Customer, OrderWithItems, PaymentMethod, Product, ShippingAddress};
use crate::services::cart_snapshot::PricedLine;
use crate::state::AppState;
use uuid::Uuid;

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub authenticated_user_id: Uuid,
  pub shipping_address: Option<ShippingAddress>,
  pub payment_method: PaymentMethod,
  pub priced_lines: Vec<PricedLine>,
  pub placed_order: Option<OrderWithItems>,
  pub customer: Option<Customer>,
  pub notifications_queued: bool,
}

impl CheckoutCtxData {
  pub fn new(
    app_state: AppState,
    authenticated_user_id: Uuid,
    shipping_address: Option<ShippingAddress>,
    payment_method: PaymentMethod,
  ) -> Self {
    Self {
      app_state,
      authenticated_user_id,
      shipping_address,
      payment_method,
      priced_lines: Vec::new(),
      placed_order: None,
      customer: None,
      notifications_queued: false,
    }
  }
}

#[derive(Clone)]
pub struct AddToCartCtxData {
  pub app_state: AppState,
  pub authenticated_user_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub product: Option<Product>,
  pub updated_cart_item: Option<CartItem>,
}
