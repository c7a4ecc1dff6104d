// tests/registry_tests.rs
mod common;

use common::*;
use orderflow::{Flow, FlowControl, FlowOutcome, FlowRegistry, FlowState, StepDef};

#[derive(Clone, Debug, Default)]
struct CartState {
  lines: u32,
}

#[derive(Clone, Debug, Default)]
struct RefundState {
  refunded: bool,
}

#[tokio::test]
async fn dispatches_by_state_type() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();

  let mut cart = Flow::<CartState, TestError>::new("add_to_cart", vec![StepDef::required("upsert")]);
  cart.on("upsert", |state: FlowState<CartState>| async move {
    state.write().lines += 1;
    Ok::<_, TestError>(FlowControl::Continue)
  });
  registry.register(cart);

  let mut refund = Flow::<RefundState, TestError>::new("refund", vec![StepDef::required("mark")]);
  refund.on("mark", |state: FlowState<RefundState>| async move {
    state.write().refunded = true;
    Ok::<_, TestError>(FlowControl::Continue)
  });
  registry.register(refund);

  let cart_state = FlowState::new(CartState::default());
  assert_eq!(registry.run(cart_state.clone()).await.unwrap(), FlowOutcome::Completed);
  assert_eq!(cart_state.read().lines, 1);

  let refund_state = FlowState::new(RefundState::default());
  registry.run(refund_state.clone()).await.unwrap();
  assert!(refund_state.read().refunded);

  assert!(registry.is_registered::<CartState>());
  assert!(!registry.is_registered::<CheckoutTrace>());
}

#[tokio::test]
async fn unregistered_state_type_is_an_error() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();

  let result = registry.run(FlowState::new(RefundState::default())).await;

  match result {
    Err(TestError::Flow(msg)) => {
      assert!(msg.contains("NotRegistered"));
      assert!(msg.contains("RefundState"));
    }
    other => panic!("expected NotRegistered, got {:?}", other),
  }
}

#[tokio::test]
async fn handler_errors_pass_through_the_registry() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();
  let mut flow = Flow::<CheckoutTrace, TestError>::new("checkout", vec![StepDef::required("commit")]);
  flow.on("commit", failing_handler("commit", "out of stock"));
  registry.register(flow);

  let result = registry.run(FlowState::new(CheckoutTrace::default())).await;

  assert_eq!(result.unwrap_err(), TestError::Step("out of stock".to_string()));
}
