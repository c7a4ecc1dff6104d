// orderflow/src/core/handler.rs

use crate::core::control::FlowControl;
use crate::core::state::FlowState;
use std::future::Future;
use std::pin::Pin;

/// A boxed asynchronous step handler.
///
/// Handlers receive a clone of the flow's `FlowState<TData>`. Lock guards
/// obtained through `read()`/`write()` must be dropped before the next
/// `.await`; the guards are not `Send`.
pub type Handler<TData, Err> = Box<
  dyn Fn(FlowState<TData>) -> Pin<Box<dyn Future<Output = Result<FlowControl, Err>> + Send>>
    + Send
    + Sync,
>;
