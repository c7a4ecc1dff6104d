// orderflow/src/flow/mod.rs

pub mod definition;
pub mod execution;
pub mod hooks;

pub use definition::Flow;
