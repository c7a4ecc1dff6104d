// storefront/src/services/mod.rs

pub mod cart_snapshot;
pub mod dashboard;
pub mod inventory_ledger;
pub mod notifications;
pub mod order_number;
pub mod order_status;
pub mod order_transaction;
