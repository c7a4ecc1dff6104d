// storefront/src/models/mod.rs

//! Data structures representing database entities and their joined views.

pub mod cart_item;
pub mod customer;
pub mod order;
pub mod order_item;
pub mod page;
pub mod product;

pub use cart_item::{CartItem, CartLineView, CartSummary};
pub use customer::Customer;
pub use order::{AdminOrderView, Order, OrderStatus, PaymentMethod, PaymentStatus, ShippingAddress};
pub use order_item::{OrderItem, OrderItemView, OrderWithItems};
pub use page::{Page, PageQuery, PageRequest, Pagination};
pub use product::Product;
