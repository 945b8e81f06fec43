//! Aggregates module
pub mod product;
pub mod order;
pub mod user;

pub use product::{Product, ProductError, NewProduct, ProductPatch, ProductFilter, DEFAULT_IMAGE};
pub use order::{Order, OrderItem};
pub use user::{User, Role, UnknownRole};
