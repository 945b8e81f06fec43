//! State a storefront client keeps between API calls.

pub mod cart;
pub mod session;

pub use cart::{Cart, CartError, CartItem, PurchaseLine};
pub use session::{Session, SessionError};
