//! Sweet Shop Storefront
//!
//! REST API for a small confectionery shop.
//!
//! ## Features
//! - Account registration and login with bearer tokens
//! - Catalog browsing and search
//! - Admin catalog management and restocking
//! - Purchases with an atomic stock decrement and an order ledger
//! - Admin sales summary
//! - Client-side session and cart state

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod services;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{ApiError, StoreError};
pub use state::AppState;
pub use store::Stores;

/// Full application router, ready for `axum::serve`.
pub fn app(state: AppState) -> axum::Router {
    http::router(state)
}
