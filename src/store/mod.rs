//! Storage seams for the three collections.
//!
//! Every backend must perform `take_stock` as a single conditional update:
//! the stock check and the decrement happen together or not at all.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{Order, Product, ProductFilter, ProductPatch, Role, User};
use crate::domain::value_objects::Quantity;
use crate::error::StoreResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockTake {
    Taken(Product),
    Insufficient { available: Quantity },
    Missing,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Product>>;
    async fn get(&self, id: Uuid) -> StoreResult<Option<Product>>;
    async fn search(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>>;
    async fn insert(&self, product: &Product) -> StoreResult<()>;
    async fn update(&self, id: Uuid, patch: &ProductPatch) -> StoreResult<Option<Product>>;
    /// `false` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
    /// Atomically decrement stock if at least `quantity` units are on hand.
    async fn take_stock(&self, id: Uuid, quantity: Quantity) -> StoreResult<StockTake>;
    async fn add_stock(&self, id: Uuid, quantity: Quantity) -> StoreResult<Option<Product>>;
    async fn count(&self) -> StoreResult<u64>;
    async fn low_stock(&self, threshold: Quantity, limit: usize) -> StoreResult<Vec<Product>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `StoreError::Duplicate("username")` when the name is taken.
    async fn insert(&self, user: &User) -> StoreResult<()>;
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn usernames(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, String>>;
    async fn count_by_role(&self, role: Role) -> StoreResult<u64>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn append(&self, order: &Order) -> StoreResult<()>;
    async fn count(&self) -> StoreResult<u64>;
    async fn total_revenue(&self) -> StoreResult<Decimal>;
    /// Newest first.
    async fn recent(&self, limit: usize) -> StoreResult<Vec<Order>>;
    async fn count_since(&self, since: DateTime<Utc>) -> StoreResult<u64>;
}

/// The three collections, possibly served by one backend.
#[derive(Clone)]
pub struct Stores {
    pub products: Arc<dyn ProductStore>,
    pub users: Arc<dyn UserStore>,
    pub orders: Arc<dyn OrderStore>,
}

impl Stores {
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::default());
        Self { products: store.clone(), users: store.clone(), orders: store }
    }

    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self { products: store.clone(), users: store.clone(), orders: store }
    }
}
