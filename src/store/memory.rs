//! In-process backend. Each collection sits behind its own lock, so stock
//! changes for a product are serialized by the products lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{OrderStore, ProductStore, StockTake, UserStore};
use crate::domain::aggregates::{Order, Product, ProductFilter, ProductPatch, Role, User};
use crate::domain::value_objects::Quantity;
use crate::error::{StoreError, StoreResult};

#[derive(Default)]
pub struct MemoryStore {
    products: RwLock<Vec<Product>>,
    users: RwLock<Vec<User>>,
    orders: RwLock<Vec<Order>>,
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Product>> {
        Ok(self.products.read().await.clone())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.products.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn search(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>> {
        Ok(self.products.read().await.iter().filter(|p| filter.matches(p)).cloned().collect())
    }

    async fn insert(&self, product: &Product) -> StoreResult<()> {
        self.products.write().await.push(product.clone());
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &ProductPatch) -> StoreResult<Option<Product>> {
        let mut products = self.products.write().await;
        Ok(products.iter_mut().find(|p| p.id == id).map(|p| {
            p.apply(patch);
            p.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() != before)
    }

    async fn take_stock(&self, id: Uuid, quantity: Quantity) -> StoreResult<StockTake> {
        let mut products = self.products.write().await;
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(StockTake::Missing);
        };
        match product.remove_inventory(quantity) {
            Ok(()) => Ok(StockTake::Taken(product.clone())),
            Err(_) => Ok(StockTake::Insufficient { available: product.quantity }),
        }
    }

    async fn add_stock(&self, id: Uuid, quantity: Quantity) -> StoreResult<Option<Product>> {
        let mut products = self.products.write().await;
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        product.add_inventory(quantity).map_err(|_| StoreError::QuantityOverflow)?;
        Ok(Some(product.clone()))
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.products.read().await.len() as u64)
    }

    async fn low_stock(&self, threshold: Quantity, limit: usize) -> StoreResult<Vec<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().filter(|p| p.is_low_stock(threshold)).take(limit).cloned().collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate("username"));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.username.as_str() == username).cloned())
    }

    async fn usernames(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, String>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .map(|u| (u.id, u.username.to_string()))
            .collect())
    }

    async fn count_by_role(&self, role: Role) -> StoreResult<u64> {
        Ok(self.users.read().await.iter().filter(|u| u.role == role).count() as u64)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn append(&self, order: &Order) -> StoreResult<()> {
        self.orders.write().await.push(order.clone());
        Ok(())
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.orders.read().await.len() as u64)
    }

    async fn total_revenue(&self) -> StoreResult<Decimal> {
        Ok(self.orders.read().await.iter().map(|o| o.total_amount).sum())
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<Order>> {
        // Reversed first so the stable sort keeps later appends ahead on ties.
        let mut orders: Vec<Order> = self.orders.read().await.iter().rev().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(limit);
        Ok(orders)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> StoreResult<u64> {
        Ok(self.orders.read().await.iter().filter(|o| o.created_at >= since).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::NewProduct;
    use crate::domain::value_objects::{Price, Username};
    use std::sync::Arc;

    fn chocolate(qty: u32) -> Product {
        Product::create(NewProduct {
            name: "Chocolate".into(), category: "Choco".into(),
            price: Price::new(Decimal::new(10, 0)).unwrap(), quantity: Quantity::new(qty), image: None,
        })
    }

    #[tokio::test]
    async fn take_stock_never_goes_negative() {
        let store = MemoryStore::default();
        let p = chocolate(5);
        ProductStore::insert(&store, &p).await.unwrap();

        assert!(matches!(store.take_stock(p.id, Quantity::new(5)).await.unwrap(), StockTake::Taken(t) if t.quantity.is_zero()));
        assert_eq!(store.take_stock(p.id, Quantity::ONE).await.unwrap(), StockTake::Insufficient { available: Quantity::new(0) });
        assert_eq!(store.take_stock(Uuid::new_v4(), Quantity::ONE).await.unwrap(), StockTake::Missing);
    }

    #[tokio::test]
    async fn concurrent_takes_do_not_oversell() {
        let store = Arc::new(MemoryStore::default());
        let p = chocolate(7);
        ProductStore::insert(store.as_ref(), &p).await.unwrap();
        let id = p.id;

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.take_stock(id, Quantity::ONE).await.unwrap() })
            })
            .collect();
        let mut taken = 0;
        for h in handles {
            if matches!(h.await.unwrap(), StockTake::Taken(_)) { taken += 1; }
        }
        assert_eq!(taken, 7);
        assert!(store.get(id).await.unwrap().unwrap().quantity.is_zero());
    }

    #[tokio::test]
    async fn add_stock_overflow_is_an_error() {
        let store = MemoryStore::default();
        let p = chocolate(u32::MAX);
        ProductStore::insert(&store, &p).await.unwrap();
        assert!(matches!(store.add_stock(p.id, Quantity::ONE).await, Err(StoreError::QuantityOverflow)));
        assert!(store.add_stock(Uuid::new_v4(), Quantity::ONE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_usernames_are_rejected() {
        let store = MemoryStore::default();
        let alice = User::register(Username::new("alice").unwrap(), "h".into(), Role::User);
        let again = User::register(Username::new("alice").unwrap(), "h2".into(), Role::Admin);
        UserStore::insert(&store, &alice).await.unwrap();
        assert!(matches!(UserStore::insert(&store, &again).await, Err(StoreError::Duplicate("username"))));
        assert_eq!(store.count_by_role(Role::User).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_reports_missing_on_repeat() {
        let store = MemoryStore::default();
        let p = chocolate(1);
        ProductStore::insert(&store, &p).await.unwrap();
        assert!(store.delete(p.id).await.unwrap());
        assert!(!store.delete(p.id).await.unwrap());
    }
}
