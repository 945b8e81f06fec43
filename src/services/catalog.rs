//! Catalog queries and admin maintenance of the product collection.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::aggregates::{NewProduct, Product, ProductFilter, ProductPatch};
use crate::domain::events::ProductEvent;
use crate::error::{ApiError, Result};
use crate::services::EventBus;
use crate::store::ProductStore;

#[derive(Clone)]
pub struct Catalog {
    products: Arc<dyn ProductStore>,
    events: EventBus,
}

impl Catalog {
    pub fn new(products: Arc<dyn ProductStore>, events: EventBus) -> Self {
        Self { products, events }
    }

    pub async fn list_all(&self) -> Result<Vec<Product>> {
        Ok(self.products.list().await?)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Product> {
        self.products.get(id).await?.ok_or(ApiError::NotFound)
    }

    pub async fn search(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        Ok(self.products.search(filter).await?)
    }

    pub async fn create(&self, fields: NewProduct) -> Result<Product> {
        let product = Product::create(fields);
        self.products.insert(&product).await?;
        info!(product_id = %product.id, name = %product.name, "sweet created");
        self.events.publish(ProductEvent::Created { product_id: product.id, name: product.name.clone() }).await;
        Ok(product)
    }

    pub async fn update(&self, id: Uuid, patch: &ProductPatch) -> Result<Product> {
        let product = self.products.update(id, patch).await?.ok_or(ApiError::NotFound)?;
        info!(product_id = %id, "sweet updated");
        self.events.publish(ProductEvent::Updated { product_id: id }).await;
        Ok(product)
    }

    /// Not idempotent: deleting an absent id is `NotFound` every time.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.products.delete(id).await? {
            return Err(ApiError::NotFound);
        }
        info!(product_id = %id, "sweet deleted");
        self.events.publish(ProductEvent::Deleted { product_id: id }).await;
        Ok(())
    }
}
