//! Product Aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::{Price, Quantity};

pub const DEFAULT_IMAGE: &str = "https://placehold.co/400x300?text=No+Image";

/// A sellable sweet. `quantity` is the stock on hand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub price: Price,
    pub quantity: Quantity,
    pub image: String,
}

#[derive(Clone, Debug)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price: Price,
    pub quantity: Quantity,
    pub image: Option<String>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Clone, Debug, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Price>,
    pub quantity: Option<Quantity>,
    pub image: Option<String>,
}

impl Product {
    pub fn create(fields: NewProduct) -> Self {
        Self {
            id: Uuid::now_v7(), name: fields.name, category: fields.category,
            price: fields.price, quantity: fields.quantity,
            image: fields.image.filter(|i| !i.trim().is_empty()).unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
        }
    }

    pub fn is_in_stock(&self) -> bool { !self.quantity.is_zero() }
    pub fn is_low_stock(&self, threshold: Quantity) -> bool { self.quantity <= threshold }

    pub fn apply(&mut self, patch: &ProductPatch) {
        if let Some(name) = &patch.name { self.name = name.clone(); }
        if let Some(category) = &patch.category { self.category = category.clone(); }
        if let Some(price) = patch.price { self.price = price; }
        if let Some(quantity) = patch.quantity { self.quantity = quantity; }
        if let Some(image) = &patch.image { self.image = image.clone(); }
    }

    pub fn remove_inventory(&mut self, qty: Quantity) -> Result<(), ProductError> {
        self.quantity = self.quantity.subtract(qty).ok_or(ProductError::InsufficientInventory { available: self.quantity })?;
        Ok(())
    }

    pub fn add_inventory(&mut self, qty: Quantity) -> Result<(), ProductError> {
        self.quantity = self.quantity.add(qty).ok_or(ProductError::InventoryOverflow)?;
        Ok(())
    }
}

/// Conjunctive catalog filter. Absent fields impose no constraint.
#[derive(Clone, Debug, Default)]
pub struct ProductFilter {
    pub name_contains: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(q) = &self.name_contains {
            if !product.name.to_lowercase().contains(&q.to_lowercase()) { return false; }
        }
        if let Some(category) = &self.category {
            if &product.category != category { return false; }
        }
        let price = product.price.amount();
        if self.min_price.is_some_and(|min| price < min) { return false; }
        if self.max_price.is_some_and(|max| price > max) { return false; }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum ProductError { InsufficientInventory { available: Quantity }, InventoryOverflow }
impl std::error::Error for ProductError {}
impl std::fmt::Display for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientInventory { available } => write!(f, "Insufficient inventory, {available} available"),
            Self::InventoryOverflow => write!(f, "Inventory overflow"),
        }
    }
}
