//! Cart

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::Product;
use crate::domain::value_objects::{Price, Quantity};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartItem {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Price,
    pub quantity: Quantity,
    /// Stock seen when the item was last added.
    pub available: Quantity,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal { self.unit_price.multiply(self.quantity) }
}

/// One `POST /api/sweets/:id/purchase` call issued at checkout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PurchaseLine {
    #[serde(skip)]
    pub product_id: Uuid,
    pub quantity: Quantity,
}

impl PurchaseLine {
    pub fn path(&self) -> String { format!("/api/sweets/{}/purchase", self.product_id) }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartError {
    OutOfStock,
    StockLimit { available: Quantity },
    ItemNotFound,
}

impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfStock => write!(f, "Out of stock"),
            Self::StockLimit { available } => write!(f, "Only {available} in stock"),
            Self::ItemNotFound => write!(f, "Item not found"),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn unit_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity.value())).sum()
    }

    /// Adds one unit of `product`. The cart never holds more than the stock
    /// reported by the product.
    pub fn add(&mut self, product: &Product) -> Result<Quantity, CartError> {
        if !product.is_in_stock() {
            return Err(CartError::OutOfStock);
        }
        let available = product.quantity;
        match self.items.iter_mut().find(|i| i.product_id == product.id) {
            Some(existing) => {
                let next = existing.quantity.add(Quantity::ONE).filter(|q| *q <= available);
                existing.available = available;
                existing.unit_price = product.price;
                existing.quantity = next.ok_or(CartError::StockLimit { available })?;
                Ok(existing.quantity)
            }
            None => {
                self.items.push(CartItem {
                    product_id: product.id, name: product.name.clone(),
                    unit_price: product.price, quantity: Quantity::ONE, available,
                });
                Ok(Quantity::ONE)
            }
        }
    }

    pub fn remove(&mut self, product_id: Uuid) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before { return Err(CartError::ItemNotFound); }
        Ok(())
    }

    pub fn clear(&mut self) { self.items.clear(); }

    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn purchase_lines(&self) -> Vec<PurchaseLine> {
        self.items.iter().map(|i| PurchaseLine { product_id: i.product_id, quantity: i.quantity }).collect()
    }
}
