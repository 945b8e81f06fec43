//! Purchases and restocks.
//!
//! A purchase takes stock with one conditional update, then appends the
//! order. When the append fails the taken units are put back.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::aggregates::Order;
use crate::domain::events::{OrderEvent, ProductEvent};
use crate::domain::value_objects::Quantity;
use crate::error::{ApiError, Result, StoreError};
use crate::services::EventBus;
use crate::store::{OrderStore, ProductStore, StockTake};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub remaining: Quantity,
    /// `None` when no buyer was attached and the ledger was skipped.
    pub order: Option<Order>,
}

#[derive(Clone)]
pub struct Inventory {
    products: Arc<dyn ProductStore>,
    orders: Arc<dyn OrderStore>,
    events: EventBus,
}

/// Absent or zero quantities count as one unit.
fn units(quantity: Option<Quantity>) -> Quantity {
    quantity.filter(|q| !q.is_zero()).unwrap_or(Quantity::ONE)
}

impl Inventory {
    pub fn new(products: Arc<dyn ProductStore>, orders: Arc<dyn OrderStore>, events: EventBus) -> Self {
        Self { products, orders, events }
    }

    pub async fn purchase(&self, product_id: Uuid, buyer: Option<Uuid>, quantity: Option<Quantity>) -> Result<Purchase> {
        let quantity = units(quantity);
        let product = match self.products.take_stock(product_id, quantity).await? {
            StockTake::Taken(p) => p,
            StockTake::Insufficient { available } => {
                warn!(%product_id, requested = %quantity, %available, "insufficient stock");
                return Err(ApiError::InsufficientStock { available });
            }
            StockTake::Missing => return Err(ApiError::NotFound),
        };

        // TODO: decide whether anonymous purchases should be rejected instead of going unrecorded.
        let order = match buyer {
            Some(user_id) => {
                let order = Order::for_purchase(user_id, &product, quantity);
                if let Err(e) = self.orders.append(&order).await {
                    self.restore(product_id, quantity).await;
                    return Err(e.into());
                }
                Some(order)
            }
            None => {
                warn!(%product_id, "purchase without buyer, order not recorded");
                None
            }
        };

        info!(%product_id, quantity = %quantity, remaining = %product.quantity, "purchase successful");
        self.events.publish(ProductEvent::Purchased { product_id, quantity, remaining: product.quantity }).await;
        if let Some(order) = &order {
            self.events.publish(OrderEvent::Recorded { order_id: order.id, user_id: order.user_id, total: order.total_amount }).await;
        }
        Ok(Purchase { remaining: product.quantity, order })
    }

    /// Returns the new on-hand quantity. No upper bound beyond integer range.
    pub async fn restock(&self, product_id: Uuid, quantity: Option<Quantity>) -> Result<Quantity> {
        let quantity = units(quantity);
        let product = match self.products.add_stock(product_id, quantity).await {
            Ok(Some(p)) => p,
            Ok(None) => return Err(ApiError::NotFound),
            Err(StoreError::QuantityOverflow) => return Err(ApiError::Validation(format!("restocking {quantity} units would overflow stock"))),
            Err(e) => return Err(e.into()),
        };

        info!(%product_id, quantity = %quantity, on_hand = %product.quantity, "restock successful");
        self.events.publish(ProductEvent::Restocked { product_id, quantity, on_hand: product.quantity }).await;
        Ok(product.quantity)
    }

    async fn restore(&self, product_id: Uuid, quantity: Quantity) {
        match self.products.add_stock(product_id, quantity).await {
            Ok(_) => warn!(%product_id, quantity = %quantity, "order append failed, stock restored"),
            Err(e) => error!(%product_id, quantity = %quantity, error = %e, "order append failed and stock could not be restored"),
        }
    }
}
