//! Domain events
use crate::domain::value_objects::Quantity;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
    User(UserEvent),
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductEvent {
    Created { product_id: Uuid, name: String },
    Updated { product_id: Uuid },
    Deleted { product_id: Uuid },
    Purchased { product_id: Uuid, quantity: Quantity, remaining: Quantity },
    Restocked { product_id: Uuid, quantity: Quantity, on_hand: Quantity },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Recorded { order_id: Uuid, user_id: Uuid, total: Decimal },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserEvent {
    Registered { user_id: Uuid },
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Product(ProductEvent::Created { .. }) => "sweetshop.product.created",
            Self::Product(ProductEvent::Updated { .. }) => "sweetshop.product.updated",
            Self::Product(ProductEvent::Deleted { .. }) => "sweetshop.product.deleted",
            Self::Product(ProductEvent::Purchased { .. }) => "sweetshop.stock.purchased",
            Self::Product(ProductEvent::Restocked { .. }) => "sweetshop.stock.restocked",
            Self::Order(OrderEvent::Recorded { .. }) => "sweetshop.order.recorded",
            Self::User(UserEvent::Registered { .. }) => "sweetshop.user.registered",
        }
    }
}

impl From<ProductEvent> for DomainEvent { fn from(e: ProductEvent) -> Self { Self::Product(e) } }
impl From<OrderEvent> for DomainEvent { fn from(e: OrderEvent) -> Self { Self::Order(e) } }
impl From<UserEvent> for DomainEvent { fn from(e: UserEvent) -> Self { Self::User(e) } }
