//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::aggregates::Product;
use crate::domain::value_objects::{Price, Quantity};

/// A completed purchase. Item names and prices are snapshots taken at
/// purchase time; orders are never mutated after they are recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem { pub product_id: Uuid, pub name: String, pub quantity: Quantity, pub price: Price }

impl OrderItem {
    pub fn snapshot(product: &Product, quantity: Quantity) -> Self {
        Self { product_id: product.id, name: product.name.clone(), quantity, price: product.price }
    }
    pub fn line_total(&self) -> Decimal { self.price.multiply(self.quantity) }
}

impl Order {
    /// Single-line order for one purchase call.
    pub fn for_purchase(user_id: Uuid, product: &Product, quantity: Quantity) -> Self {
        let item = OrderItem::snapshot(product, quantity);
        Self { id: Uuid::now_v7(), user_id, total_amount: item.line_total(), items: vec![item], created_at: Utc::now() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::NewProduct;

    fn lollipop() -> Product {
        Product::create(NewProduct { name: "Lollipop".into(), category: "Hard".into(), price: Price::new(Decimal::new(125, 2)).unwrap(), quantity: Quantity::new(10), image: None })
    }

    #[test]
    fn test_purchase_order_snapshots_price() {
        let mut product = lollipop();
        let order = Order::for_purchase(Uuid::new_v4(), &product, Quantity::new(4));
        product.price = Price::new(Decimal::new(999, 2)).unwrap();
        product.name = "Renamed".into();
        assert_eq!(order.total_amount, Decimal::new(500, 2));
        assert_eq!(order.items[0].name, "Lollipop");
        assert_eq!(order.items[0].price.amount(), Decimal::new(125, 2));
    }
    #[test]
    fn test_line_total_multiplies_snapshot_price() {
        let item = OrderItem::snapshot(&lollipop(), Quantity::new(3));
        assert_eq!(item.line_total(), Decimal::new(375, 2));
    }
}
