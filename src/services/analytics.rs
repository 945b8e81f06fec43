//! Admin dashboard summary, computed on demand.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{Order, Product, Role};
use crate::domain::value_objects::Quantity;
use crate::error::Result;
use crate::store::{OrderStore, ProductStore, UserStore};

pub const LOW_STOCK_THRESHOLD: Quantity = Quantity::new(5);
pub const LOW_STOCK_LIMIT: usize = 5;
pub const RECENT_ORDERS_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_revenue: Decimal,
    pub total_orders: u64,
    pub total_products: u64,
    pub total_customers: u64,
    pub avg_order_value: Decimal,
    pub today_orders: u64,
    pub low_stock_items: Vec<Product>,
    pub recent_orders: Vec<RecentOrder>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentOrder {
    #[serde(flatten)]
    pub order: Order,
    pub user: Buyer,
}

/// `username` is `None` when the account no longer exists.
#[derive(Debug, Clone, Serialize)]
pub struct Buyer {
    pub id: Uuid,
    pub username: Option<String>,
}

#[derive(Clone)]
pub struct Analytics {
    products: Arc<dyn ProductStore>,
    users: Arc<dyn UserStore>,
    orders: Arc<dyn OrderStore>,
}

/// Rounded to cents, ties away from zero.
pub fn average_order_value(revenue: Decimal, orders: u64) -> Decimal {
    if orders == 0 {
        return Decimal::ZERO;
    }
    (revenue / Decimal::from(orders)).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Midnight of the local calendar day containing `now`, in UTC.
pub fn start_of_local_day(now: DateTime<Local>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .unwrap_or(now)
        .with_timezone(&Utc)
}

impl Analytics {
    pub fn new(products: Arc<dyn ProductStore>, users: Arc<dyn UserStore>, orders: Arc<dyn OrderStore>) -> Self {
        Self { products, users, orders }
    }

    pub async fn summary(&self) -> Result<Summary> {
        let total_products = self.products.count().await?;
        let total_customers = self.users.count_by_role(Role::User).await?;
        let total_orders = self.orders.count().await?;
        let total_revenue = self.orders.total_revenue().await?;
        let low_stock_items = self.products.low_stock(LOW_STOCK_THRESHOLD, LOW_STOCK_LIMIT).await?;
        let today_orders = self.orders.count_since(start_of_local_day(Local::now())).await?;

        let recent = self.orders.recent(RECENT_ORDERS_LIMIT).await?;
        let buyer_ids: Vec<Uuid> = recent.iter().map(|o| o.user_id).collect();
        let usernames = self.users.usernames(&buyer_ids).await?;
        let recent_orders = recent
            .into_iter()
            .map(|order| RecentOrder {
                user: Buyer { id: order.user_id, username: usernames.get(&order.user_id).cloned() },
                order,
            })
            .collect();

        Ok(Summary {
            total_revenue,
            total_orders,
            total_products,
            total_customers,
            avg_order_value: average_order_value(total_revenue, total_orders),
            today_orders,
            low_stock_items,
            recent_orders,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{NewProduct, User};
    use crate::domain::value_objects::{Price, Username};
    use crate::services::{EventBus, Inventory};
    use crate::store::MemoryStore;

    #[test]
    fn average_is_zero_without_orders() {
        assert_eq!(average_order_value(Decimal::new(100, 0), 0), Decimal::ZERO);
        assert_eq!(average_order_value(Decimal::new(10, 0), 3), Decimal::new(333, 2));
        assert_eq!(average_order_value(Decimal::new(20, 0), 3), Decimal::new(667, 2));
        assert_eq!(average_order_value(Decimal::new(105, 2), 2), Decimal::new(53, 2));
        assert_eq!(average_order_value(Decimal::new(25, 2), 2), Decimal::new(13, 2));
    }

    #[test]
    fn start_of_day_is_not_after_now() {
        let now = Local::now();
        let start = start_of_local_day(now);
        assert!(start <= now.with_timezone(&Utc));
        assert!(now.with_timezone(&Utc) - start < chrono::Duration::hours(25));
    }

    #[tokio::test]
    async fn summary_counts_and_enriches_orders() {
        let store = Arc::new(MemoryStore::default());
        let analytics = Analytics::new(store.clone(), store.clone(), store.clone());
        let inventory = Inventory::new(store.clone(), store.clone(), EventBus::disabled());

        let empty = analytics.summary().await.unwrap();
        assert_eq!(empty.total_orders, 0);
        assert_eq!(empty.avg_order_value, Decimal::ZERO);

        let buyer = User::register(Username::new("buyer").unwrap(), "h".into(), Role::User);
        let admin = User::register(Username::new("boss").unwrap(), "h".into(), Role::Admin);
        UserStore::insert(store.as_ref(), &buyer).await.unwrap();
        UserStore::insert(store.as_ref(), &admin).await.unwrap();

        let mut ids = Vec::new();
        for (i, qty) in [3u32, 50, 8, 1, 0, 2, 4].into_iter().enumerate() {
            let p = crate::domain::aggregates::Product::create(NewProduct {
                name: format!("Sweet {i}"), category: "Mixed".into(),
                price: Price::new(Decimal::new(150, 2)).unwrap(), quantity: Quantity::new(qty), image: None,
            });
            ProductStore::insert(store.as_ref(), &p).await.unwrap();
            ids.push(p.id);
        }
        for _ in 0..6 {
            inventory.purchase(ids[1], Some(buyer.id), Some(Quantity::new(2))).await.unwrap();
        }
        inventory.purchase(ids[1], Some(Uuid::new_v4()), None).await.unwrap();

        let s = analytics.summary().await.unwrap();
        assert_eq!(s.total_products, 7);
        assert_eq!(s.total_customers, 1);
        assert_eq!(s.total_orders, 7);
        assert_eq!(s.today_orders, 7);
        assert_eq!(s.total_revenue, Decimal::new(1950, 2));
        assert_eq!(s.avg_order_value, Decimal::new(279, 2));
        assert_eq!(s.low_stock_items.len(), LOW_STOCK_LIMIT);
        assert!(s.low_stock_items.iter().all(|p| p.quantity <= LOW_STOCK_THRESHOLD));
        assert_eq!(s.recent_orders.len(), RECENT_ORDERS_LIMIT);
        assert!(s.recent_orders[0].user.username.is_none());
        assert_eq!(s.recent_orders[1].user.username.as_deref(), Some("buyer"));
        assert!(s.recent_orders.windows(2).all(|w| w[0].order.created_at >= w[1].order.created_at));
    }
}
