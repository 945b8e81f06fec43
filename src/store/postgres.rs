//! Postgres backend (schema in `migrations/`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use super::{OrderStore, ProductStore, StockTake, UserStore};
use crate::domain::aggregates::{Order, OrderItem, Product, ProductFilter, ProductPatch, Role, User};
use crate::domain::value_objects::{Price, Quantity, Username};
use crate::error::{StoreError, StoreResult};

const PRODUCT_COLUMNS: &str = "id, name, category, price, quantity, image";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow { id: Uuid, name: String, category: String, price: Decimal, quantity: i64, image: String }

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;
    fn try_from(r: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: r.id, name: r.name, category: r.category,
            price: Price::new(r.price).map_err(|e| StoreError::Corrupt(format!("product {}: {e}", r.id)))?,
            quantity: Quantity::try_from(r.quantity).map_err(|e| StoreError::Corrupt(format!("product {}: {e}", r.id)))?,
            image: r.image,
        })
    }
}

fn products(rows: Vec<ProductRow>) -> StoreResult<Vec<Product>> {
    rows.into_iter().map(Product::try_from).collect()
}

#[derive(sqlx::FromRow)]
struct UserRow { id: Uuid, username: String, password_hash: String, role: String }

impl TryFrom<UserRow> for User {
    type Error = StoreError;
    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: r.id,
            username: Username::new(r.username).map_err(|e| StoreError::Corrupt(format!("user {}: {e}", r.id)))?,
            password_hash: r.password_hash,
            role: r.role.parse().map_err(|e| StoreError::Corrupt(format!("user {}: {e}", r.id)))?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow { id: Uuid, user_id: Uuid, total_amount: Decimal, created_at: DateTime<Utc> }

#[derive(sqlx::FromRow)]
struct OrderItemRow { order_id: Uuid, product_id: Uuid, name: String, quantity: i64, price: Decimal }

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = StoreError;
    fn try_from(r: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(OrderItem {
            product_id: r.product_id, name: r.name,
            quantity: Quantity::try_from(r.quantity).map_err(|e| StoreError::Corrupt(format!("order {}: {e}", r.order_id)))?,
            price: Price::new(r.price).map_err(|e| StoreError::Corrupt(format!("order {}: {e}", r.order_id)))?,
        })
    }
}

fn to_count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or_default()
}

#[async_trait]
impl ProductStore for PgStore {
    async fn list(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"))
            .fetch_all(&self.pool).await?;
        products(rows)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Product>> {
        sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id).fetch_optional(&self.pool).await?
            .map(Product::try_from).transpose()
    }

    async fn search(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));
        if let Some(q) = &filter.name_contains {
            qb.push(" AND strpos(lower(name), lower(").push_bind(q.clone()).push(")) > 0");
        }
        if let Some(category) = &filter.category {
            qb.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(min) = filter.min_price {
            qb.push(" AND price >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price {
            qb.push(" AND price <= ").push_bind(max);
        }
        qb.push(" ORDER BY id");
        let rows = qb.build_query_as::<ProductRow>().fetch_all(&self.pool).await?;
        products(rows)
    }

    async fn insert(&self, p: &Product) -> StoreResult<()> {
        sqlx::query("INSERT INTO products (id, name, category, price, quantity, image) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(p.id).bind(&p.name).bind(&p.category).bind(p.price.amount()).bind(i64::from(p.quantity)).bind(&p.image)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &ProductPatch) -> StoreResult<Option<Product>> {
        sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET name = COALESCE($2, name), category = COALESCE($3, category), price = COALESCE($4, price), \
             quantity = COALESCE($5, quantity), image = COALESCE($6, image) WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id).bind(&patch.name).bind(&patch.category).bind(patch.price.map(|p| p.amount()))
        .bind(patch.quantity.map(i64::from)).bind(&patch.image)
        .fetch_optional(&self.pool).await?
        .map(Product::try_from).transpose()
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn take_stock(&self, id: Uuid, quantity: Quantity) -> StoreResult<StockTake> {
        let taken = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET quantity = quantity - $2 WHERE id = $1 AND quantity >= $2 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id).bind(i64::from(quantity))
        .fetch_optional(&self.pool).await?;

        if let Some(row) = taken {
            return Ok(StockTake::Taken(row.try_into()?));
        }
        // Nothing updated: either the product is gone or stock was short.
        Ok(match self.get(id).await? {
            Some(p) => StockTake::Insufficient { available: p.quantity },
            None => StockTake::Missing,
        })
    }

    async fn add_stock(&self, id: Uuid, quantity: Quantity) -> StoreResult<Option<Product>> {
        let added = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET quantity = quantity + $2 WHERE id = $1 AND quantity + $2 <= $3 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id).bind(i64::from(quantity)).bind(i64::from(u32::MAX))
        .fetch_optional(&self.pool).await?;

        match added {
            Some(row) => Ok(Some(row.try_into()?)),
            None if self.get(id).await?.is_some() => Err(StoreError::QuantityOverflow),
            None => Ok(None),
        }
    }

    async fn count(&self) -> StoreResult<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products").fetch_one(&self.pool).await?;
        Ok(to_count(n))
    }

    async fn low_stock(&self, threshold: Quantity, limit: usize) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE quantity <= $1 ORDER BY id LIMIT $2"
        ))
        .bind(i64::from(threshold)).bind(limit as i64)
        .fetch_all(&self.pool).await?;
        products(rows)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        let result = sqlx::query("INSERT INTO users (id, username, password_hash, role) VALUES ($1, $2, $3, $4)")
            .bind(user.id).bind(user.username.as_str()).bind(&user.password_hash).bind(user.role.as_str())
            .execute(&self.pool).await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::Duplicate("username")),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>("SELECT id, username, password_hash, role FROM users WHERE username = $1")
            .bind(username).fetch_optional(&self.pool).await?
            .map(User::try_from).transpose()
    }

    async fn usernames(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, String>> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as("SELECT id, username FROM users WHERE id = ANY($1)")
            .bind(ids).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().collect())
    }

    async fn count_by_role(&self, role: Role) -> StoreResult<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role.as_str()).fetch_one(&self.pool).await?;
        Ok(to_count(n))
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn append(&self, order: &Order) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO orders (id, user_id, total_amount, created_at) VALUES ($1, $2, $3, $4)")
            .bind(order.id).bind(order.user_id).bind(order.total_amount).bind(order.created_at)
            .execute(&mut *tx).await?;
        for (position, item) in order.items.iter().enumerate() {
            sqlx::query("INSERT INTO order_items (order_id, position, product_id, name, quantity, price) VALUES ($1, $2, $3, $4, $5, $6)")
                .bind(order.id).bind(position as i32).bind(item.product_id).bind(&item.name)
                .bind(i64::from(item.quantity)).bind(item.price.amount())
                .execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn count(&self) -> StoreResult<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(&self.pool).await?;
        Ok(to_count(n))
    }

    async fn total_revenue(&self) -> StoreResult<Decimal> {
        let total: Decimal = sqlx::query_scalar("SELECT COALESCE(SUM(total_amount), 0) FROM orders")
            .fetch_one(&self.pool).await?;
        Ok(total)
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, total_amount, created_at FROM orders ORDER BY created_at DESC, id DESC LIMIT $1"
        )
        .bind(limit as i64).fetch_all(&self.pool).await?;

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT order_id, product_id, name, quantity, price FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, position"
        )
        .bind(&ids).fetch_all(&self.pool).await?;

        let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            let order_id = row.order_id;
            items.entry(order_id).or_default().push(row.try_into()?);
        }

        Ok(orders
            .into_iter()
            .map(|o| Order {
                items: items.remove(&o.id).unwrap_or_default(),
                id: o.id, user_id: o.user_id, total_amount: o.total_amount, created_at: o.created_at,
            })
            .collect())
    }

    async fn count_since(&self, since: DateTime<Utc>) -> StoreResult<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE created_at >= $1")
            .bind(since).fetch_one(&self.pool).await?;
        Ok(to_count(n))
    }
}
