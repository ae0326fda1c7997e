//! Postgres-backed order store.
//!
//! Idempotent create relies on the primary key (`ON CONFLICT DO NOTHING`);
//! updates take a row lock with `SELECT ... FOR UPDATE` inside a transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use crate::domain::aggregates::{CustomerInfo, LineItem, Order, OrderPatch};
use crate::domain::lifecycle::{OrderStatus, PaymentStatus};
use crate::store::{OrderFilter, OrderStore, Revision, StoreError};

const SELECT_COLUMNS: &str = "id, customer, line_items, status, payment_status, notes, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    customer: Json<CustomerInfo>,
    line_items: Json<Vec<LineItem>>,
    status: String,
    payment_status: String,
    notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;
    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::Corrupt { id: row.id.clone(), reason };
        let status = row.status.parse::<OrderStatus>().map_err(|e| corrupt(e.to_string()))?;
        let payment_status = row.payment_status.parse::<PaymentStatus>().map_err(|e| corrupt(e.to_string()))?;
        if row.line_items.0.is_empty() { return Err(corrupt("no line items".to_string())); }
        Ok(Order::restore(row.id, row.customer.0, row.line_items.0, status, payment_status, row.notes, row.created_at, row.updated_at))
    }
}

#[derive(Clone)]
pub struct PgOrderStore {
    db: PgPool,
}

impl PgOrderStore {
    pub fn new(db: PgPool) -> Self { Self { db } }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.db).await
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create(&self, order: Order) -> Result<Order, StoreError> {
        let result = sqlx::query(
            "INSERT INTO orders (id, customer, line_items, total_usd, status, payment_status, notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) ON CONFLICT (id) DO NOTHING",
        )
        .bind(order.id())
        .bind(Json(order.customer()))
        .bind(Json(order.line_items()))
        .bind(order.total_usd())
        .bind(order.status().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.notes())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&self.db)
        .await?;
        if result.rows_affected() == 0 {
            tracing::warn!(order_id = order.id(), "rejected duplicate create");
            return Err(StoreError::DuplicateOrderId(order.id().to_string()));
        }
        tracing::info!(order_id = order.id(), total_usd = %order.total_usd(), "order created");
        Ok(order)
    }

    async fn revise(&self, id: &str, patch: OrderPatch) -> Result<Revision, StoreError> {
        let mut tx = self.db.begin().await?;
        let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {SELECT_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(id.to_string()))?;
        let before = Order::try_from(row)?;
        let mut order = before.clone();
        order.apply(patch)?;
        sqlx::query(
            "UPDATE orders SET customer = $2, line_items = $3, total_usd = $4, status = $5, payment_status = $6, \
             notes = $7, updated_at = $8 WHERE id = $1",
        )
        .bind(order.id())
        .bind(Json(order.customer()))
        .bind(Json(order.line_items()))
        .bind(order.total_usd())
        .bind(order.status().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.notes())
        .bind(order.updated_at())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        tracing::info!(order_id = id, from = %before.status(), to = %order.status(), "order updated");
        Ok(Revision { before, after: order })
    }

    async fn get(&self, id: &str) -> Result<Order, StoreError> {
        sqlx::query_as::<_, OrderRow>(&format!("SELECT {SELECT_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(id.to_string()))
            .and_then(Order::try_from)
    }

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM orders \
             WHERE ($1::text IS NULL OR status = $1) \
               AND ($2::timestamptz IS NULL OR created_at >= $2) \
               AND ($3::timestamptz IS NULL OR created_at < $3) \
             ORDER BY created_at ASC, seq ASC"
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.created_from)
        .bind(filter.created_to)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(Order::try_from).collect()
    }
}
