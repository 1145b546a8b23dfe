//! Orders and order items

use sqlx::PgPool;
use uuid::Uuid;
use crate::domain::aggregates::{NewOrder, Order, OrderItem, OrderStatus};

pub async fn find_order(db: &PgPool, order_id: Uuid) -> sqlx::Result<Option<Order>> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(db).await
}

/// Orders in one status, oldest first. Backs every per-status queue.
pub async fn orders_with_status(db: &PgPool, status: OrderStatus) -> sqlx::Result<Vec<Order>> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE status = $1 ORDER BY created_at, id")
        .bind(status.as_str())
        .fetch_all(db).await
}

pub async fn orders_for_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<Order>> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC").bind(user_id).fetch_all(db).await
}

pub async fn items_for(db: &PgPool, order_ids: &[Uuid]) -> sqlx::Result<Vec<OrderItem>> {
    sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY id").bind(order_ids).fetch_all(db).await
}

/// Persists the order row and then each item row referencing it, in one transaction.
pub async fn create_order(db: &PgPool, order: &NewOrder) -> sqlx::Result<Order> {
    let mut tx = db.begin().await?;
    let created = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (id, user_id, tel, total_prices, account_name, province, district, shipping_company, branch, created_at, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), $10) RETURNING *",
    )
    .bind(Uuid::now_v7()).bind(order.user).bind(&order.tel).bind(order.total_prices)
    .bind(order.account_name.as_deref()).bind(order.province.as_deref()).bind(order.district.as_deref())
    .bind(order.shipping_company.as_deref()).bind(order.branch.as_deref()).bind(order.status.as_str())
    .fetch_one(&mut *tx).await?;
    for item in &order.items {
        sqlx::query("INSERT INTO order_items (id, order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4, $5)")
            .bind(Uuid::now_v7()).bind(created.id).bind(item.product).bind(item.quantity).bind(item.price)
            .execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(created)
}

/// Sets the status, whatever it was before.
pub async fn set_status(db: &PgPool, order_id: Uuid, status: OrderStatus) -> sqlx::Result<Option<Order>> {
    sqlx::query_as::<_, Order>("UPDATE orders SET status = $2 WHERE id = $1 RETURNING *")
        .bind(order_id).bind(status.as_str())
        .fetch_optional(db).await
}

/// Deletes the order's items and then the order; false when the order is missing.
pub async fn delete_order(db: &PgPool, order_id: Uuid) -> sqlx::Result<bool> {
    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM order_items WHERE order_id = $1").bind(order_id).execute(&mut *tx).await?;
    let done = sqlx::query("DELETE FROM orders WHERE id = $1").bind(order_id).execute(&mut *tx).await?;
    tx.commit().await?;
    Ok(done.rows_affected() > 0)
}
