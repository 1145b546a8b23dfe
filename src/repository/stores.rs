//! Stores

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;
use crate::domain::aggregates::{OrderStatus, Store, StoreChanges, StoreImages};

/// One order line for a product, as listed on its store page.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct ProductOrderLine {
    pub order_id: Uuid,
    #[serde(skip)]
    pub product_id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

pub async fn find_store(db: &PgPool, store_id: Uuid) -> sqlx::Result<Option<Store>> {
    sqlx::query_as::<_, Store>("SELECT * FROM stores WHERE id = $1").bind(store_id).fetch_optional(db).await
}

/// Applies non-empty changes and uploaded image URLs; returns false when the store is missing.
pub async fn update_store(db: &PgPool, store_id: Uuid, changes: &StoreChanges, images: &StoreImages) -> sqlx::Result<bool> {
    let done = sqlx::query(
        "UPDATE stores SET name = COALESCE($2, name), address = COALESCE($3, address), phone = COALESCE($4, phone), \
         company_number = COALESCE($5, company_number), sub_address = COALESCE($6, sub_address), introduce = COALESCE($7, introduce), \
         logo1 = COALESCE($8, logo1), logo2 = COALESCE($9, logo2), background_image = COALESCE($10, background_image) \
         WHERE id = $1",
    )
    .bind(store_id)
    .bind(changes.name.as_deref()).bind(changes.address.as_deref()).bind(changes.phone.as_deref())
    .bind(changes.company_number.as_deref()).bind(changes.sub_address.as_deref()).bind(changes.introduce.as_deref())
    .bind(images.logo1.as_deref()).bind(images.logo2.as_deref()).bind(images.background_image.as_deref())
    .execute(db).await?;
    Ok(done.rows_affected() > 0)
}

/// Order lines for the given products, newest order first.
pub async fn order_lines_for(db: &PgPool, product_ids: &[Uuid]) -> sqlx::Result<Vec<ProductOrderLine>> {
    sqlx::query_as::<_, ProductOrderLine>(
        "SELECT oi.order_id, oi.product_id, o.user_id, oi.quantity, oi.price, o.status, o.created_at \
         FROM order_items oi JOIN orders o ON o.id = oi.order_id \
         WHERE oi.product_id = ANY($1) ORDER BY o.created_at DESC",
    )
    .bind(product_ids)
    .fetch_all(db).await
}
