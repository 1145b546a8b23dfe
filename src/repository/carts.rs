//! Carts and cart items

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use crate::domain::aggregates::{Cart, CartChange, CartItem, LineItemInput};

pub async fn list_carts(db: &PgPool) -> sqlx::Result<Vec<Cart>> {
    sqlx::query_as::<_, Cart>("SELECT * FROM carts ORDER BY created_at").fetch_all(db).await
}

pub async fn carts_for_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<Cart>> {
    sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE user_id = $1 ORDER BY created_at").bind(user_id).fetch_all(db).await
}

pub async fn find_cart(db: &PgPool, cart_id: Uuid) -> sqlx::Result<Option<Cart>> {
    sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE id = $1").bind(cart_id).fetch_optional(db).await
}

pub async fn items_for(db: &PgPool, cart_ids: &[Uuid]) -> sqlx::Result<Vec<CartItem>> {
    sqlx::query_as::<_, CartItem>("SELECT * FROM cart_items WHERE cart_id = ANY($1) ORDER BY id").bind(cart_ids).fetch_all(db).await
}

async fn insert_cart(conn: &mut PgConnection, user_id: Uuid) -> sqlx::Result<Cart> {
    sqlx::query_as::<_, Cart>("INSERT INTO carts (id, user_id, created_at) VALUES ($1, $2, NOW()) RETURNING *")
        .bind(Uuid::now_v7()).bind(user_id)
        .fetch_one(conn).await
}

async fn insert_item(conn: &mut PgConnection, cart_id: Uuid, product: Uuid, quantity: i32, price: rust_decimal::Decimal) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO cart_items (id, cart_id, product_id, quantity, price) VALUES ($1, $2, $3, $4, $5)")
        .bind(Uuid::now_v7()).bind(cart_id).bind(product).bind(quantity).bind(price)
        .execute(conn).await?;
    Ok(())
}

/// Creates the cart and all of its items, or nothing.
pub async fn create_cart(db: &PgPool, user_id: Uuid, items: &[LineItemInput]) -> sqlx::Result<Cart> {
    let mut tx = db.begin().await?;
    let cart = insert_cart(&mut tx, user_id).await?;
    for item in items {
        insert_item(&mut tx, cart.id, item.product, item.quantity, item.price).await?;
    }
    tx.commit().await?;
    Ok(cart)
}

pub async fn reassign_cart(db: &PgPool, cart_id: Uuid, user_id: Uuid) -> sqlx::Result<Option<Cart>> {
    sqlx::query_as::<_, Cart>("UPDATE carts SET user_id = $2 WHERE id = $1 RETURNING *")
        .bind(cart_id).bind(user_id)
        .fetch_optional(db).await
}

#[derive(Debug, PartialEq, Eq)]
pub enum UpdateOutcome { Applied, UnknownItem(Uuid) }

/// Applies a planned update in one transaction. A replacement naming an item
/// outside this cart aborts the whole update.
pub async fn apply_changes(db: &PgPool, cart_id: Uuid, changes: &[CartChange]) -> sqlx::Result<UpdateOutcome> {
    let mut tx = db.begin().await?;
    for change in changes {
        match change {
            CartChange::Replace { item_id, product, quantity, price } => {
                let done = sqlx::query("UPDATE cart_items SET product_id = $3, quantity = $4, price = $5 WHERE id = $1 AND cart_id = $2")
                    .bind(*item_id).bind(cart_id).bind(*product).bind(*quantity).bind(*price)
                    .execute(&mut *tx).await?;
                if done.rows_affected() == 0 {
                    tx.rollback().await?;
                    return Ok(UpdateOutcome::UnknownItem(*item_id));
                }
            }
            CartChange::Append { product, quantity, price } => insert_item(&mut tx, cart_id, *product, *quantity, *price).await?,
        }
    }
    tx.commit().await?;
    Ok(UpdateOutcome::Applied)
}

/// Deletes the cart's items and then the cart; false when the cart is missing.
pub async fn delete_cart(db: &PgPool, cart_id: Uuid) -> sqlx::Result<bool> {
    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1").bind(cart_id).execute(&mut *tx).await?;
    let done = sqlx::query("DELETE FROM carts WHERE id = $1").bind(cart_id).execute(&mut *tx).await?;
    tx.commit().await?;
    Ok(done.rows_affected() > 0)
}

pub async fn delete_item(db: &PgPool, item_id: Uuid) -> sqlx::Result<bool> {
    let done = sqlx::query("DELETE FROM cart_items WHERE id = $1").bind(item_id).execute(db).await?;
    Ok(done.rows_affected() > 0)
}
