//! Goods, categories and images

use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;
use crate::domain::aggregates::{Goods, GoodsChanges, GoodsImage, GoodsStats};

const GOODS_STATS: &str = r#"
SELECT g.id, g.store_id, g.name, g.price, g.is_popular, g.created_at,
       COALESCE(c.name, 'etc') AS category,
       s.name AS store_name, s.address AS store_address,
       (SELECT COUNT(*) FROM reviews r WHERE r.goods_id = g.id) AS review_count,
       (SELECT COALESCE(SUM(r.star), 0)::DOUBLE PRECISION FROM reviews r WHERE r.goods_id = g.id) AS star_total,
       (SELECT COUNT(DISTINCT oi.order_id) FROM order_items oi WHERE oi.product_id = g.id) AS order_count,
       (SELECT i.url FROM images i WHERE i.goods_id = g.id ORDER BY i.id LIMIT 1) AS image
FROM goods g
JOIN stores s ON s.id = g.store_id
LEFT JOIN categories c ON c.id = g.category_id
"#;

pub async fn list_goods_stats(db: &PgPool) -> sqlx::Result<Vec<GoodsStats>> {
    sqlx::query_as::<_, GoodsStats>(GOODS_STATS).fetch_all(db).await
}

pub async fn goods_stats(db: &PgPool, goods_id: Uuid) -> sqlx::Result<Option<GoodsStats>> {
    let sql = format!("{GOODS_STATS} WHERE g.id = $1");
    sqlx::query_as::<_, GoodsStats>(&sql).bind(goods_id).fetch_optional(db).await
}

pub async fn goods_stats_for_store(db: &PgPool, store_id: Uuid) -> sqlx::Result<Vec<GoodsStats>> {
    let sql = format!("{GOODS_STATS} WHERE g.store_id = $1 ORDER BY g.created_at");
    sqlx::query_as::<_, GoodsStats>(&sql).bind(store_id).fetch_all(db).await
}

/// Stats keyed by goods id, for rendering cart and order lines.
pub async fn goods_stats_by_id(db: &PgPool, ids: &[Uuid]) -> sqlx::Result<HashMap<Uuid, GoodsStats>> {
    if ids.is_empty() { return Ok(HashMap::new()); }
    let sql = format!("{GOODS_STATS} WHERE g.id = ANY($1)");
    let rows = sqlx::query_as::<_, GoodsStats>(&sql).bind(ids).fetch_all(db).await?;
    Ok(rows.into_iter().map(|g| (g.id, g)).collect())
}

/// Case-insensitive substring match on the goods name or its store's name.
pub async fn search_goods(db: &PgPool, term: &str) -> sqlx::Result<Vec<GoodsStats>> {
    let sql = format!("{GOODS_STATS} WHERE g.name ILIKE $1 ESCAPE '\\' OR s.name ILIKE $1 ESCAPE '\\'");
    sqlx::query_as::<_, GoodsStats>(&sql).bind(like_pattern(term)).fetch_all(db).await
}

fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') { escaped.push('\\'); }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

pub async fn find_goods(db: &PgPool, goods_id: Uuid) -> sqlx::Result<Option<Goods>> {
    sqlx::query_as::<_, Goods>("SELECT * FROM goods WHERE id = $1").bind(goods_id).fetch_optional(db).await
}

pub async fn images_for(db: &PgPool, goods_ids: &[Uuid]) -> sqlx::Result<Vec<GoodsImage>> {
    sqlx::query_as::<_, GoodsImage>("SELECT id, goods_id, url FROM images WHERE goods_id = ANY($1) ORDER BY id")
        .bind(goods_ids).fetch_all(db).await
}

/// Resolves a category by name, creating it on first use.
pub async fn category_id(conn: &mut PgConnection, name: &str) -> sqlx::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO categories (id, name) VALUES ($1, $2) ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
    )
    .bind(Uuid::now_v7()).bind(name.trim())
    .fetch_one(conn).await?;
    Ok(id)
}

pub async fn insert_goods(conn: &mut PgConnection, store_id: Uuid, category_id: Option<Uuid>, name: &str, price: i64, is_popular: bool) -> sqlx::Result<Uuid> {
    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO goods (id, store_id, category_id, name, price, is_popular, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())")
        .bind(id).bind(store_id).bind(category_id).bind(name).bind(price).bind(is_popular)
        .execute(conn).await?;
    Ok(id)
}

/// Applies the present fields; returns the updated row, or `None` when the goods does not exist.
pub async fn update_goods(conn: &mut PgConnection, goods_id: Uuid, category_id: Option<Uuid>, changes: &GoodsChanges) -> sqlx::Result<Option<Goods>> {
    sqlx::query_as::<_, Goods>(
        "UPDATE goods SET name = COALESCE($2, name), price = COALESCE($3, price), is_popular = COALESCE($4, is_popular), \
         category_id = COALESCE($5, category_id), updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(goods_id).bind(changes.name.as_deref()).bind(changes.price).bind(changes.is_popular).bind(category_id)
    .fetch_optional(conn).await
}

pub async fn add_images(conn: &mut PgConnection, goods_id: Uuid, urls: &[String]) -> sqlx::Result<()> {
    for url in urls {
        sqlx::query("INSERT INTO images (id, goods_id, url) VALUES ($1, $2, $3)")
            .bind(Uuid::now_v7()).bind(goods_id).bind(url)
            .execute(&mut *conn).await?;
    }
    Ok(())
}

/// Drops every image of the goods and inserts `urls` in their place.
pub async fn replace_images(conn: &mut PgConnection, goods_id: Uuid, urls: &[String]) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM images WHERE goods_id = $1").bind(goods_id).execute(&mut *conn).await?;
    add_images(conn, goods_id, urls).await
}

/// Replaces the first image of the goods in place.
pub async fn replace_first_image(db: &PgPool, goods_id: Uuid, url: &str) -> sqlx::Result<Option<GoodsImage>> {
    sqlx::query_as::<_, GoodsImage>(
        "UPDATE images SET url = $2 WHERE id = (SELECT id FROM images WHERE goods_id = $1 ORDER BY id LIMIT 1) RETURNING id, goods_id, url",
    )
    .bind(goods_id).bind(url)
    .fetch_optional(db).await
}

pub async fn delete_goods(db: &PgPool, goods_id: Uuid) -> sqlx::Result<bool> {
    let done = sqlx::query("DELETE FROM goods WHERE id = $1").bind(goods_id).execute(db).await?;
    Ok(done.rows_affected() > 0)
}
