//! Reviews and the purchase lookups that gate them

use sqlx::PgPool;
use uuid::Uuid;
use crate::domain::aggregates::{NewReview, Review, ReviewDenied, ReviewPatch};

const ORDERED: &str = "EXISTS (SELECT 1 FROM orders o JOIN order_items oi ON oi.order_id = o.id WHERE o.user_id = $1 AND oi.product_id = $2)";
const REVIEWED: &str = "EXISTS (SELECT 1 FROM reviews WHERE user_id = $1 AND goods_id = $2)";

/// Whether the user has ordered the goods, and whether they reviewed it already.
pub async fn eligibility(db: &PgPool, user_id: Uuid, goods_id: Uuid) -> sqlx::Result<(bool, bool)> {
    let sql = format!("SELECT {ORDERED}, {REVIEWED}");
    sqlx::query_as(&sql).bind(user_id).bind(goods_id).fetch_one(db).await
}

/// Number of the user's orders containing the goods and number of their reviews on it.
pub async fn purchase_counts(db: &PgPool, user_id: Uuid, goods_id: Uuid) -> sqlx::Result<(i64, i64)> {
    sqlx::query_as(
        "SELECT (SELECT COUNT(DISTINCT o.id) FROM orders o JOIN order_items oi ON oi.order_id = o.id WHERE o.user_id = $1 AND oi.product_id = $2), \
                (SELECT COUNT(*) FROM reviews WHERE user_id = $1 AND goods_id = $2)",
    )
    .bind(user_id).bind(goods_id)
    .fetch_one(db).await
}

/// Reviews for the given goods, newest first.
pub async fn reviews_for(db: &PgPool, goods_ids: &[Uuid]) -> sqlx::Result<Vec<Review>> {
    sqlx::query_as::<_, Review>(
        "SELECT id, user_id, goods_id, review, star, created_at FROM reviews WHERE goods_id = ANY($1) ORDER BY created_at DESC, id DESC",
    )
    .bind(goods_ids)
    .fetch_all(db).await
}

#[derive(Debug)]
pub enum InsertError { Denied(ReviewDenied), Db(sqlx::Error) }

/// Inserts the review. A concurrent duplicate that slipped past the
/// eligibility check surfaces as `AlreadyReviewed` via the unique index.
pub async fn insert_review(db: &PgPool, user_id: Uuid, goods_id: Uuid, review: &NewReview) -> Result<Review, InsertError> {
    sqlx::query_as::<_, Review>(
        "INSERT INTO reviews (id, user_id, goods_id, review, star, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) \
         RETURNING id, user_id, goods_id, review, star, created_at",
    )
    .bind(Uuid::now_v7()).bind(user_id).bind(goods_id).bind(&review.review).bind(review.star)
    .fetch_one(db).await
    .map_err(|e| match e.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => InsertError::Denied(ReviewDenied::AlreadyReviewed),
        _ => InsertError::Db(e),
    })
}

/// Updates a review owned by `user_id`; `None` when no such review exists.
pub async fn update_review(db: &PgPool, review_id: Uuid, user_id: Uuid, patch: &ReviewPatch) -> sqlx::Result<Option<Review>> {
    sqlx::query_as::<_, Review>(
        "UPDATE reviews SET review = COALESCE($3, review), star = COALESCE($4, star), updated_at = NOW() \
         WHERE id = $1 AND user_id = $2 RETURNING id, user_id, goods_id, review, star, created_at",
    )
    .bind(review_id).bind(user_id).bind(patch.review.as_deref()).bind(patch.star)
    .fetch_optional(db).await
}

pub async fn delete_review(db: &PgPool, review_id: Uuid, user_id: Uuid) -> sqlx::Result<bool> {
    let done = sqlx::query("DELETE FROM reviews WHERE id = $1 AND user_id = $2").bind(review_id).bind(user_id).execute(db).await?;
    Ok(done.rows_affected() > 0)
}
