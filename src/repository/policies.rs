//! Terms of use and privacy policy texts

use sqlx::PgPool;

/// Content of the most recent policy in `category` (1 terms of use, 2 privacy).
pub async fn latest_content(db: &PgPool, category: i32) -> sqlx::Result<Option<String>> {
    let row: Option<(Option<String>,)> = sqlx::query_as(
        "SELECT content FROM policies WHERE category = $1 ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .bind(category)
    .fetch_optional(db).await?;
    Ok(row.and_then(|(content,)| content))
}
