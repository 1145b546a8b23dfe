//! Product reviews

use axum::{extract::{Path, State}, http::StatusCode, Json};
use serde_json::Value;
use uuid::Uuid;
use crate::api::{message, ValidJson};
use crate::auth::Identity;
use crate::domain::aggregates::{review::check_eligibility, NewReview, Review, ReviewPatch};
use crate::repository::{self, reviews::InsertError};
use crate::{AppState, Result, StoreError};

#[tracing::instrument(skip(state))]
pub async fn list_reviews(State(state): State<AppState>, Path(goods_id): Path<Uuid>) -> Result<Json<Vec<Review>>> {
    Ok(Json(repository::reviews::reviews_for(&state.db, &[goods_id]).await?))
}

/// Writes a review. The body is validated before the purchase gate runs.
#[tracing::instrument(skip(state, review), fields(user_id = %who.user_id))]
pub async fn create_review(State(state): State<AppState>, who: Identity, Path(goods_id): Path<Uuid>, ValidJson(review): ValidJson<NewReview>) -> Result<(StatusCode, Json<Value>)> {
    let (has_ordered, has_reviewed) = repository::reviews::eligibility(&state.db, who.user_id, goods_id).await?;
    check_eligibility(has_ordered, has_reviewed)?;

    let created = repository::reviews::insert_review(&state.db, who.user_id, goods_id, &review).await.map_err(|e| match e {
        InsertError::Denied(reason) => StoreError::Review(reason),
        InsertError::Db(e) => StoreError::from(e),
    })?;
    tracing::info!(review_id = %created.id, %goods_id, "review created");
    Ok((StatusCode::CREATED, message("Review completed")))
}

#[tracing::instrument(skip(state, patch), fields(user_id = %who.user_id))]
pub async fn update_review(State(state): State<AppState>, who: Identity, Path(review_id): Path<Uuid>, ValidJson(patch): ValidJson<ReviewPatch>) -> Result<Json<Value>> {
    repository::reviews::update_review(&state.db, review_id, who.user_id, &patch).await?.ok_or(StoreError::NotFound("Review"))?;
    Ok(message("success"))
}

#[tracing::instrument(skip(state), fields(user_id = %who.user_id))]
pub async fn delete_review(State(state): State<AppState>, who: Identity, Path(review_id): Path<Uuid>) -> Result<Json<Value>> {
    if !repository::reviews::delete_review(&state.db, review_id, who.user_id).await? {
        return Err(StoreError::NotFound("Review"));
    }
    Ok(message("success"))
}

/// Runs the purchase gate without writing anything.
#[tracing::instrument(skip(state), fields(user_id = %who.user_id))]
pub async fn check_review(State(state): State<AppState>, who: Identity, Path(goods_id): Path<Uuid>) -> Result<Json<Value>> {
    let (has_ordered, has_reviewed) = repository::reviews::eligibility(&state.db, who.user_id, goods_id).await?;
    check_eligibility(has_ordered, has_reviewed)?;
    Ok(message("success"))
}
