//! Goods administration: batch edit, delete, single edits

use axum::{extract::{Path, State}, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;
use crate::api::{message, ValidJson};
use crate::auth::{authorize, Capability, Identity};
use crate::domain::aggregates::{GoodsChanges, GoodsImage};
use crate::domain::value_objects::PriceInput;
use crate::{media, repository, AppState, Result, StoreError};

#[derive(Debug, Deserialize, Validate)]
pub struct GoodsBatch {
    #[serde(default)]
    pub goods_set: Vec<Value>,
}

/// One entry of a batch edit. Entries are parsed one by one so a malformed
/// entry only skips itself.
#[derive(Debug, Deserialize)]
pub struct GoodsPatch {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub price: Option<PriceInput>,
    pub is_popular: Option<bool>,
    pub category: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[tracing::instrument(skip(state, identity, batch), fields(entries = batch.goods_set.len()))]
pub async fn batch_update(State(state): State<AppState>, identity: Option<Identity>, ValidJson(batch): ValidJson<GoodsBatch>) -> Result<Json<Value>> {
    authorize(identity.as_ref(), Capability::ManageCatalog)?;
    if batch.goods_set.iter().all(Value::is_null) {
        return Err(StoreError::Validation("A problem has occurred.".into()));
    }

    let (mut updated, mut skipped) = (0usize, 0usize);
    for (index, entry) in batch.goods_set.into_iter().enumerate() {
        if entry.is_null() { continue; }
        let outcome = match serde_json::from_value::<GoodsPatch>(entry) {
            Ok(patch) => apply_patch(&state, patch).await,
            Err(e) => Err(StoreError::Validation(e.to_string())),
        };
        match outcome {
            Ok(()) => updated += 1,
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping goods entry");
                skipped += 1;
            }
        }
    }
    Ok(Json(json!({"message": "The product has been modified.", "updated": updated, "skipped": skipped})))
}

async fn apply_patch(state: &AppState, patch: GoodsPatch) -> Result<()> {
    let goods_id = patch.id.ok_or_else(|| StoreError::Validation("Goods id is required.".into()))?;
    let changes = GoodsChanges::new(patch.name.as_deref(), patch.price.as_ref(), patch.is_popular)?;
    if repository::catalog::find_goods(&state.db, goods_id).await?.is_none() {
        return Err(StoreError::NotFound("Goods"));
    }

    let urls = media::put_all(state.media.as_ref(), &patch.images).await?;
    let written = write_patch(state, goods_id, patch.category.as_deref(), &changes, &urls).await;
    if written.is_err() {
        media::discard(state.media.as_ref(), &urls).await;
    }
    written
}

async fn write_patch(state: &AppState, goods_id: Uuid, category: Option<&str>, changes: &GoodsChanges, urls: &[String]) -> Result<()> {
    let mut tx = state.db.begin().await?;
    let category = match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(name) => Some(repository::catalog::category_id(&mut tx, name).await?),
        None => None,
    };
    if repository::catalog::update_goods(&mut tx, goods_id, category, changes).await?.is_none() {
        return Err(StoreError::NotFound("Goods"));
    }
    if !urls.is_empty() {
        repository::catalog::replace_images(&mut tx, goods_id, urls).await?;
    }
    tx.commit().await?;
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteGoods {
    pub goods_id: Option<Uuid>,
}

#[tracing::instrument(skip(state, identity))]
pub async fn delete_goods(State(state): State<AppState>, identity: Option<Identity>, ValidJson(req): ValidJson<DeleteGoods>) -> Result<Json<Value>> {
    authorize(identity.as_ref(), Capability::ManageCatalog)?;
    if let Some(goods_id) = req.goods_id {
        if !repository::catalog::delete_goods(&state.db, goods_id).await? {
            return Err(StoreError::NotFound("Goods"));
        }
        tracing::info!(%goods_id, "goods deleted");
    }
    Ok(message("success"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct GoodsEdit {
    pub name: Option<String>,
    pub price: Option<PriceInput>,
    pub is_popular: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct GoodsEdited {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub is_popular: bool,
    pub updated_at: DateTime<Utc>,
}

#[tracing::instrument(skip(state, identity))]
pub async fn edit_goods(State(state): State<AppState>, identity: Option<Identity>, Path(goods_id): Path<Uuid>, ValidJson(req): ValidJson<GoodsEdit>) -> Result<Json<GoodsEdited>> {
    authorize(identity.as_ref(), Capability::ManageCatalog)?;
    let changes = GoodsChanges::new(req.name.as_deref(), req.price.as_ref(), req.is_popular)?;
    let mut conn = state.db.acquire().await?;
    let goods = repository::catalog::update_goods(&mut conn, goods_id, None, &changes).await?.ok_or(StoreError::NotFound("Goods"))?;
    Ok(Json(GoodsEdited { id: goods.id, name: goods.name, price: goods.price, is_popular: goods.is_popular, updated_at: goods.updated_at }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ImageEdit {
    pub image: String,
}

/// Swaps the first image of a goods for a new upload.
#[tracing::instrument(skip(state, identity, req))]
pub async fn edit_image(State(state): State<AppState>, identity: Option<Identity>, Path(goods_id): Path<Uuid>, ValidJson(req): ValidJson<ImageEdit>) -> Result<Json<GoodsImage>> {
    authorize(identity.as_ref(), Capability::ManageCatalog)?;
    let url = state.media.put_data_url(&req.image).await?;
    match repository::catalog::replace_first_image(&state.db, goods_id, &url).await {
        Ok(Some(image)) => Ok(Json(image)),
        outcome => {
            media::discard(state.media.as_ref(), &[url]).await;
            Err(outcome.err().map_or(StoreError::NotFound("Image"), StoreError::from))
        }
    }
}
