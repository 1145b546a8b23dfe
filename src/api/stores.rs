//! Store page, product registration and store modification

use axum::{extract::{Path, State}, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;
use crate::api::{message, ValidJson};
use crate::auth::{authorize, authorize_owner, Capability, Identity};
use crate::domain::aggregates::{GoodsChanges, Review, Store, StorePatch};
use crate::domain::value_objects::{format_price, PriceInput, DEFAULT_CATEGORY};
use crate::repository::{self, stores::ProductOrderLine};
use crate::{media, AppState, Result, StoreError};

#[derive(Debug, Serialize)]
pub struct StoreGoods {
    pub goods_id: Uuid,
    pub name: String,
    pub price: i64,
    pub format_price: String,
    pub category: String,
    pub is_popular: bool,
    pub star_avg: i64,
    pub image_set: Vec<String>,
    pub review_set: Vec<Review>,
    pub order_set: Vec<ProductOrderLine>,
}

#[derive(Debug, Serialize)]
pub struct StoreView {
    #[serde(flatten)]
    pub store: Store,
    pub goods_set: Vec<StoreGoods>,
}

fn group_by<T>(rows: Vec<T>, key: impl Fn(&T) -> Uuid) -> HashMap<Uuid, Vec<T>> {
    let mut grouped: HashMap<Uuid, Vec<T>> = HashMap::new();
    for row in rows { grouped.entry(key(&row)).or_default().push(row); }
    grouped
}

#[tracing::instrument(skip(state))]
pub async fn show_store(State(state): State<AppState>, Path(store_id): Path<Uuid>) -> Result<Json<StoreView>> {
    let store = repository::stores::find_store(&state.db, store_id).await?.ok_or(StoreError::NotFound("Store"))?;
    let goods = repository::catalog::goods_stats_for_store(&state.db, store_id).await?;
    let ids: Vec<Uuid> = goods.iter().map(|g| g.id).collect();

    let mut images = group_by(repository::catalog::images_for(&state.db, &ids).await?, |i| i.goods_id);
    let mut reviews = group_by(repository::reviews::reviews_for(&state.db, &ids).await?, |r| r.goods_id);
    let mut orders = group_by(repository::stores::order_lines_for(&state.db, &ids).await?, |o| o.product_id);

    let goods_set = goods.into_iter().map(|g| StoreGoods {
        goods_id: g.id,
        format_price: format_price(g.price),
        star_avg: g.star_avg(),
        image_set: images.remove(&g.id).unwrap_or_default().into_iter().map(|i| i.url).collect(),
        review_set: reviews.remove(&g.id).unwrap_or_default(),
        order_set: orders.remove(&g.id).unwrap_or_default(),
        name: g.name,
        price: g.price,
        category: g.category,
        is_popular: g.is_popular,
    }).collect();

    Ok(Json(StoreView { store, goods_set }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct GoodsRegistration {
    #[serde(default)]
    pub goods_set: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct NewGoods {
    pub name: String,
    pub price: PriceInput,
    pub is_popular: Option<bool>,
    pub category: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Registers products under a store. Invalid entries are logged and skipped.
#[tracing::instrument(skip(state, identity, req), fields(entries = req.goods_set.len()))]
pub async fn register_goods(State(state): State<AppState>, identity: Option<Identity>, Path(store_id): Path<Uuid>, ValidJson(req): ValidJson<GoodsRegistration>) -> Result<(StatusCode, Json<Value>)> {
    let who = *authorize(identity.as_ref(), Capability::ManageCatalog)?;
    if req.goods_set.iter().all(Value::is_null) {
        return Err(StoreError::Validation("A problem has occurred.".into()));
    }
    let store = repository::stores::find_store(&state.db, store_id).await?.ok_or(StoreError::NotFound("Store"))?;
    authorize_owner(&who, store.seller_id)?;

    for (index, entry) in req.goods_set.into_iter().enumerate() {
        if entry.is_null() { continue; }
        let outcome = match serde_json::from_value::<NewGoods>(entry) {
            Ok(goods) => insert_goods(&state, store_id, goods).await,
            Err(e) => Err(StoreError::Validation(e.to_string())),
        };
        match outcome {
            Ok(goods_id) => tracing::info!(%goods_id, "goods registered"),
            Err(e) => tracing::warn!(index, error = %e, "skipping goods entry"),
        }
    }
    Ok((StatusCode::CREATED, message("The product has been registered.")))
}

async fn insert_goods(state: &AppState, store_id: Uuid, goods: NewGoods) -> Result<Uuid> {
    let (name, price, is_popular) = GoodsChanges::for_new(&goods.name, &goods.price, goods.is_popular)?;
    let urls = media::put_all(state.media.as_ref(), &goods.images).await?;

    let category = goods.category.as_deref().map(str::trim).filter(|c| !c.is_empty()).unwrap_or(DEFAULT_CATEGORY);
    let written = write_goods(state, store_id, category, (&name, price, is_popular), &urls).await;
    if written.is_err() {
        media::discard(state.media.as_ref(), &urls).await;
    }
    written
}

async fn write_goods(state: &AppState, store_id: Uuid, category: &str, (name, price, is_popular): (&str, i64, bool), urls: &[String]) -> Result<Uuid> {
    let mut tx = state.db.begin().await?;
    let category_id = repository::catalog::category_id(&mut tx, category).await?;
    let goods_id = repository::catalog::insert_goods(&mut tx, store_id, Some(category_id), name, price, is_popular).await?;
    repository::catalog::add_images(&mut tx, goods_id, urls).await?;
    tx.commit().await?;
    Ok(goods_id)
}

#[tracing::instrument(skip(state, identity, patch))]
pub async fn update_store(State(state): State<AppState>, identity: Option<Identity>, Path(store_id): Path<Uuid>, ValidJson(patch): ValidJson<StorePatch>) -> Result<Json<Value>> {
    let who = *authorize(identity.as_ref(), Capability::ManageCatalog)?;
    let (changes, mut images) = patch.into_changes()?;
    let store = repository::stores::find_store(&state.db, store_id).await?.ok_or(StoreError::NotFound("Store"))?;
    authorize_owner(&who, store.seller_id)?;

    let mut uploaded = Vec::new();
    for slot in [&mut images.logo1, &mut images.logo2, &mut images.background_image] {
        if let Some(data_url) = slot.take() {
            match state.media.put_data_url(&data_url).await {
                Ok(url) => {
                    uploaded.push(url.clone());
                    *slot = Some(url);
                }
                Err(e) => {
                    media::discard(state.media.as_ref(), &uploaded).await;
                    return Err(e.into());
                }
            }
        }
    }
    let written = match repository::stores::update_store(&state.db, store_id, &changes, &images).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(StoreError::NotFound("Store")),
        Err(e) => Err(StoreError::from(e)),
    };
    if let Err(e) = written {
        media::discard(state.media.as_ref(), &uploaded).await;
        return Err(e);
    }
    Ok(message("Store information has been modified."))
}
