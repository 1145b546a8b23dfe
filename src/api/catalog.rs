//! Catalog listing, detail and search

use axum::{extract::{Path, Query, State}, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use crate::api::ValidJson;
use crate::auth::Identity;
use crate::domain::aggregates::{review::is_ordered, GoodsSummary, Review, SortKey};
use crate::{repository, AppState, Result, StoreError};

/// Listing query. Older clients send the sort key as `category`; `sort` wins
/// when both are present.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub sort: Option<String>,
    pub category: Option<String>,
}

impl ListParams {
    pub fn sort_key(&self) -> SortKey {
        SortKey::from_param(self.sort.as_deref().or(self.category.as_deref()))
    }
}

#[tracing::instrument(skip(state))]
pub async fn list_goods(State(state): State<AppState>, Query(params): Query<ListParams>) -> Result<Json<Vec<GoodsSummary>>> {
    let key = params.sort_key();
    let goods = repository::catalog::list_goods_stats(&state.db).await?;
    Ok(Json(key.arrange(goods).iter().map(|g| g.summary()).collect()))
}

#[derive(Debug, Serialize)]
pub struct GoodsDetail {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub is_popular: bool,
    pub category: String,
    pub store_id: Uuid,
    pub store_name: String,
    pub store_user_id: Uuid,
    pub address: String,
    pub star_avg: i64,
    pub image: Option<String>,
    pub image_set: Vec<String>,
    pub review_set: Vec<Review>,
    pub is_ordered: bool,
}

#[tracing::instrument(skip(state, identity))]
pub async fn goods_detail(State(state): State<AppState>, identity: Option<Identity>, Path(goods_id): Path<Uuid>) -> Result<Json<GoodsDetail>> {
    let goods = repository::catalog::goods_stats(&state.db, goods_id).await?.ok_or(StoreError::NotFound("Goods"))?;
    let store = repository::stores::find_store(&state.db, goods.store_id).await?.ok_or(StoreError::NotFound("Store"))?;
    let image_set = repository::catalog::images_for(&state.db, &[goods_id]).await?.into_iter().map(|i| i.url).collect();
    let review_set = repository::reviews::reviews_for(&state.db, &[goods_id]).await?;
    let (orders, reviews) = match identity {
        Some(who) => repository::reviews::purchase_counts(&state.db, who.user_id, goods_id).await?,
        None => (0, 0),
    };

    Ok(Json(GoodsDetail {
        id: goods.id,
        star_avg: goods.star_avg(),
        name: goods.name,
        price: goods.price,
        is_popular: goods.is_popular,
        category: goods.category,
        store_id: store.id,
        store_name: store.name,
        store_user_id: store.seller_id,
        address: store.address,
        image: goods.image,
        image_set,
        review_set,
        is_ordered: is_ordered(orders, reviews),
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    #[serde(default)]
    pub search: String,
}

#[tracing::instrument(skip(state))]
pub async fn search(State(state): State<AppState>, ValidJson(req): ValidJson<SearchRequest>) -> Result<Json<Vec<GoodsSummary>>> {
    let term = req.search.trim();
    if term.is_empty() { return Err(StoreError::Validation("This field may not be blank.".into())); }
    let goods = repository::catalog::search_goods(&state.db, term).await?;
    Ok(Json(goods.iter().map(|g| g.summary()).collect()))
}
