//! HTTP routes

pub mod carts;
pub mod catalog;
pub mod goods;
pub mod orders;
pub mod policies;
pub mod reviews;
pub mod stores;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;
use validator::Validate;
use crate::domain::aggregates::GoodsSummary;
use crate::{repository, AppState, StoreError};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "opensase-storefront"})) }))
        // catalog
        .route("/", get(catalog::list_goods))
        .route("/detail/:goods_id", get(catalog::goods_detail))
        .route("/goods/:goods_id", get(catalog::goods_detail))
        .route("/search", post(catalog::search))
        // goods administration
        .route("/goods", patch(goods::batch_update).delete(goods::delete_goods))
        .route("/goods/:goods_id/edit", put(goods::edit_goods).patch(goods::edit_goods))
        .route("/goods/image/:goods_id/edit", put(goods::edit_image).patch(goods::edit_image))
        // stores
        .route("/:store_id", get(stores::show_store).post(stores::register_goods).patch(stores::update_store))
        // reviews
        .route("/review/:id", get(reviews::list_reviews).post(reviews::create_review).patch(reviews::update_review).delete(reviews::delete_review))
        .route("/products/:goods_id/reviews", get(reviews::list_reviews))
        .route("/check-review/:goods_id", post(reviews::check_review))
        .route("/terms/:category", get(policies::terms))
        // carts
        .route("/carts", get(carts::list_carts).post(carts::create_empty_cart))
        .route("/cart/create", post(carts::create_cart))
        .route("/cart/update/:cart_id", put(carts::update_cart))
        .route("/cart/delete/:cart_id", delete(carts::delete_cart))
        .route("/cart/item/delete/:item_id", delete(carts::delete_cart_item))
        .route("/cart/:cart_id", get(carts::get_cart).put(carts::reassign_cart).patch(carts::reassign_cart).delete(carts::delete_cart))
        .route("/user/:user_id/cart", get(carts::user_carts))
        // orders
        .route("/orders", get(orders::list_orders))
        .route("/order/create", post(orders::create_order))
        .route("/order/update/:order_id", put(orders::update_status))
        .route("/order/delete/:order_id", delete(orders::delete_order))
        .route("/order/pending", get(orders::pending_orders))
        .route("/order/processing", get(orders::processing_orders))
        .route("/order/shipped", get(orders::shipped_orders))
        .route("/order/delivered", get(orders::delivered_orders))
        .route("/order/:order_id", get(orders::get_order).patch(orders::update_status).delete(orders::delete_order))
        .route("/user/:user_id/order", get(orders::user_orders))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// JSON body that is rejected with 400 when it fails to parse or to validate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = StoreError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| StoreError::Validation(e.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// A cart or order line with its product rendered as a listing card.
#[derive(Debug, Clone, Serialize)]
pub struct LineView {
    pub id: Uuid,
    pub product: Option<GoodsSummary>,
    pub quantity: i32,
    pub price: Decimal,
}

pub(crate) async fn product_cards(state: &AppState, ids: impl IntoIterator<Item = Uuid>) -> crate::Result<HashMap<Uuid, GoodsSummary>> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    let stats = repository::catalog::goods_stats_by_id(&state.db, &ids).await?;
    Ok(stats.into_iter().map(|(id, g)| (id, g.summary())).collect())
}

pub(crate) fn message(text: &str) -> Json<serde_json::Value> { Json(serde_json::json!({"message": text})) }
