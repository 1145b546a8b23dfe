//! Shopping carts

use axum::{extract::{Path, State}, http::StatusCode, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;
use crate::api::{product_cards, LineView, ValidJson};
use crate::domain::aggregates::{cart::{plan_update, subtotal}, Cart, CartItem, LineItemInput};
use crate::repository::{self, carts::UpdateOutcome};
use crate::{AppState, Result, StoreError};

#[derive(Debug, Serialize)]
pub struct CartView {
    #[serde(flatten)]
    pub cart: Cart,
    /// `null` only if the line sum overflows.
    pub subtotal: Option<Decimal>,
    pub items: Vec<LineView>,
}

/// Renders carts with their items, loading every line and product card in
/// two batched queries.
async fn cart_views(state: &AppState, carts: Vec<Cart>) -> Result<Vec<CartView>> {
    let ids: Vec<Uuid> = carts.iter().map(|c| c.id).collect();
    let items = repository::carts::items_for(&state.db, &ids).await?;
    let cards = product_cards(state, items.iter().map(|i| i.product_id)).await?;

    let mut by_cart: HashMap<Uuid, Vec<CartItem>> = HashMap::new();
    for item in items { by_cart.entry(item.cart_id).or_default().push(item); }

    Ok(carts.into_iter().map(|cart| {
        let lines = by_cart.remove(&cart.id).unwrap_or_default();
        CartView {
            subtotal: subtotal(lines.iter().map(|l| (l.quantity, &l.price))),
            items: lines.into_iter().map(|l| LineView {
                id: l.id,
                product: cards.get(&l.product_id).cloned(),
                quantity: l.quantity,
                price: l.price,
            }).collect(),
            cart,
        }
    }).collect())
}

async fn cart_view(state: &AppState, cart: Cart) -> Result<CartView> {
    cart_views(state, vec![cart]).await?.pop().ok_or(StoreError::NotFound("Cart"))
}

#[tracing::instrument(skip(state))]
pub async fn list_carts(State(state): State<AppState>) -> Result<Json<Vec<CartView>>> {
    let carts = repository::carts::list_carts(&state.db).await?;
    Ok(Json(cart_views(&state, carts).await?))
}

#[tracing::instrument(skip(state))]
pub async fn user_carts(State(state): State<AppState>, Path(user_id): Path<Uuid>) -> Result<Json<Vec<CartView>>> {
    let carts = repository::carts::carts_for_user(&state.db, user_id).await?;
    Ok(Json(cart_views(&state, carts).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CartOwner {
    pub user: Uuid,
}

#[tracing::instrument(skip(state))]
pub async fn create_empty_cart(State(state): State<AppState>, ValidJson(req): ValidJson<CartOwner>) -> Result<(StatusCode, Json<CartView>)> {
    let cart = repository::carts::create_cart(&state.db, req.user, &[]).await?;
    Ok((StatusCode::CREATED, Json(cart_view(&state, cart).await?)))
}

#[tracing::instrument(skip(state))]
pub async fn get_cart(State(state): State<AppState>, Path(cart_id): Path<Uuid>) -> Result<Json<CartView>> {
    let cart = repository::carts::find_cart(&state.db, cart_id).await?.ok_or(StoreError::NotFound("Cart"))?;
    Ok(Json(cart_view(&state, cart).await?))
}

#[tracing::instrument(skip(state))]
pub async fn reassign_cart(State(state): State<AppState>, Path(cart_id): Path<Uuid>, ValidJson(req): ValidJson<CartOwner>) -> Result<Json<CartView>> {
    let cart = repository::carts::reassign_cart(&state.db, cart_id, req.user).await?.ok_or(StoreError::NotFound("Cart"))?;
    Ok(Json(cart_view(&state, cart).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewCart {
    pub user: Uuid,
    #[validate]
    #[serde(default)]
    pub items: Vec<LineItemInput>,
}

#[tracing::instrument(skip(state, req), fields(user = %req.user, items = req.items.len()))]
pub async fn create_cart(State(state): State<AppState>, ValidJson(req): ValidJson<NewCart>) -> Result<(StatusCode, Json<Value>)> {
    let cart = repository::carts::create_cart(&state.db, req.user, &req.items).await?;
    tracing::info!(cart_id = %cart.id, "cart created");
    Ok((StatusCode::CREATED, Json(json!({"message": "success", "id": cart.id}))))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CartUpdate {
    #[validate]
    #[serde(default)]
    pub items: Vec<LineItemInput>,
}

#[tracing::instrument(skip(state, req), fields(items = req.items.len()))]
pub async fn update_cart(State(state): State<AppState>, Path(cart_id): Path<Uuid>, ValidJson(req): ValidJson<CartUpdate>) -> Result<Json<CartView>> {
    let cart = repository::carts::find_cart(&state.db, cart_id).await?.ok_or(StoreError::NotFound("Cart"))?;
    match repository::carts::apply_changes(&state.db, cart_id, &plan_update(&req.items)).await? {
        UpdateOutcome::Applied => Ok(Json(cart_view(&state, cart).await?)),
        UpdateOutcome::UnknownItem(item_id) => {
            tracing::warn!(%cart_id, %item_id, "cart update names an item outside the cart");
            Err(StoreError::NotFound("Cart item"))
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn delete_cart(State(state): State<AppState>, Path(cart_id): Path<Uuid>) -> Result<StatusCode> {
    if !repository::carts::delete_cart(&state.db, cart_id).await? {
        return Err(StoreError::NotFound("Cart"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state))]
pub async fn delete_cart_item(State(state): State<AppState>, Path(item_id): Path<Uuid>) -> Result<StatusCode> {
    if !repository::carts::delete_item(&state.db, item_id).await? {
        return Err(StoreError::NotFound("Cart item"));
    }
    Ok(StatusCode::NO_CONTENT)
}
