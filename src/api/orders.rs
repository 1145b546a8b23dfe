//! Checkout orders and the per-status queues

use axum::{extract::{Path, State}, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;
use crate::api::{product_cards, LineView, ValidJson};
use crate::domain::aggregates::{NewOrder, Order, OrderItem, OrderStatus};
use crate::{repository, AppState, Result, StoreError};

#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<LineView>,
}

async fn order_views(state: &AppState, orders: Vec<Order>) -> Result<Vec<OrderView>> {
    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let items = repository::orders::items_for(&state.db, &ids).await?;
    let cards = product_cards(state, items.iter().map(|i| i.product_id)).await?;

    let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in items { by_order.entry(item.order_id).or_default().push(item); }

    Ok(orders.into_iter().map(|order| OrderView {
        items: by_order.remove(&order.id).unwrap_or_default().into_iter().map(|l| LineView {
            id: l.id,
            product: cards.get(&l.product_id).cloned(),
            quantity: l.quantity,
            price: l.price,
        }).collect(),
        order,
    }).collect())
}

#[tracing::instrument(skip(state, order), fields(user = %order.user, items = order.items.len()))]
pub async fn create_order(State(state): State<AppState>, ValidJson(order): ValidJson<NewOrder>) -> Result<(StatusCode, Json<Value>)> {
    if !order.total_matches_items() {
        tracing::warn!(supplied = %order.total_prices, computed = ?order.items_total(), "order total differs from item sum");
    }
    let created = repository::orders::create_order(&state.db, &order).await?;
    tracing::info!(order_id = %created.id, status = %created.status, "order created");
    Ok((StatusCode::CREATED, Json(json!({"message": "success", "id": created.id}))))
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusChange {
    pub status: OrderStatus,
}

#[tracing::instrument(skip(state))]
pub async fn update_status(State(state): State<AppState>, Path(order_id): Path<Uuid>, ValidJson(req): ValidJson<StatusChange>) -> Result<Json<Value>> {
    let order = repository::orders::set_status(&state.db, order_id, req.status).await?.ok_or(StoreError::NotFound("Order"))?;
    tracing::info!(%order_id, status = %order.status, "order status changed");
    Ok(Json(json!({"status": order.status})))
}

#[tracing::instrument(skip(state))]
pub async fn get_order(State(state): State<AppState>, Path(order_id): Path<Uuid>) -> Result<Json<OrderView>> {
    let order = repository::orders::find_order(&state.db, order_id).await?.ok_or(StoreError::NotFound("Order"))?;
    let view = order_views(&state, vec![order]).await?.pop().ok_or(StoreError::NotFound("Order"))?;
    Ok(Json(view))
}

#[tracing::instrument(skip(state))]
pub async fn delete_order(State(state): State<AppState>, Path(order_id): Path<Uuid>) -> Result<StatusCode> {
    if !repository::orders::delete_order(&state.db, order_id).await? {
        return Err(StoreError::NotFound("Order"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state))]
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<OrderView>>> {
    let orders = repository::orders::orders_with_status(&state.db, OrderStatus::Pending).await?;
    Ok(Json(order_views(&state, orders).await?))
}

#[tracing::instrument(skip(state))]
pub async fn user_orders(State(state): State<AppState>, Path(user_id): Path<Uuid>) -> Result<Json<Vec<OrderView>>> {
    let orders = repository::orders::orders_for_user(&state.db, user_id).await?;
    Ok(Json(order_views(&state, orders).await?))
}

#[derive(Debug, Serialize)]
pub struct StatusQueue {
    pub count: usize,
    pub orders: Vec<OrderView>,
}

async fn status_queue(state: &AppState, status: OrderStatus) -> Result<Json<StatusQueue>> {
    let orders = order_views(state, repository::orders::orders_with_status(&state.db, status).await?).await?;
    Ok(Json(StatusQueue { count: orders.len(), orders }))
}

pub async fn pending_orders(State(state): State<AppState>) -> Result<Json<StatusQueue>> {
    status_queue(&state, OrderStatus::Pending).await
}

pub async fn processing_orders(State(state): State<AppState>) -> Result<Json<StatusQueue>> {
    status_queue(&state, OrderStatus::Processing).await
}

pub async fn shipped_orders(State(state): State<AppState>) -> Result<Json<StatusQueue>> {
    status_queue(&state, OrderStatus::Shipped).await
}

pub async fn delivered_orders(State(state): State<AppState>) -> Result<Json<StatusQueue>> {
    status_queue(&state, OrderStatus::Delivered).await
}
