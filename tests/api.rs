//! HTTP-level tests.
//!
//! The first group drives the router over a lazy pool that never connects, so
//! it covers everything decided before the database is touched. The second
//! group runs full scenarios against PostgreSQL and is skipped unless
//! `TEST_DATABASE_URL` is set.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use opensase_storefront::{media::LocalBlobStore, router, AppState};
use serde_json::{json, Value};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

fn app_with(db: PgPool, media_root: &std::path::Path) -> Router {
    router(AppState { db, media: Arc::new(LocalBlobStore::new(media_root, "/media")) })
}

fn offline_app(media_root: &std::path::Path) -> Router {
    let db = PgPoolOptions::new().connect_lazy("postgres://storefront@127.0.0.1:1/unreachable").unwrap();
    app_with(db, media_root)
}

struct Caller { user_id: Option<Uuid>, seller: bool }

impl Caller {
    fn anonymous() -> Self { Self { user_id: None, seller: false } }
    fn buyer(id: Uuid) -> Self { Self { user_id: Some(id), seller: false } }
    fn seller(id: Uuid) -> Self { Self { user_id: Some(id), seller: true } }
}

async fn send(app: &Router, method: Method, uri: &str, caller: &Caller, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(id) = caller.user_id {
        req = req.header("x-user-id", id.to_string());
    }
    if caller.seller {
        req = req.header("x-user-seller", "true");
    }
    let req = match body {
        Some(b) => req.header("content-type", "application/json").body(Body::from(b.to_string())).unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(&offline_app(dir.path()), Method::GET, "/health", &Caller::anonymous(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_review_requires_identity() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("/review/{}", Uuid::now_v7());
    let body = json!({"review": "Delicious and arrived warm", "star": 5});
    let (status, body) = send(&offline_app(dir.path()), Method::POST, &uri, &Caller::anonymous(), Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Please use after logging in.");
}

#[tokio::test]
async fn test_short_review_is_rejected_before_purchase_check() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("/review/{}", Uuid::now_v7());
    let (status, body) = send(&offline_app(dir.path()), Method::POST, &uri, &Caller::buyer(Uuid::now_v7()), Some(json!({"review": "short", "star": 3}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("review").is_some());
}

#[tokio::test]
async fn test_goods_batch_needs_seller() {
    let dir = tempfile::tempdir().unwrap();
    let app = offline_app(dir.path());
    let batch = json!({"goods_set": [{"id": Uuid::now_v7(), "name": "Noodles"}]});

    let (status, _) = send(&app, Method::PATCH, "/goods", &Caller::anonymous(), Some(batch.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::PATCH, "/goods", &Caller::buyer(Uuid::now_v7()), Some(batch)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_empty_goods_set_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = offline_app(dir.path());
    let seller = Caller::seller(Uuid::now_v7());

    let (status, body) = send(&app, Method::PATCH, "/goods", &seller, Some(json!({"goods_set": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "A problem has occurred.");

    let uri = format!("/{}", Uuid::now_v7());
    let (status, _) = send(&app, Method::POST, &uri, &seller, Some(json!({"goods_set": [null]}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_store_name_cannot_be_changed() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("/{}", Uuid::now_v7());
    let (status, body) = send(&offline_app(dir.path()), Method::PATCH, &uri, &Caller::seller(Uuid::now_v7()), Some(json!({"store_name": "Renamed"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "The store name cannot be changed.");
}

#[tokio::test]
async fn test_unknown_order_status_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("/order/update/{}", Uuid::now_v7());
    let (status, _) = send(&offline_app(dir.path()), Method::PUT, &uri, &Caller::anonymous(), Some(json!({"status": "Lost"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_line_items_need_positive_quantity() {
    let dir = tempfile::tempdir().unwrap();
    let app = offline_app(dir.path());
    let item = json!({"product": Uuid::now_v7(), "quantity": 0, "price": "10.00"});

    let cart = json!({"user": Uuid::now_v7(), "items": [item.clone()]});
    let (status, _) = send(&app, Method::POST, "/cart/create", &Caller::anonymous(), Some(cart)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let order = json!({"user": Uuid::now_v7(), "tel": "02055551234", "total_prices": "0", "items": [item]});
    let (status, _) = send(&app, Method::POST, "/order/create", &Caller::anonymous(), Some(order)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_amounts_must_fit_the_price_column() {
    let dir = tempfile::tempdir().unwrap();
    let app = offline_app(dir.path());
    let line = |price: &str| json!({"product": Uuid::now_v7(), "quantity": 2, "price": price});
    let order = |total: &str, price: &str| json!({"user": Uuid::now_v7(), "tel": "02055551234", "total_prices": total, "items": [line(price)]});

    // Would overflow while totalling the lines.
    let (status, body) = send(&app, Method::POST, "/order/create", &Caller::anonymous(), Some(order("10.00", "79228162514264337593543950335"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("items").is_some());

    let (status, body) = send(&app, Method::POST, "/order/create", &Caller::anonymous(), Some(order("123456789.00", "10.00"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("total_prices").is_some());

    let (status, _) = send(&app, Method::POST, "/order/create", &Caller::anonymous(), Some(order("10.00", "5.001"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let cart = json!({"user": Uuid::now_v7(), "items": [line("123456789.00")]});
    let (status, _) = send(&app, Method::POST, "/cart/create", &Caller::anonymous(), Some(cart)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let update = json!({"items": [line("79228162514264337593543950335")]});
    let (status, _) = send(&app, Method::PUT, &format!("/cart/update/{}", Uuid::now_v7()), &Caller::anonymous(), Some(update)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blank_search_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (status, _) = send(&offline_app(dir.path()), Method::POST, "/search", &Caller::anonymous(), Some(json!({"search": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// -----------------------------------------------------------------------------
// Database scenarios
// -----------------------------------------------------------------------------

async fn database() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let db = PgPoolOptions::new().max_connections(5).connect(&url).await.unwrap();
    sqlx::migrate!("./migrations").run(&db).await.unwrap();
    Some(db)
}

/// Inserts a store owned by a fresh seller and registers one product in it.
async fn seed_goods(app: &Router, db: &PgPool) -> (Caller, Uuid, Uuid) {
    let seller_id = Uuid::now_v7();
    let store_id = Uuid::now_v7();
    sqlx::query("INSERT INTO stores (id, seller_id, name, address) VALUES ($1, $2, 'Noodle House', 'Vientiane Chanthabouly District')")
        .bind(store_id).bind(seller_id)
        .execute(db).await.unwrap();

    let seller = Caller::seller(seller_id);
    let goods = json!({"goods_set": [{"name": "Khao piak sen", "price": "25,000Kip", "category": "noodles"}]});
    let (status, _) = send(app, Method::POST, &format!("/{store_id}"), &seller, Some(goods)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, store) = send(app, Method::GET, &format!("/{store_id}"), &Caller::anonymous(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store["goods_set"][0]["price"], 25000);
    assert_eq!(store["goods_set"][0]["format_price"], "25,000");
    let goods_id = store["goods_set"][0]["goods_id"].as_str().unwrap().parse().unwrap();
    (seller, store_id, goods_id)
}

async fn place_order(app: &Router, user: Uuid, goods_id: Uuid) -> Uuid {
    let order = json!({
        "user": user, "tel": "02055551234", "total_prices": "50000.00",
        "items": [{"product": goods_id, "quantity": 2, "price": "25000.00"}],
    });
    let (status, body) = send(app, Method::POST, "/order/create", &Caller::anonymous(), Some(order)).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_order_lifecycle_moves_between_queues() {
    let Some(db) = database().await else { return };
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(db.clone(), dir.path());
    let (_, _, goods_id) = seed_goods(&app, &db).await;
    let order_id = place_order(&app, Uuid::now_v7(), goods_id).await;

    let (_, pending) = send(&app, Method::GET, "/order/pending", &Caller::anonymous(), None).await;
    let in_queue = |queue: &Value| queue["orders"].as_array().unwrap().iter().any(|o| o["id"] == order_id.to_string());
    assert!(in_queue(&pending));
    assert_eq!(pending["count"].as_u64().unwrap() as usize, pending["orders"].as_array().unwrap().len());

    let (status, body) = send(&app, Method::PUT, &format!("/order/update/{order_id}"), &Caller::anonymous(), Some(json!({"status": "Shipped"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Shipped");

    let (_, pending) = send(&app, Method::GET, "/order/pending", &Caller::anonymous(), None).await;
    let (_, shipped) = send(&app, Method::GET, "/order/shipped", &Caller::anonymous(), None).await;
    assert!(!in_queue(&pending));
    assert!(in_queue(&shipped));

    let (status, order) = send(&app, Method::GET, &format!("/order/{order_id}"), &Caller::anonymous(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["items"][0]["quantity"], 2);
    assert_eq!(order["items"][0]["product"]["name"], "Khao piak sen");

    let (status, _) = send(&app, Method::DELETE, &format!("/order/delete/{order_id}"), &Caller::anonymous(), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/order/{order_id}"), &Caller::anonymous(), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (left,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM order_items WHERE order_id = $1").bind(order_id).fetch_one(&db).await.unwrap();
    assert_eq!(left, 0);
}

#[tokio::test]
async fn test_cart_update_and_delete() {
    let Some(db) = database().await else { return };
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(db.clone(), dir.path());
    let (_, _, goods_id) = seed_goods(&app, &db).await;
    let user = Uuid::now_v7();

    let cart = json!({"user": user, "items": [{"product": goods_id, "quantity": 1, "price": "25000.00"}]});
    let (status, body) = send(&app, Method::POST, "/cart/create", &Caller::anonymous(), Some(cart)).await;
    assert_eq!(status, StatusCode::CREATED);
    let cart_id: Uuid = body["id"].as_str().unwrap().parse().unwrap();

    let (_, cart) = send(&app, Method::GET, &format!("/cart/{cart_id}"), &Caller::anonymous(), None).await;
    let item_id = cart["items"][0]["id"].clone();
    let update = json!({"items": [
        {"id": item_id, "product": goods_id, "quantity": 3, "price": "25000.00"},
        {"product": goods_id, "quantity": 1, "price": "24000.00"},
    ]});
    let (status, cart) = send(&app, Method::PUT, &format!("/cart/update/{cart_id}"), &Caller::anonymous(), Some(update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().unwrap().len(), 2);
    assert_eq!(cart["subtotal"], "99000.00");

    let stray = json!({"items": [{"id": Uuid::now_v7(), "product": goods_id, "quantity": 1, "price": "1.00"}]});
    let (status, _) = send(&app, Method::PUT, &format!("/cart/update/{cart_id}"), &Caller::anonymous(), Some(stray)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &format!("/cart/delete/{cart_id}"), &Caller::anonymous(), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (left,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE cart_id = $1").bind(cart_id).fetch_one(&db).await.unwrap();
    assert_eq!(left, 0);
}

#[tokio::test]
async fn test_review_is_gated_on_purchase() {
    let Some(db) = database().await else { return };
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(db.clone(), dir.path());
    let (_, _, goods_id) = seed_goods(&app, &db).await;
    let buyer = Uuid::now_v7();
    let uri = format!("/review/{goods_id}");
    let review = json!({"review": "Rich broth and generous portions", "star": 4});

    let (status, body) = send(&app, Method::POST, &uri, &Caller::buyer(buyer), Some(review.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Only users who have placed an order can leave a review.");

    place_order(&app, buyer, goods_id).await;
    let (status, _) = send(&app, Method::POST, &format!("/check-review/{goods_id}"), &Caller::buyer(buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::POST, &uri, &Caller::buyer(buyer), Some(review.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Review completed");

    let (status, body) = send(&app, Method::POST, &uri, &Caller::buyer(buyer), Some(review)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "I've already written a review.");

    let (_, detail) = send(&app, Method::GET, &format!("/detail/{goods_id}"), &Caller::buyer(buyer), None).await;
    assert_eq!(detail["star_avg"], 4);
    assert_eq!(detail["review_set"].as_array().unwrap().len(), 1);
    assert_eq!(detail["is_ordered"], true);
}

const PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgo=";

async fn store_goods(app: &Router, store_id: Uuid, goods_id: Uuid) -> Value {
    let (status, store) = send(app, Method::GET, &format!("/{store_id}"), &Caller::anonymous(), None).await;
    assert_eq!(status, StatusCode::OK);
    store["goods_set"].as_array().unwrap().iter().find(|g| g["goods_id"] == goods_id.to_string()).cloned().unwrap()
}

fn files_in(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_batch_edit_normalizes_price_and_replaces_images() {
    let Some(db) = database().await else { return };
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(db.clone(), dir.path());
    let (seller, store_id, goods_id) = seed_goods(&app, &db).await;

    let batch = json!({"goods_set": [
        {"id": goods_id, "name": "Khao piak sen (large)", "price": "120000Kip", "images": [PNG_DATA_URL]},
        {"id": Uuid::now_v7(), "name": "Missing goods"},
        "not an entry",
        null,
    ]});
    let (status, body) = send(&app, Method::PATCH, "/goods", &seller, Some(batch)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "The product has been modified.");
    assert_eq!(body["updated"], 1);
    assert_eq!(body["skipped"], 2);

    let goods = store_goods(&app, store_id, goods_id).await;
    assert_eq!(goods["price"], 120000);
    assert_eq!(goods["name"], "Khao piak sen (large)");
    let first = goods["image_set"].as_array().unwrap().clone();
    assert_eq!(first.len(), 1);

    let batch = json!({"goods_set": [{"id": goods_id, "images": [PNG_DATA_URL, PNG_DATA_URL]}]});
    let (status, _) = send(&app, Method::PATCH, "/goods", &seller, Some(batch)).await;
    assert_eq!(status, StatusCode::OK);

    let goods = store_goods(&app, store_id, goods_id).await;
    let replaced = goods["image_set"].as_array().unwrap();
    assert_eq!(replaced.len(), 2);
    assert!(!replaced.contains(&first[0]));
    assert_eq!(goods["price"], 120000);
    assert_eq!(files_in(dir.path()), 3);
}

#[tokio::test]
async fn test_batch_edit_keeps_no_uploads_for_rejected_entries() {
    let Some(db) = database().await else { return };
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(db.clone(), dir.path());
    let (seller, _, goods_id) = seed_goods(&app, &db).await;

    let batch = json!({"goods_set": [{"id": goods_id, "images": [PNG_DATA_URL, "https://example.com/a.png"]}]});
    let (status, body) = send(&app, Method::PATCH, "/goods", &seller, Some(batch)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["skipped"], 1);
    assert_eq!(files_in(dir.path()), 0);
}

#[tokio::test]
async fn test_search_matches_goods_and_store_names() {
    let Some(db) = database().await else { return };
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(db.clone(), dir.path());
    let (_, _, goods_id) = seed_goods(&app, &db).await;
    let found = |results: &Value| results.as_array().unwrap().iter().any(|g| g["id"] == goods_id.to_string());

    let (status, results) = send(&app, Method::POST, "/search", &Caller::anonymous(), Some(json!({"search": "PIAK SEN"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(found(&results));

    let (_, results) = send(&app, Method::POST, "/search", &Caller::anonymous(), Some(json!({"search": "noodle house"}))).await;
    assert!(found(&results));

    let (_, results) = send(&app, Method::POST, "/search", &Caller::anonymous(), Some(json!({"search": Uuid::now_v7().to_string()}))).await;
    assert_eq!(results, json!([]));
}

#[tokio::test]
async fn test_listing_orders_by_price() {
    let Some(db) = database().await else { return };
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(db.clone(), dir.path());
    let (seller, store_id, goods_id) = seed_goods(&app, &db).await;
    let cheap = json!({"goods_set": [{"name": "Iced coffee", "price": 500, "is_popular": true}]});
    let (status, _) = send(&app, Method::POST, &format!("/{store_id}"), &seller, Some(cheap)).await;
    assert_eq!(status, StatusCode::CREATED);

    let prices = |listing: &Value| listing.as_array().unwrap().iter().map(|g| g["price"].as_i64().unwrap()).collect::<Vec<_>>();

    let (status, listing) = send(&app, Method::GET, "/?sort=4", &Caller::anonymous(), None).await;
    assert_eq!(status, StatusCode::OK);
    let ascending = prices(&listing);
    assert!(ascending.len() >= 2);
    assert!(ascending.windows(2).all(|w| w[0] <= w[1]));
    assert!(listing.as_array().unwrap().iter().any(|g| g["id"] == goods_id.to_string()));

    let (_, listing) = send(&app, Method::GET, "/?sort=2", &Caller::anonymous(), None).await;
    assert!(prices(&listing).windows(2).all(|w| w[0] >= w[1]));
}
