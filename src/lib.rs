//! OpenSASE Storefront
//!
//! Storefront, catalog and order service backed by PostgreSQL.
//!
//! ## Features
//! - Product listing, sorting and search
//! - Store pages and product registration
//! - Shopping carts and checkout orders with per-status queues
//! - Purchase-gated product reviews

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod media;
pub mod repository;

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;

pub use api::router;
pub use config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub media: Arc<dyn media::BlobStore>,
}

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid input")]
    Fields(#[from] validator::ValidationErrors),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Denied(#[from] auth::DenyReason),

    #[error(transparent)]
    Review(#[from] domain::aggregates::ReviewDenied),

    #[error(transparent)]
    Media(#[from] media::MediaError),

    #[error("Storage error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db) = err.as_database_error() {
            if db.is_foreign_key_violation() {
                return Self::Validation("Invalid pk - object does not exist.".to_string());
            }
            if db.is_check_violation() {
                return Self::Validation("Ensure all values are within the allowed range.".to_string());
            }
        }
        Self::Database(err)
    }
}

impl From<domain::aggregates::GoodsError> for StoreError {
    fn from(err: domain::aggregates::GoodsError) -> Self { Self::Validation(err.to_string()) }
}

impl From<domain::aggregates::StoreRuleError> for StoreError {
    fn from(err: domain::aggregates::StoreRuleError) -> Self { Self::Validation(err.to_string()) }
}

impl StoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Fields(_) | Self::Review(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Denied(auth::DenyReason::Anonymous) => StatusCode::UNAUTHORIZED,
            Self::Denied(_) => StatusCode::FORBIDDEN,
            Self::Media(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Media(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        let body = match self {
            Self::Fields(errors) => json!(errors),
            Self::NotFound(what) => json!({"message": format!("{what} not found")}),
            Self::Database(_) | Self::Media(media::MediaError::Io(_) | media::MediaError::Foreign(_)) => json!({"message": "A problem has occurred."}),
            other => json!({"message": other.to_string()}),
        };
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
