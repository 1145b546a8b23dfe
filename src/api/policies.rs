//! Terms of use and privacy policy lookup

use axum::{extract::{Path, State}, Json};
use serde_json::{json, Value};
use crate::{repository, AppState, Result};

#[tracing::instrument(skip(state))]
pub async fn terms(State(state): State<AppState>, Path(category): Path<i32>) -> Result<Json<Value>> {
    let content = repository::policies::latest_content(&state.db, category).await?;
    Ok(Json(json!({"content": content.unwrap_or_default()})))
}
