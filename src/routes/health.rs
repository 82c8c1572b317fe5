use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::error::AppResult;
use crate::state::AppState;

pub async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Ready once the snapshot data directory is usable.
pub async fn readyz(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    tokio::fs::create_dir_all(&state.config.storage.data_dir).await?;
    Ok(Json(json!({
        "status": "ready",
        "partitions": state.config.partitions.len(),
    })))
}

pub async fn version() -> Json<serde_json::Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
