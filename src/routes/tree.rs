use std::path::PathBuf;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::error::{validation, AppResult, OptionExt};
use crate::state::AppState;
use crate::tree;
use crate::types::FolderTreeNode;

#[derive(Debug, Deserialize)]
pub struct TreeQuery {
    pub partition: String,
    /// Directory to list; defaults to the partition path itself.
    pub path: Option<String>,
}

/// Live-filesystem child listing used by the override-editing UI.
pub async fn list_children(
    State(state): State<AppState>,
    Query(q): Query<TreeQuery>,
) -> AppResult<Json<Vec<FolderTreeNode>>> {
    validation::validate_path(&q.partition)?;
    let cfg = state.config.find_partition(&q.partition).ok_or_not_found("partition")?.clone();

    let parent = PathBuf::from(q.path.unwrap_or_else(|| cfg.path.clone()));
    validation::validate_path(&parent.to_string_lossy())?;

    // Directory listing is blocking I/O
    let nodes = tokio::task::spawn_blocking(move || tree::list_children(&parent, &cfg))
        .await
        .map_err(|e| crate::error::AppError::Internal(anyhow::anyhow!("listing task failed: {}", e)))??;
    Ok(Json(nodes))
}
