use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::diff;
use crate::error::{AppError, AppResult, OptionExt};
use crate::state::AppState;
use crate::types::DiffReportEntry;

#[derive(Debug, Deserialize)]
pub struct DiffQuery {
    pub partition: String,
    /// Drop zero-change entries when set.
    #[serde(default)]
    pub changed_only: bool,
}

/// Latest size deltas per path for one partition, largest absolute change
/// first — the input the report renderer consumes.
pub async fn get_diffs(
    State(state): State<AppState>,
    Query(q): Query<DiffQuery>,
) -> AppResult<Json<Vec<DiffReportEntry>>> {
    if q.partition.trim().is_empty() {
        return Err(AppError::BadRequest("query parameter 'partition' is required".to_string()));
    }
    state.config.find_partition(&q.partition).ok_or_not_found("partition")?;

    let diffs = diff::latest_diffs(&state.store, &q.partition).await?;
    let mut entries: Vec<DiffReportEntry> = diffs
        .iter()
        .map(DiffReportEntry::from)
        .filter(|e| !q.changed_only || e.size_difference != 0)
        .collect();
    entries.sort_by_key(|e| std::cmp::Reverse(e.size_difference.abs()));
    Ok(Json(entries))
}
