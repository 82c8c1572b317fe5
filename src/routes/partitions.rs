use axum::extract::State;
use axum::Json;

use crate::state::AppState;
use crate::types::PartitionInfo;

/// Configured partitions with their policy shape, for the scheduler and UI.
pub async fn list_partitions(State(state): State<AppState>) -> Json<Vec<PartitionInfo>> {
    let infos = state
        .config
        .partitions
        .iter()
        .map(|p| PartitionInfo {
            path: p.path.clone(),
            enabled: p.enabled,
            default_scan_depth: p.default_scan_depth,
            root_count: p.roots.len(),
            exclusion_count: p.exclusions.len(),
            override_count: p.overrides.len(),
        })
        .collect();
    Json(infos)
}
