use axum::extract::State;
use axum::Json;

use crate::error::{AppError, AppResult, OptionExt};
use crate::reconcile::{reconcile_partition, ReconcileResult};
use crate::state::AppState;
use crate::types::ReconcileRequest;

/// Brings persisted snapshots back in line with the current policy for one
/// or all enabled partitions, without re-walking the filesystem.
///
/// Partitions with a scan in flight are skipped rather than raced: the scan
/// is writing records for the policy it was started under.
pub async fn run_reconcile(
    State(state): State<AppState>,
    Json(req): Json<ReconcileRequest>,
) -> AppResult<Json<Vec<ReconcileResult>>> {
    let targets: Vec<_> = match &req.partition {
        Some(path) => {
            let cfg = state.config.find_partition(path).ok_or_not_found("partition")?;
            if !cfg.enabled {
                return Err(AppError::BadRequest(format!("partition {} is disabled", cfg.path)));
            }
            vec![cfg.clone()]
        }
        None => state.config.partitions.iter().filter(|p| p.enabled).cloned().collect(),
    };

    if targets.is_empty() {
        return Err(AppError::BadRequest("no enabled partitions configured".to_string()));
    }

    let jobs = state.jobs.read().await;
    let mut results = Vec::with_capacity(targets.len());
    for cfg in targets {
        if jobs.contains_key(&cfg.path) {
            return Err(AppError::Conflict(format!(
                "a scan is running for partition {}; reconcile after it finishes",
                cfg.path
            )));
        }
        let result = reconcile_partition(&state.store, &cfg).await?;
        results.push(result);
    }

    Ok(Json(results))
}
