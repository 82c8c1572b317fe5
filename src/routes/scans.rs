use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::PartitionConfig;
use crate::error::{validation, AppError, AppResult, OptionExt};
use crate::scanner;
use crate::state::{AppState, JobHandle};
use crate::types::{CreateScanRequest, CreateScanResponse, ScanProgressView, ScanRow, StartedScan};

#[derive(Debug, Deserialize)]
pub struct PartitionQuery {
    pub partition: Option<String>,
}

/// Triggers a scan for one partition, or for all enabled partitions when
/// none is named. At most one scan per partition may be in flight;
/// overlapping triggers are rejected with 409.
pub async fn create_scan(
    State(state): State<AppState>,
    Json(req): Json<CreateScanRequest>,
) -> AppResult<(StatusCode, Json<CreateScanResponse>)> {
    let targets: Vec<PartitionConfig> = match &req.partition {
        Some(path) => {
            validation::validate_path(path)?;
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

    let mut jobs = state.jobs.write().await;
    for cfg in &targets {
        if jobs.contains_key(&cfg.path) {
            return Err(AppError::Conflict(format!(
                "a scan is already running for partition {}",
                cfg.path
            )));
        }
    }

    let mut started = Vec::with_capacity(targets.len());
    for cfg in targets {
        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let partition = cfg.path.clone();
        jobs.insert(partition.clone(), JobHandle { id, cancel: cancel.clone() });
        started.push(StartedScan { id, partition: partition.clone(), status: "running".to_string() });

        let task_state = state.clone();
        let scanner_cfg = state.config.scanner.clone();
        tokio::spawn(async move {
            // Bound cross-partition parallelism; a closed semaphore cannot
            // happen since the state owns it for the process lifetime.
            let _slot = task_state.scan_slots.clone().acquire_owned().await;
            let result = scanner::run_partition_scan(
                task_state.store.clone(),
                cfg,
                scanner_cfg,
                task_state.progress.clone(),
                cancel,
                id,
            )
            .await;
            if let Err(e) = result {
                tracing::error!("Scan {} for partition {} failed: {}", id, partition, e);
            }
            task_state.jobs.write().await.remove(&partition);
        });
    }

    Ok((StatusCode::ACCEPTED, Json(CreateScanResponse { scans: started })))
}

/// Cooperatively cancels the running scan with the given id. Unwalked
/// subtrees simply never emit records; partial results remain valid.
pub async fn cancel_scan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let jobs = state.jobs.read().await;
    let handle = jobs.values().find(|j| j.id == id).ok_or_not_found("scan")?;
    handle.cancel.cancel();
    Ok(Json(json!({ "id": id, "status": "cancelling" })))
}

/// Scan history for one partition, newest first.
pub async fn list_scans(
    State(state): State<AppState>,
    Query(q): Query<PartitionQuery>,
) -> AppResult<Json<Vec<ScanRow>>> {
    let partition = q.partition.ok_or_else(|| {
        AppError::BadRequest("query parameter 'partition' is required".to_string())
    })?;
    state.config.find_partition(&partition).ok_or_not_found("partition")?;
    let rows = state.store.list_scans(&partition).await?;
    Ok(Json(rows))
}

/// Progress snapshots for running (and recently finished) scans.
pub async fn get_progress(
    State(state): State<AppState>,
    Query(q): Query<PartitionQuery>,
) -> AppResult<Json<Vec<ScanProgressView>>> {
    let map = state
        .progress
        .lock()
        .map_err(|_| AppError::Internal(anyhow::anyhow!("progress map poisoned")))?;
    let mut views: Vec<ScanProgressView> = map
        .values()
        .filter(|p| q.partition.as_deref().map(|q| p.partition.eq_ignore_ascii_case(q)).unwrap_or(true))
        .map(ScanProgressView::from)
        .collect();
    views.sort_by(|a, b| a.partition.cmp(&b.partition));
    Ok(Json(views))
}
