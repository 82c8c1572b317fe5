//! Policy-driven, depth-bounded tree walker.
//!
//! One scan of one partition runs sequentially on a blocking worker thread,
//! emitting batches of size records over a channel to an async persister.
//! All traversal state (visited-path set, batch buffer, progress counters)
//! is scan-scoped; nothing is shared across concurrent partition scans.

pub mod stats;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::{PartitionConfig, ScannerConfig};
use crate::error::{AppError, AppResult};
use crate::policy::{normalize_key, root_max_depth, PolicyResolver, MAX_SCAN_DEPTH};
use crate::store::SnapshotStore;
use crate::types::{FolderSizeRecord, ScanProgress};

use stats::{immediate_stats, recursive_stats};

/// Shared per-partition progress, polled by the HTTP layer.
pub type ProgressMap = Arc<Mutex<HashMap<String, ScanProgress>>>;

#[derive(Debug, Default, Clone)]
pub struct ScanOutcome {
    pub directories_scanned: u64,
    pub records_written: u64,
    pub warnings: u64,
    pub cancelled: bool,
}

#[derive(Debug, Default)]
struct WalkOutcome {
    directories_scanned: u64,
    warnings: u64,
    cancelled: bool,
}

/// Why a walk stopped early.
enum WalkAbort {
    Cancelled,
    /// The persister side went away; the snapshot store rejected a batch.
    Storage,
}

/// Runs one complete scan pass for one partition: walks every enabled root
/// under the partition's policy and persists the emitted records in batches.
/// A storage failure fails the scan pass; batches already flushed remain
/// valid snapshots.
pub async fn run_partition_scan(
    store: SnapshotStore,
    cfg: PartitionConfig,
    scanner_cfg: ScannerConfig,
    progress: ProgressMap,
    cancel: CancellationToken,
    scan_id: Uuid,
) -> AppResult<ScanOutcome> {
    let partition = cfg.path.clone();
    let scan_time = Utc::now();
    store.record_scan_started(&partition, scan_id).await?;

    if let Ok(mut map) = progress.lock() {
        map.insert(partition.clone(), ScanProgress::new(&partition));
    }

    let (tx, mut rx) = mpsc::channel::<Vec<FolderSizeRecord>>(8);
    let walker_cancel = cancel.clone();
    let walker_progress = progress.clone();
    let batch_size = scanner_cfg.batch_size;
    let visited_limit = scanner_cfg.visited_limit;
    let walker = task::spawn_blocking(move || {
        walk_partition(&cfg, scan_time, batch_size, visited_limit, tx, walker_cancel, walker_progress)
    });

    let mut records_written: u64 = 0;
    let mut storage_failed = false;
    while let Some(batch) = rx.recv().await {
        if storage_failed {
            continue; // drain so the walker does not block on a full channel
        }
        match store.append_batch(&partition, &batch).await {
            Ok(()) => records_written += batch.len() as u64,
            Err(e) => {
                tracing::error!("Snapshot store rejected batch for {}: {}", partition, e);
                storage_failed = true;
                cancel.cancel();
                rx.close();
            }
        }
    }

    let walk = walker
        .await
        .map_err(|e| AppError::Scanner(format!("walker thread panicked: {}", e)))?;

    let status = if storage_failed {
        "failed"
    } else if walk.cancelled {
        "cancelled"
    } else {
        "done"
    };
    if let Ok(mut map) = progress.lock() {
        if let Some(p) = map.get_mut(&partition) {
            p.is_scanning = false;
            p.directories_scanned = walk.directories_scanned;
        }
    }

    if let Err(e) = store
        .record_scan_finished(&partition, scan_id, status, walk.directories_scanned, records_written)
        .await
    {
        // A store that already rejected a batch may reject this write too;
        // it must not mask the storage-failure report below.
        if !storage_failed {
            return Err(e);
        }
        tracing::warn!("Could not record final status for scan {}: {}", scan_id, e);
    }

    tracing::info!(
        "Scan {} for partition {} finished with status {} ({} directories, {} records, {} warnings)",
        scan_id,
        partition,
        status,
        walk.directories_scanned,
        records_written,
        walk.warnings
    );

    if storage_failed {
        return Err(AppError::Scanner(format!(
            "scan {} failed: snapshot store rejected a batch; already flushed batches remain valid",
            scan_id
        )));
    }

    Ok(ScanOutcome {
        directories_scanned: walk.directories_scanned,
        records_written,
        warnings: walk.warnings,
        cancelled: walk.cancelled,
    })
}

fn walk_partition(
    cfg: &PartitionConfig,
    scan_time: DateTime<Utc>,
    batch_size: usize,
    visited_limit: usize,
    tx: mpsc::Sender<Vec<FolderSizeRecord>>,
    cancel: CancellationToken,
    progress: ProgressMap,
) -> WalkOutcome {
    let resolver = PolicyResolver::new(cfg);
    let mut ctx = ScanContext {
        resolver: &resolver,
        partition: &cfg.path,
        scan_time,
        visited: HashSet::new(),
        visited_limit,
        batch: Vec::with_capacity(batch_size),
        batch_size,
        tx: &tx,
        cancel: &cancel,
        progress: &progress,
        directories_scanned: 0,
        warnings: 0,
    };

    let mut cancelled = false;
    for root in cfg.roots.iter().filter(|r| r.enabled) {
        let root_path = Path::new(&root.path);
        if !root_path.is_dir() {
            tracing::warn!("Root folder does not exist: {}", root.path);
            ctx.warnings += 1;
            continue;
        }
        let max_depth = root_max_depth(root, cfg);
        match ctx.visit(root_path, 0, max_depth) {
            Ok(()) => {}
            Err(WalkAbort::Cancelled) => {
                tracing::info!("Scan of partition {} cancelled", cfg.path);
                cancelled = true;
                break;
            }
            Err(WalkAbort::Storage) => {
                cancelled = true;
                break;
            }
        }
    }

    // Remaining partial batch; send failure here means the persister is
    // already gone, which the async side reports.
    let _ = ctx.flush();

    WalkOutcome { directories_scanned: ctx.directories_scanned, warnings: ctx.warnings, cancelled }
}

struct ScanContext<'a> {
    resolver: &'a PolicyResolver,
    partition: &'a str,
    scan_time: DateTime<Utc>,
    visited: HashSet<String>,
    visited_limit: usize,
    batch: Vec<FolderSizeRecord>,
    batch_size: usize,
    tx: &'a mpsc::Sender<Vec<FolderSizeRecord>>,
    cancel: &'a CancellationToken,
    progress: &'a ProgressMap,
    directories_scanned: u64,
    warnings: u64,
}

impl<'a> ScanContext<'a> {
    /// Visits one directory at `depth` below its root, with `max_depth` as
    /// the currently effective ceiling for this subtree.
    fn visit(&mut self, path: &Path, depth: u32, max_depth: u32) -> Result<(), WalkAbort> {
        if self.cancel.is_cancelled() {
            return Err(WalkAbort::Cancelled);
        }

        // Cycle/junction loop guard. Eviction past the limit trades a bit of
        // repeated work for bounded memory.
        if self.visited.len() >= self.visited_limit {
            tracing::debug!("Clearing visited-path cache ({} entries)", self.visited.len());
            self.visited.clear();
        }
        let key = normalize_key(path);
        if !self.visited.insert(key.clone()) {
            return Ok(());
        }

        let inclusion = self.resolver.find_override(&key);
        if self.resolver.is_excluded(path) && !inclusion.map(|o| o.force_include).unwrap_or(false) {
            tracing::debug!("Excluded folder: {}", path.display());
            return Ok(());
        }

        // An override re-anchors the ceiling at this node: its depth counts
        // levels below this path, so it can re-extend depth under an
        // otherwise-shallow ancestor.
        let effective_max_depth = match inclusion {
            Some(o) => depth.saturating_add(o.scan_depth).min(MAX_SCAN_DEPTH),
            None => max_depth,
        };

        self.directories_scanned += 1;
        if let Ok(mut map) = self.progress.lock() {
            if let Some(p) = map.get_mut(self.partition) {
                p.directories_scanned = self.directories_scanned;
                p.current_directory = path.to_string_lossy().to_string();
            }
        }

        let aggregate = depth >= effective_max_depth;
        let stats = if aggregate {
            recursive_stats(path, self.resolver)
        } else {
            immediate_stats(path)
        };
        let stats = match stats {
            Ok(s) => s,
            Err(e) => {
                // Isolated: zero contribution, no record, no recursion.
                self.warnings += 1;
                if e.kind() == io::ErrorKind::PermissionDenied {
                    tracing::warn!("Access denied to folder: {}", path.display());
                } else {
                    tracing::warn!("Error reading folder {}: {}", path.display(), e);
                }
                return Ok(());
            }
        };

        // Parent record before any child record, for snapshot readability
        // and the reconciliation prefix logic.
        self.emit(FolderSizeRecord {
            path: path.to_string_lossy().to_string(),
            size_bytes: stats.size_bytes as i64,
            file_count: stats.file_count as i64,
            subfolder_count: stats.subfolder_count as i64,
            scan_time: self.scan_time,
        })?;

        if !aggregate {
            match fs::read_dir(path) {
                Ok(rd) => {
                    for entry in rd.flatten() {
                        let md = match entry.metadata() {
                            Ok(m) => m,
                            Err(e) => {
                                tracing::debug!("Could not stat {}: {}", entry.path().display(), e);
                                continue;
                            }
                        };
                        if !md.is_dir() {
                            continue;
                        }
                        if is_reparse_point(&md) {
                            tracing::debug!("Skipping reparse point: {}", entry.path().display());
                            continue;
                        }
                        self.visit(&entry.path(), depth + 1, effective_max_depth)?;
                    }
                }
                Err(e) => {
                    self.warnings += 1;
                    tracing::debug!("Access denied to subfolders of {}: {}", path.display(), e);
                }
            }
        }

        Ok(())
    }

    fn emit(&mut self, record: FolderSizeRecord) -> Result<(), WalkAbort> {
        self.batch.push(record);
        if self.batch.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), WalkAbort> {
        if self.batch.is_empty() {
            return Ok(());
        }
        let mut out = Vec::with_capacity(self.batch_size);
        std::mem::swap(&mut out, &mut self.batch);
        self.tx.blocking_send(out).map_err(|_| WalkAbort::Storage)
    }
}

#[cfg(windows)]
pub(crate) fn is_reparse_point(md: &fs::Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_REPARSE_POINT: u32 = 0x400;
    (md.file_attributes() & FILE_ATTRIBUTE_REPARSE_POINT) != 0
}

#[cfg(not(windows))]
pub(crate) fn is_reparse_point(md: &fs::Metadata) -> bool {
    md.file_type().is_symlink()
}
