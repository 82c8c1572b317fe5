use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One per-path, per-scan size measurement produced by the tree walker.
///
/// `path` is kept as walked (not normalized) to preserve the scanned casing
/// and separators; all policy comparisons happen on normalized copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderSizeRecord {
    pub path: String,
    pub size_bytes: i64,
    /// Direct files only, except when this record aggregates a whole
    /// subtree at the depth frontier.
    pub file_count: i64,
    /// Direct child directories only, even for aggregated records.
    pub subfolder_count: i64,
    pub scan_time: DateTime<Utc>,
}

/// A persisted snapshot row, including its store-assigned id.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoredRecord {
    pub id: i64,
    pub path: String,
    pub size_bytes: i64,
    pub file_count: i64,
    pub subfolder_count: i64,
    /// RFC 3339 UTC timestamp; lexicographic order equals chronological order.
    pub scan_time: String,
}

/// Size delta between the two most recent snapshots of one path.
/// Derived, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderSizeDiff {
    pub path: String,
    pub previous_size: i64,
    pub current_size: i64,
    pub previous_scan_time: String,
    pub current_scan_time: String,
}

impl FolderSizeDiff {
    pub fn size_difference(&self) -> i64 {
        self.current_size - self.previous_size
    }

    /// 100 when the previous size is zero, avoiding division by zero.
    pub fn percentage_change(&self) -> f64 {
        if self.previous_size == 0 {
            100.0
        } else {
            (self.size_difference() as f64 / self.previous_size as f64) * 100.0
        }
    }
}

/// Diff plus its derived values, for the report renderer.
#[derive(Debug, Clone, Serialize)]
pub struct DiffReportEntry {
    pub path: String,
    pub previous_size: i64,
    pub current_size: i64,
    pub size_difference: i64,
    pub percentage_change: f64,
    pub previous_scan_time: String,
    pub current_scan_time: String,
}

impl From<&FolderSizeDiff> for DiffReportEntry {
    fn from(diff: &FolderSizeDiff) -> Self {
        Self {
            path: diff.path.clone(),
            previous_size: diff.previous_size,
            current_size: diff.current_size,
            size_difference: diff.size_difference(),
            percentage_change: diff.percentage_change(),
            previous_scan_time: diff.previous_scan_time.clone(),
            current_scan_time: diff.current_scan_time.clone(),
        }
    }
}

/// Live progress of one partition scan, for observability polling.
#[derive(Debug, Clone, Serialize)]
pub struct ScanProgress {
    pub partition: String,
    pub directories_scanned: u64,
    pub current_directory: String,
    pub started_at: DateTime<Utc>,
    pub is_scanning: bool,
}

impl ScanProgress {
    pub fn new(partition: &str) -> Self {
        Self {
            partition: partition.to_string(),
            directories_scanned: 0,
            current_directory: String::new(),
            started_at: Utc::now(),
            is_scanning: true,
        }
    }

    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }
}

/// Progress snapshot with the elapsed time materialized at read time.
#[derive(Debug, Clone, Serialize)]
pub struct ScanProgressView {
    pub partition: String,
    pub directories_scanned: u64,
    pub current_directory: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: i64,
    pub is_scanning: bool,
}

impl From<&ScanProgress> for ScanProgressView {
    fn from(p: &ScanProgress) -> Self {
        Self {
            partition: p.partition.clone(),
            directories_scanned: p.directories_scanned,
            current_directory: p.current_directory.clone(),
            started_at: p.started_at,
            elapsed_ms: p.elapsed_ms(),
            is_scanning: p.is_scanning,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateScanRequest {
    /// Scan only this partition; omit to scan all enabled partitions.
    pub partition: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartedScan {
    pub id: Uuid,
    pub partition: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateScanResponse {
    pub scans: Vec<StartedScan>,
}

/// Bookkeeping row for one scan pass of one partition.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ScanRow {
    pub id: String,
    pub status: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub directories_scanned: Option<i64>,
    pub records_written: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReconcileRequest {
    /// Reconcile only this partition; omit for all enabled partitions.
    pub partition: Option<String>,
}

/// Node of the live-filesystem browse tree used for editing inclusion
/// overrides interactively.
#[derive(Debug, Clone, Serialize)]
pub struct FolderTreeNode {
    pub path: String,
    pub name: String,
    pub has_children: bool,
    /// Configured inclusion-override depth for this exact path, if any.
    pub override_depth: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartitionInfo {
    pub path: String,
    pub enabled: bool,
    pub default_scan_depth: Option<u32>,
    pub root_count: usize,
    pub exclusion_count: usize,
    pub override_count: usize,
}
