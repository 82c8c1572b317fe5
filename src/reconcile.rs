//! Retroactive snapshot reconciliation.
//!
//! After a policy change (depth reduced, exclusion added, override removed)
//! this brings previously persisted snapshots in line with the current
//! policy without re-walking the filesystem: rows deeper than the policy
//! allows are removed and their sizes rolled up into the retained ancestor
//! at the frontier. Scan timestamps are processed independently; records
//! from different scans are never mixed.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Serialize;

use crate::config::PartitionConfig;
use crate::error::AppResult;
use crate::policy::{depth_below, normalize_key, MAX_SCAN_DEPTH};
use crate::store::{RollupUpdate, SnapshotStore};
use crate::types::StoredRecord;

#[derive(Debug, Default, Clone, Serialize)]
pub struct ReconcileResult {
    pub partition: String,
    pub total_removed: u64,
    pub removed_paths: Vec<String>,
    pub updated_paths: Vec<String>,
}

/// Controlling path (case-folded, normalized) with its allowed depth.
/// Sorted longest-first so the most specific prefix wins when a root-level
/// rule and a narrower override both match.
fn depth_entries(cfg: &PartitionConfig) -> Vec<(String, u32)> {
    let mut entries: Vec<(String, u32)> = Vec::new();

    for ov in cfg.overrides.iter().filter(|o| o.enabled) {
        let key = normalize_key(Path::new(&ov.path));
        if !entries.iter().any(|(k, _)| *k == key) {
            entries.push((key, ov.scan_depth.min(MAX_SCAN_DEPTH)));
        }
    }
    for root in cfg.roots.iter().filter(|r| r.enabled) {
        let key = normalize_key(Path::new(&root.path));
        if !entries.iter().any(|(k, _)| *k == key) {
            let depth = root
                .max_depth
                .or(cfg.default_scan_depth)
                .unwrap_or(MAX_SCAN_DEPTH)
                .min(MAX_SCAN_DEPTH);
            entries.push((key, depth));
        }
    }

    entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
    entries
}

/// Reconciles every persisted scan of one partition against its current
/// policy. Removals and rollup updates for one scan timestamp are applied
/// in one transaction. Running this twice in a row with an unchanged policy
/// removes nothing the second time.
pub async fn reconcile_partition(
    store: &SnapshotStore,
    cfg: &PartitionConfig,
) -> AppResult<ReconcileResult> {
    let mut result = ReconcileResult { partition: cfg.path.clone(), ..Default::default() };

    let entries = depth_entries(cfg);
    if entries.is_empty() {
        return Ok(result);
    }

    let records = store.query_by_prefix(&cfg.path, &cfg.path).await?;

    // Group by scan timestamp; BTreeMap keeps processing order deterministic.
    let mut scan_groups: BTreeMap<&str, Vec<&StoredRecord>> = BTreeMap::new();
    for record in &records {
        scan_groups.entry(record.scan_time.as_str()).or_default().push(record);
    }

    for (scan_time, group) in scan_groups {
        let mut remove: Vec<&StoredRecord> = Vec::new();
        // rollup target key -> (added size, added files)
        let mut rollups: HashMap<String, (i64, i64)> = HashMap::new();

        for record in &group {
            let key = normalize_key(Path::new(&record.path));
            let controlling = entries.iter().find(|(prefix, _)| key.starts_with(prefix.as_str()));
            let Some((prefix, allowed)) = controlling else {
                continue;
            };

            let record_depth = depth_below(prefix, &key);
            if record_depth <= *allowed {
                continue;
            }

            remove.push(record);

            // Ancestor at exactly the allowed depth receives this row's
            // contribution. Each removed row carries either its own
            // immediate stats or an old-frontier aggregate, so the sum
            // reconstructs the subtree total without double counting.
            // A bare "/" normalizes to one segment, not the two its split yields.
            let controlling_segments = if prefix == "/" { 1 } else { prefix.split('/').count() };
            let target: String = key
                .split('/')
                .take(controlling_segments + *allowed as usize)
                .collect::<Vec<_>>()
                .join("/");
            let slot = rollups.entry(target).or_insert((0, 0));
            slot.0 += record.size_bytes;
            slot.1 += record.file_count;
        }

        if remove.is_empty() {
            continue;
        }

        let removed_ids: Vec<i64> = remove.iter().map(|r| r.id).collect();
        let mut updates: Vec<RollupUpdate> = Vec::new();
        let mut updated_paths: Vec<String> = Vec::new();
        for (target, (add_size, add_files)) in rollups {
            let retained = group.iter().find(|r| {
                !removed_ids.contains(&r.id) && normalize_key(Path::new(&r.path)) == target
            });
            if let Some(ancestor) = retained {
                updates.push(RollupUpdate { id: ancestor.id, add_size, add_files });
                updated_paths.push(ancestor.path.clone());
            } else {
                tracing::debug!("No retained ancestor at {} for rollup of scan {}", target, scan_time);
            }
        }

        tracing::info!(
            "Removing {} entries from scan {} of partition {}",
            remove.len(),
            scan_time,
            cfg.path
        );
        store.apply_reconciliation(&cfg.path, &removed_ids, &updates).await?;

        result.total_removed += remove.len() as u64;
        result.removed_paths.extend(remove.iter().map(|r| r.path.clone()));
        result.updated_paths.extend(updated_paths);
    }

    Ok(result)
}
