//! Growth/shrinkage deltas between the two most recent snapshots per path.

use crate::error::AppResult;
use crate::store::SnapshotStore;
use crate::types::FolderSizeDiff;

/// One diff per distinct path that has at least two snapshots; paths with a
/// single snapshot are omitted entirely, not reported as zero.
pub async fn latest_diffs(store: &SnapshotStore, partition: &str) -> AppResult<Vec<FolderSizeDiff>> {
    let mut diffs = Vec::new();

    for path in store.distinct_paths(partition).await? {
        let recent = store.latest_two(partition, &path).await?;
        if recent.len() == 2 {
            diffs.push(FolderSizeDiff {
                path,
                current_size: recent[0].size_bytes,
                previous_size: recent[1].size_bytes,
                current_scan_time: recent[0].scan_time.clone(),
                previous_scan_time: recent[1].scan_time.clone(),
            });
        }
    }

    Ok(diffs)
}
