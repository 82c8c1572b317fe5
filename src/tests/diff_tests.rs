#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use tempfile::TempDir;

    use crate::diff::latest_diffs;
    use crate::store::SnapshotStore;
    use crate::types::{FolderSizeDiff, FolderSizeRecord};

    const PARTITION: &str = "/data";

    fn record(path: &str, size: i64, at: DateTime<Utc>) -> FolderSizeRecord {
        FolderSizeRecord {
            path: path.to_string(),
            size_bytes: size,
            file_count: 0,
            subfolder_count: 0,
            scan_time: at,
        }
    }

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn diff_uses_the_two_most_recent_snapshots() {
        let data_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(data_dir.path());
        store
            .append_batch(
                PARTITION,
                &[
                    record("/data/a", 100, t(8)),
                    record("/data/a", 150, t(9)),
                    record("/data/a", 200, t(10)),
                ],
            )
            .await
            .unwrap();

        let diffs = latest_diffs(&store, PARTITION).await.unwrap();
        assert_eq!(diffs.len(), 1);
        let diff = &diffs[0];
        assert_eq!(diff.previous_size, 150); // the oldest snapshot is ignored
        assert_eq!(diff.current_size, 200);
        assert_eq!(diff.size_difference(), 50);
        assert!((diff.percentage_change() - 100.0 / 3.0).abs() < 1e-9);
        assert!(diff.previous_scan_time < diff.current_scan_time);
    }

    #[tokio::test]
    async fn paths_with_one_snapshot_are_omitted() {
        let data_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(data_dir.path());
        store
            .append_batch(
                PARTITION,
                &[
                    record("/data/a", 10, t(8)),
                    record("/data/a", 12, t(9)),
                    record("/data/new", 7, t(9)),
                ],
            )
            .await
            .unwrap();

        let diffs = latest_diffs(&store, PARTITION).await.unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "/data/a");
    }

    #[tokio::test]
    async fn shrinking_folders_report_a_negative_difference() {
        let data_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(data_dir.path());
        store
            .append_batch(
                PARTITION,
                &[record("/data/a", 400, t(8)), record("/data/a", 300, t(9))],
            )
            .await
            .unwrap();

        let diffs = latest_diffs(&store, PARTITION).await.unwrap();
        assert_eq!(diffs[0].size_difference(), -100);
        assert!((diffs[0].percentage_change() + 25.0).abs() < 1e-9);
    }

    #[test]
    fn percentage_change_from_zero_is_pinned_to_one_hundred() {
        let diff = FolderSizeDiff {
            path: "/data/a".to_string(),
            previous_size: 0,
            current_size: 4096,
            previous_scan_time: "2026-03-01T08:00:00Z".to_string(),
            current_scan_time: "2026-03-01T09:00:00Z".to_string(),
        };
        assert_eq!(diff.percentage_change(), 100.0);

        let unchanged = FolderSizeDiff { current_size: 0, ..diff };
        assert_eq!(unchanged.size_difference(), 0);
        assert_eq!(unchanged.percentage_change(), 100.0);
    }
}
