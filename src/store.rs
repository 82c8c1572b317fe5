//! Per-partition snapshot persistence.
//!
//! Each partition gets its own SQLite database file under the configured
//! data directory, so one partition's storage failure never affects
//! another's. Pools are opened lazily on first use and cached.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::SecondsFormat;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{QueryBuilder, SqlitePool};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, AppResult};
use crate::policy::normalize_key;
use crate::types::{FolderSizeRecord, ScanRow, StoredRecord};

// Respect SQLite variable limit (commonly 999). Each row consumes a fixed
// number of bound parameters; cap chunk sizes accordingly so a single
// INSERT statement never exceeds this limit.
const SQLITE_MAX_VARS: usize = 999;
const RECORD_BINDS_PER_ROW: usize = 5; // path, size_bytes, file_count, subfolder_count, scan_time

/// Size/file-count correction applied to a retained ancestor row during
/// reconciliation.
#[derive(Debug, Clone)]
pub struct RollupUpdate {
    pub id: i64,
    pub add_size: i64,
    pub add_files: i64,
}

#[derive(Clone)]
pub struct SnapshotStore {
    data_dir: PathBuf,
    pools: Arc<RwLock<HashMap<String, SqlitePool>>>,
}

impl SnapshotStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into(), pools: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// The SQLite file backing one partition's snapshots.
    pub fn db_file(&self, partition: &str) -> PathBuf {
        let sanitized: String = partition
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.data_dir.join(format!("partition-{}.db", sanitized))
    }

    async fn pool(&self, partition: &str) -> AppResult<SqlitePool> {
        let key = partition.to_lowercase();
        {
            let pools = self.pools.read().await;
            if let Some(pool) = pools.get(&key) {
                return Ok(pool.clone());
            }
        }

        let mut pools = self.pools.write().await;
        if let Some(pool) = pools.get(&key) {
            return Ok(pool.clone());
        }

        tokio::fs::create_dir_all(&self.data_dir).await?;
        let file = self.db_file(partition);
        let url = format!("sqlite://{}?mode=rwc", file.to_string_lossy().replace('\\', "/"));
        let pool = SqlitePoolOptions::new().max_connections(8).connect(&url).await?;
        db::init_db(&pool)
            .await
            .map_err(|e| AppError::Database(format!("schema init failed for {}: {}", partition, e)))?;
        pools.insert(key, pool.clone());
        Ok(pool)
    }

    pub async fn record_scan_started(&self, partition: &str, id: Uuid) -> AppResult<()> {
        let pool = self.pool(partition).await?;
        sqlx::query("INSERT INTO scans (id, status) VALUES (?1, 'running')")
            .bind(id.to_string())
            .execute(&pool)
            .await?;
        Ok(())
    }

    pub async fn record_scan_finished(
        &self,
        partition: &str,
        id: Uuid,
        status: &str,
        directories_scanned: u64,
        records_written: u64,
    ) -> AppResult<()> {
        let pool = self.pool(partition).await?;
        sqlx::query(
            r#"UPDATE scans SET
                status=?1,
                finished_at=strftime('%Y-%m-%dT%H:%M:%SZ','now'),
                directories_scanned=?2,
                records_written=?3
              WHERE id=?4"#,
        )
        .bind(status)
        .bind(directories_scanned as i64)
        .bind(records_written as i64)
        .bind(id.to_string())
        .execute(&pool)
        .await?;
        Ok(())
    }

    pub async fn list_scans(&self, partition: &str) -> AppResult<Vec<ScanRow>> {
        let pool = self.pool(partition).await?;
        let rows = sqlx::query_as::<_, ScanRow>(
            r#"SELECT id, status, started_at, finished_at, directories_scanned, records_written
               FROM scans ORDER BY started_at DESC"#,
        )
        .fetch_all(&pool)
        .await?;
        Ok(rows)
    }

    /// Appends one batch of walker records in a single transaction, chunked
    /// under the SQLite bind-variable limit.
    pub async fn append_batch(&self, partition: &str, records: &[FolderSizeRecord]) -> AppResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let pool = self.pool(partition).await?;
        let mut txdb = pool.begin().await?;

        let chunk_size = SQLITE_MAX_VARS / RECORD_BINDS_PER_ROW;
        for chunk in records.chunks(chunk_size.max(1)) {
            let mut qb = QueryBuilder::new(
                "INSERT INTO folder_sizes (path, size_bytes, file_count, subfolder_count, scan_time) ",
            );
            qb.push_values(chunk, |mut b, r| {
                b.push_bind(&r.path)
                    .push_bind(r.size_bytes)
                    .push_bind(r.file_count)
                    .push_bind(r.subfolder_count)
                    .push_bind(r.scan_time.to_rfc3339_opts(SecondsFormat::Micros, true));
            });
            qb.build().execute(&mut *txdb).await?;
        }

        txdb.commit().await?;
        Ok(())
    }

    /// All snapshot rows whose normalized path falls under `prefix`.
    ///
    /// Paths are stored as walked, so the prefix filter runs on normalized
    /// copies in memory rather than in SQL.
    pub async fn query_by_prefix(&self, partition: &str, prefix: &str) -> AppResult<Vec<StoredRecord>> {
        let pool = self.pool(partition).await?;
        let rows = sqlx::query_as::<_, StoredRecord>(
            r#"SELECT id, path, size_bytes, file_count, subfolder_count, scan_time
               FROM folder_sizes ORDER BY scan_time, path"#,
        )
        .fetch_all(&pool)
        .await?;

        let prefix_key = normalize_key(Path::new(prefix));
        Ok(rows
            .into_iter()
            .filter(|r| normalize_key(Path::new(&r.path)).starts_with(&prefix_key))
            .collect())
    }

    pub async fn distinct_paths(&self, partition: &str) -> AppResult<Vec<String>> {
        let pool = self.pool(partition).await?;
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT path FROM folder_sizes ORDER BY path")
                .fetch_all(&pool)
                .await?;
        Ok(rows.into_iter().map(|(p,)| p).collect())
    }

    /// Up to two most recent snapshots for one path, newest first.
    pub async fn latest_two(&self, partition: &str, path: &str) -> AppResult<Vec<StoredRecord>> {
        let pool = self.pool(partition).await?;
        let rows = sqlx::query_as::<_, StoredRecord>(
            r#"SELECT id, path, size_bytes, file_count, subfolder_count, scan_time
               FROM folder_sizes WHERE path=?1 ORDER BY scan_time DESC LIMIT 2"#,
        )
        .bind(path)
        .fetch_all(&pool)
        .await?;
        Ok(rows)
    }

    /// Applies one scan group's reconciliation in a single transaction:
    /// removals of over-deep rows plus rollup corrections on the retained
    /// frontier ancestors. Partial batches are never visible.
    pub async fn apply_reconciliation(
        &self,
        partition: &str,
        remove_ids: &[i64],
        updates: &[RollupUpdate],
    ) -> AppResult<()> {
        if remove_ids.is_empty() && updates.is_empty() {
            return Ok(());
        }
        let pool = self.pool(partition).await?;
        let mut txdb = pool.begin().await?;

        for chunk in remove_ids.chunks(SQLITE_MAX_VARS) {
            let mut qb = QueryBuilder::new("DELETE FROM folder_sizes WHERE id IN (");
            let mut sep = qb.separated(", ");
            for id in chunk {
                sep.push_bind(*id);
            }
            qb.push(")");
            qb.build().execute(&mut *txdb).await?;
        }

        for update in updates {
            sqlx::query(
                "UPDATE folder_sizes SET size_bytes = size_bytes + ?1, file_count = file_count + ?2 WHERE id = ?3",
            )
            .bind(update.add_size)
            .bind(update.add_files)
            .bind(update.id)
            .execute(&mut *txdb)
            .await?;
        }

        txdb.commit().await?;
        Ok(())
    }
}
