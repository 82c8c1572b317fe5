use sqlx::SqlitePool;

/// Initializes one per-partition snapshot database: tuning pragmas, the
/// `scans` bookkeeping table and the `folder_sizes` snapshot table.
///
/// Pragma failures are logged and tolerated; the schema itself must apply.
pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    let pragmas = [
        "PRAGMA journal_mode=WAL;",
        "PRAGMA synchronous=NORMAL;",
        "PRAGMA busy_timeout=10000;",
        "PRAGMA cache_size=-65536;",
        "PRAGMA temp_store=MEMORY;",
    ];
    for pragma in pragmas {
        if let Err(e) = sqlx::query(pragma).execute(pool).await {
            tracing::warn!("Failed to apply {}: {}", pragma, e);
        }
    }

    // One row per scan pass of this partition.
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS scans (
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL,
            started_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now')),
            finished_at TEXT NULL,
            directories_scanned INTEGER NULL,
            records_written INTEGER NULL
        )"#,
    )
    .execute(pool)
    .await?;

    // One row per path per scan timestamp. Paths are stored as walked;
    // normalization happens at query time.
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS folder_sizes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            path TEXT NOT NULL,
            size_bytes INTEGER NOT NULL,
            file_count INTEGER NOT NULL,
            subfolder_count INTEGER NOT NULL,
            scan_time TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    // (path, scan_time DESC) serves the latest-two diff lookups; the
    // scan_time index serves reconciliation's per-scan grouping.
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_folder_sizes_path_time ON folder_sizes(path, scan_time DESC)",
        "CREATE INDEX IF NOT EXISTS idx_folder_sizes_time ON folder_sizes(scan_time)",
        "CREATE INDEX IF NOT EXISTS idx_scans_started ON scans(started_at DESC)",
    ];
    for index in indexes {
        if let Err(e) = sqlx::query(index).execute(pool).await {
            tracing::warn!("Failed to create index: {} ({})", e, index);
        }
    }

    Ok(())
}
