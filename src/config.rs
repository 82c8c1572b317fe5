use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the per-partition SQLite database files.
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    /// Records accumulated before a batch is flushed to the snapshot store.
    pub batch_size: usize,
    /// Visited-path set entries kept before the cycle guard is cleared.
    pub visited_limit: usize,
    /// Maximum number of partitions scanned in parallel.
    pub partition_concurrency: Option<usize>,
}

/// How an exclusion rule's pattern is matched against a normalized path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionKind {
    /// Exact match against the whole normalized path.
    ExactPath,
    /// Prefix match against the normalized path. No separator-boundary
    /// check: `/data/log` also matches `/data/logs`.
    PathPrefix,
    /// Exact match against the final path component, at any depth.
    FolderName,
    /// `*`/`?` wildcard, anchored over the whole path.
    Wildcard,
    /// Unanchored regular expression.
    Regex,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExclusionRule {
    pub pattern: String,
    pub kind: ExclusionKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Re-includes a specific path that exclusion rules would skip, and/or
/// deepens the scan below it. `scan_depth` counts levels below the named
/// path, independent of the depth already consumed reaching it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InclusionOverride {
    pub path: String,
    pub scan_depth: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub force_include: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootFolder {
    pub path: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Overrides the partition's default scan depth for this root only.
    pub max_depth: Option<u32>,
}

/// Scan policy for one partition. Read-only for the core; the reconciliation
/// engine exists because this can change between scans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionConfig {
    pub path: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// `None` means unbounded (clamped to the hard depth ceiling).
    pub default_scan_depth: Option<u32>,
    #[serde(default)]
    pub roots: Vec<RootFolder>,
    #[serde(default)]
    pub exclusions: Vec<ExclusionRule>,
    #[serde(default)]
    pub overrides: Vec<InclusionOverride>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub partitions: Vec<PartitionConfig>,
}

impl AppConfig {
    pub fn find_partition(&self, path: &str) -> Option<&PartitionConfig> {
        self.partitions.iter().find(|p| p.path.eq_ignore_ascii_case(path))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        let defaults: &str = include_str!("../config/default.toml");
        match ::config::Config::builder()
            .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
            .build()
        {
            Ok(cfg) => match cfg.try_deserialize() {
                Ok(app_cfg) => app_cfg,
                Err(e) => {
                    eprintln!("FATAL: Failed to deserialize default config: {}", e);
                    panic!("Failed to deserialize default config: {}", e);
                }
            },
            Err(e) => {
                eprintln!("FATAL: Failed to parse default config: {}", e);
                panic!("Failed to parse default config: {}", e);
            }
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        // Mirror defaults from config/default.toml
        Self { batch_size: 1000, visited_limit: 10000, partition_concurrency: None }
    }
}

fn default_true() -> bool {
    true
}

pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();

    let defaults: &str = include_str!("../config/default.toml");
    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
        // Optional local file: baumwuchs.toml (in CWD)
        .add_source(::config::File::with_name("baumwuchs").required(false));

    if let Ok(custom_path) = std::env::var("BAUMWUCHS_CONFIG") {
        builder = builder.add_source(::config::File::with_name(&custom_path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(::config::Environment::with_prefix("BAUMWUCHS").separator("__"));

    let cfg = builder.build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

pub fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    // Server
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }

    // Storage
    if cfg.storage.data_dir.trim().is_empty() {
        return Err(anyhow::anyhow!("storage.data_dir must not be empty"));
    }

    // Scanner
    if cfg.scanner.batch_size == 0 {
        return Err(anyhow::anyhow!("scanner.batch_size must be > 0"));
    }
    if cfg.scanner.visited_limit == 0 {
        return Err(anyhow::anyhow!("scanner.visited_limit must be > 0"));
    }
    if let Some(pc) = cfg.scanner.partition_concurrency {
        if pc == 0 || pc > 64 {
            return Err(anyhow::anyhow!("scanner.partition_concurrency must be in 1..=64"));
        }
    }

    // Partitions
    for partition in &cfg.partitions {
        if partition.path.trim().is_empty() {
            return Err(anyhow::anyhow!("partition path must not be empty"));
        }
        let dup = cfg
            .partitions
            .iter()
            .filter(|p| p.path.eq_ignore_ascii_case(&partition.path))
            .count();
        if dup > 1 {
            return Err(anyhow::anyhow!("duplicate partition path: {}", partition.path));
        }
        for root in &partition.roots {
            if root.path.trim().is_empty() {
                return Err(anyhow::anyhow!(
                    "partition {}: root folder path must not be empty",
                    partition.path
                ));
            }
        }
        for rule in &partition.exclusions {
            if rule.pattern.trim().is_empty() {
                return Err(anyhow::anyhow!(
                    "partition {}: exclusion pattern must not be empty",
                    partition.path
                ));
            }
        }
        for ov in &partition.overrides {
            if ov.path.trim().is_empty() {
                return Err(anyhow::anyhow!(
                    "partition {}: inclusion override path must not be empty",
                    partition.path
                ));
            }
        }
    }

    Ok(())
}

pub fn ensure_data_dir(data_dir: &str) -> anyhow::Result<()> {
    let p = Path::new(data_dir);
    std::fs::create_dir_all(p)?;
    Ok(())
}
