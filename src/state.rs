use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{RwLock, Semaphore};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::scanner::ProgressMap;
use crate::store::SnapshotStore;

/// A handle to a running partition scan.
#[derive(Clone)]
pub struct JobHandle {
    pub id: Uuid,
    /// Cancelling this token makes the walker stop between directory
    /// visits; records already flushed remain a valid partial snapshot.
    pub cancel: CancellationToken,
}

/// The shared application state.
///
/// The jobs map is keyed by partition path and guarantees at most one scan
/// per partition in flight; overlapping triggers are rejected.
#[derive(Clone)]
pub struct AppState {
    pub store: SnapshotStore,
    pub config: Arc<AppConfig>,
    pub jobs: Arc<RwLock<HashMap<String, JobHandle>>>,
    pub progress: ProgressMap,
    /// Bounds how many partitions scan in parallel.
    pub scan_slots: Arc<Semaphore>,
}

impl AppState {
    pub fn new(store: SnapshotStore, config: AppConfig) -> Self {
        let slots = config
            .scanner
            .partition_concurrency
            .unwrap_or_else(|| num_cpus::get().max(1));
        Self {
            store,
            config: Arc::new(config),
            jobs: Arc::new(RwLock::new(HashMap::new())),
            progress: Arc::new(Mutex::new(HashMap::new())),
            scan_slots: Arc::new(Semaphore::new(slots.max(1))),
        }
    }
}
