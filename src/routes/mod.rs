//! HTTP route handlers for the Baumwuchs API.
//!
//! Each sub-module covers one domain of the surface the external
//! collaborators (scheduler, report renderer, override-editing UI) use:
//!
//! - `health`: Health check and version endpoints
//! - `partitions`: Configured partition listing
//! - `scans`: Scan triggering, cancellation, history and progress
//! - `reconcile`: Retroactive snapshot cleanup after policy changes
//! - `diffs`: Size deltas for the report renderer
//! - `tree`: Live-filesystem child listing for override editing

pub mod diffs;
pub mod health;
pub mod partitions;
pub mod reconcile;
pub mod scans;
pub mod tree;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/version", get(health::version))
        .route("/partitions", get(partitions::list_partitions))
        .route("/scans", post(scans::create_scan).get(scans::list_scans))
        .route("/scans/{id}", delete(scans::cancel_scan))
        .route("/progress", get(scans::get_progress))
        .route("/reconcile", post(reconcile::run_reconcile))
        .route("/diffs", get(diffs::get_diffs))
        .route("/tree", get(tree::list_children))
        .with_state(state)
}
