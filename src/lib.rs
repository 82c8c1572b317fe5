//! # Baumwuchs Backend Library
//!
//! Baumwuchs periodically measures disk usage per directory across configured
//! storage partitions, keeps historical size snapshots in per-partition SQLite
//! databases and reports growth over time via a REST API.
//!
//! ## Architecture
//!
//! The application is built using:
//! - **Axum**: Modern web framework for HTTP server and routing
//! - **SQLx**: Asynchronous database operations with SQLite
//! - **Tokio**: Async runtime for concurrent operations
//! - **Serde**: Serialization/deserialization for JSON APIs
//!
//! ## Core Components
//!
//! - [`config`]: Application and per-partition scan configuration
//! - [`db`]: Database schema initialization per partition store
//! - [`error`]: Centralized error handling and HTTP error responses
//! - [`policy`]: Exclusion rules, inclusion overrides and depth resolution
//! - [`scanner`]: Depth-bounded tree walker and subtree aggregation
//! - [`store`]: Per-partition snapshot persistence
//! - [`reconcile`]: Retroactive snapshot cleanup after policy changes
//! - [`diff`]: Size deltas between the two most recent snapshots per path
//! - [`tree`]: Lazy live-filesystem child listing for override editing
//! - [`routes`]: HTTP API endpoint handlers
//! - [`state`]: Shared application state
//! - [`types`]: Data transfer objects and shared type definitions
//!
//! ## Features
//!
//! - Policy-driven scanning with a global default depth, per-root overrides
//!   and per-path inclusion overrides that can deepen or force-include
//! - Subtree aggregation once the configured depth frontier is reached
//! - Cycle-safe traversal that never recurses into reparse points
//! - Reconciliation of already persisted snapshots when the policy changes,
//!   without re-walking the filesystem
//! - Growth/shrinkage diffs between the two most recent scans per path

pub mod config;
pub mod db;
pub mod diff;
pub mod error;
pub mod policy;
pub mod reconcile;
pub mod routes;
pub mod scanner;
pub mod state;
pub mod store;
pub mod tree;
pub mod types;

#[cfg(test)]
mod tests;
