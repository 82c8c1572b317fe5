//! Integration and unit tests for the Baumwuchs application.
//!
//! ## Test Modules
//!
//! - **policy_tests**: Exclusion rules, overrides and depth resolution
//! - **scanner_tests**: Tree walker, depth frontier and aggregation
//! - **reconcile_tests**: Retroactive snapshot cleanup
//! - **diff_tests**: Latest-two snapshot deltas
//! - **tree_tests**: Live child listing for override editing
//! - **config_tests**: Configuration loading and validation
//! - **api_tests**: HTTP surface
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod diff_tests;
pub mod policy_tests;
