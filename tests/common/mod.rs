//! Test Utilities for the Syncword Test Suite
//!
//! Shared fixtures and strict assertion helpers. Assertions carry enough
//! context to diagnose a failure from the message alone.

use std::collections::HashSet;
use std::sync::Arc;
use syncword::{SyncConfig, SyncContext};

/// Threads used in race tests
pub const THREAD_COUNT: usize = 8;

/// Per-thread iterations in stress loops
pub const ITERATIONS: usize = 200;

/// Test fixture wrapping a fresh, independent sync context
pub struct SyncFixture {
    pub ctx: Arc<SyncContext>,
}

impl SyncFixture {
    /// Create fixture with default configuration
    pub fn with_defaults() -> Self {
        let ctx = SyncContext::new(SyncConfig::default())
            .expect("context creation should succeed with valid config");
        Self { ctx: Arc::new(ctx) }
    }

    /// Create fixture with a bounded entry table
    pub fn with_entry_limit(max_entries: usize) -> Self {
        let config = SyncConfig {
            initial_capacity: max_entries.min(16).max(1),
            max_entries,
            ..Default::default()
        };
        let ctx = SyncContext::new(config)
            .expect("context creation should succeed with valid entry limit");
        Self { ctx: Arc::new(ctx) }
    }
}

/// Assert every observed value is identical and nonzero
///
/// The race-convergence property: no thread may ever observe a value that
/// differs from the value all other threads observe.
pub fn assert_converged(values: &[u32], what: &str) {
    assert!(!values.is_empty(), "no {} values observed", what);
    let distinct: HashSet<u32> = values.iter().copied().collect();
    assert_eq!(
        distinct.len(),
        1,
        "{} did not converge: observed {} distinct values {:?}",
        what,
        distinct.len(),
        distinct
    );
    assert_ne!(values[0], 0, "{} converged on the reserved value 0", what);
}

/// Assert all values are pairwise distinct
pub fn assert_all_unique(values: &[u32], what: &str) {
    let distinct: HashSet<u32> = values.iter().copied().collect();
    assert_eq!(
        distinct.len(),
        values.len(),
        "{} collided: {} values, {} distinct",
        what,
        values.len(),
        distinct.len()
    );
}
