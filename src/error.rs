//! Error Module - Syncword Error Types
//!
//! The protocols themselves have no error states: lost CAS races and
//! interleavings are absorbed by their retry loops, and the one genuine
//! contract violation (installing a sync entry twice for the same object)
//! is a panic, not an error value. What remains for `SyncError` is the
//! fallible surface around the protocols: configuration validation and
//! sync-table exhaustion.

use thiserror::Error;

/// Main error type for all syncword operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid configuration
    ///
    /// **When returned:** `SyncConfig::validate` rejected a parameter
    ///
    /// **Recovery strategy:** fix the configuration or fall back to defaults
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Sync table exhausted
    ///
    /// **When returned:** every representable entry index is in use, so no
    /// lock object can be associated with another object
    ///
    /// **Recovery strategy:** raise `max_entries` (up to the payload width
    /// limit) or reduce the number of simultaneously locked objects
    #[error("Sync table exhausted: {in_use} entries in use, limit {limit}")]
    TableExhausted { in_use: usize, limit: usize },

    /// Internal error - indicates a bug in syncword
    ///
    /// **When returned:** invariant violation or unexpected state
    ///
    /// **Recovery strategy:** cannot recover - this is a bug
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SyncError::TableExhausted { .. })
    }

    /// Check if this error indicates a bug in the code
    pub fn is_bug(&self) -> bool {
        matches!(self, SyncError::Internal(_))
    }
}

/// Result type alias for syncword operations
pub type Result<T> = std::result::Result<T, SyncError>;
