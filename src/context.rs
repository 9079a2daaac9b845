//! Sync Context - explicit wiring of the sync collaborators
//!
//! One `SyncContext` owns the entry table and the hash source and exposes
//! the two public operations. There is deliberately no process-wide
//! singleton: callers hold the context and pass it where it is needed, so
//! tests and embedders can run any number of independent sync domains.

use std::sync::Arc;

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::hash::{self, RandomHashSource, RawHashSource};
use crate::logging::{configure_logger, LogLevel, SyncLoggerConfig};
use crate::monitor;
use crate::object::HeapObject;
use crate::table::{LockObject, SyncTable};

/// The sync subsystem for one heap
///
/// # Examples
///
/// ```rust
/// use syncword::{HeapObject, SyncConfig, SyncContext};
///
/// fn main() -> Result<(), syncword::SyncError> {
///     let ctx = SyncContext::new(SyncConfig::default())?;
///     let object = HeapObject::new();
///
///     let hash = ctx.hash_code_of(Some(&object));
///     assert_ne!(hash, 0);
///
///     let lock = ctx.acquire_lock_object(&object)?;
///     let _guard = lock.lock();
///
///     // The hash survived the entry installation
///     assert_eq!(hash, ctx.hash_code_of(Some(&object)));
///     Ok(())
/// }
/// ```
pub struct SyncContext {
    config: SyncConfig,
    table: SyncTable,
    source: Box<dyn RawHashSource>,
}

impl SyncContext {
    /// Create a context with the default random hash source
    pub fn new(config: SyncConfig) -> Result<Self> {
        Self::with_source(config, Box::new(RandomHashSource))
    }

    /// Create a context with a caller-provided hash source
    pub fn with_source(config: SyncConfig, source: Box<dyn RawHashSource>) -> Result<Self> {
        config
            .validate()
            .map_err(|e| SyncError::Configuration(e.to_string()))?;

        if config.verbose {
            configure_logger(SyncLoggerConfig {
                level: LogLevel::Trace,
                ..Default::default()
            });
        }

        Ok(Self {
            table: SyncTable::new(&config),
            source,
            config,
        })
    }

    /// The identity hash code of `object`; 0 only for `None`
    ///
    /// Total, never fails, idempotent across threads: the first assigned
    /// value is the value forever.
    pub fn hash_code_of(&self, object: Option<&HeapObject>) -> u32 {
        hash::hash_code_of(&self.table, self.source.as_ref(), object)
    }

    /// The lock object backing monitor-style locking for `object`
    ///
    /// Installs a sync entry on first request; all callers receive handles
    /// to the same underlying lock. Fails only on table exhaustion.
    pub fn acquire_lock_object(&self, object: &HeapObject) -> Result<Arc<LockObject>> {
        monitor::acquire_lock_object(&self.table, object)
    }

    /// The entry table collaborator
    pub fn table(&self) -> &SyncTable {
        &self.table
    }

    /// The configuration this context was built with
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }
}

impl std::fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncContext")
            .field("table", &self.table)
            .finish()
    }
}
