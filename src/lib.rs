//! # Syncword - Object Header Hash & Monitor Association
//!
//! Syncword packs two mutually-exclusive pieces of per-object metadata into
//! the single 32-bit header word every GC-managed object carries: a
//! lazily-computed identity hash code, or an index into a table of
//! synchronization entries backing monitor-style locking. Both protocols
//! mutate the word only through whole-word compare-and-swap, so the
//! collector's bits in the same word are never torn and no observed hash
//! or entry index is ever lost.
//!
//! ## Header Word Layout
//!
//! ```text
//! 32-bit Header Word:
//! ┌──────┬──────┬─────────┬──────┬──────────────────────────────┐
//! │  M1  │  M0  │ unused  │ Hash │          Payload             │
//! │  31  │  30  │  29-27  │  26  │           25-0               │
//! └──────┴──────┴─────────┴──────┴──────────────────────────────┘
//!
//! States:
//! - Empty:    Hash flag clear, payload 0
//! - HasHash:  Hash flag set, payload = identity hash (nonzero)
//! - HasEntry: Hash flag clear, payload = 1-based entry index (nonzero)
//! ```
//!
//! Bits 27-31 belong to the collector; syncword carries them verbatim
//! through every update and never interprets them.
//!
//! ## Quick Start
//!
//! ```rust
//! use syncword::{HeapObject, SyncConfig, SyncContext};
//!
//! fn main() -> Result<(), syncword::SyncError> {
//!     let ctx = SyncContext::new(SyncConfig::default())?;
//!     let object = HeapObject::new();
//!
//!     // Lazily assigned, stable forever
//!     let hash = ctx.hash_code_of(Some(&object));
//!     assert_eq!(hash, ctx.hash_code_of(Some(&object)));
//!
//!     // Monitor lock for the object; repeated calls return the same lock
//!     let lock = ctx.acquire_lock_object(&object)?;
//!     {
//!         let _guard = lock.lock();
//!         // critical section
//!     }
//!
//!     // Installing the entry migrated the hash, it is never lost
//!     assert_eq!(hash, ctx.hash_code_of(Some(&object)));
//!     Ok(())
//! }
//! ```
//!
//! ## State Transitions
//!
//! ```text
//! Empty ──hash_code_of──────────> HasHash
//! Empty ──acquire_lock_object───> HasEntry
//! HasHash ──acquire_lock_object─> HasEntry   (hash migrated into entry)
//! HasEntry ─────────────────────> (terminal)
//! ```
//!
//! Once any thread observes a hash or an entry index for an object, that
//! value is permanent. Hash assignment is lock-free; entry installation is
//! serialized by the table's single installation lock.
//!
//! ## Thread Safety
//!
//! - `SyncContext`, `SyncTable` and `HeapObject` are `Send + Sync`
//! - All public operations may run concurrently on the same object from
//!   any number of threads with no external synchronization
//! - Installing a sync entry twice for one object is a fatal programming
//!   error (panic), never a silently resolved race
//!
//! ## Modules
//!
//! - [`config`]: sync subsystem parameters and validation
//! - [`context`]: the explicit collaborator wiring, `SyncContext`
//! - [`error`]: error types
//! - [`hash`]: the lock-free identity hash assignment protocol
//! - [`logging`]: structured sync event logging
//! - [`monitor`]: sync-entry installation and lock acquisition
//! - [`object`]: the object model and header word codec
//! - [`table`]: the sync entry table and lock objects

pub mod config;
pub mod context;
pub mod error;
pub mod hash;
pub mod logging;
pub mod monitor;
pub mod object;
pub mod table;

// Re-export main types for convenience
pub use config::SyncConfig;
pub use context::SyncContext;
pub use error::{Result, SyncError};
pub use hash::{RandomHashSource, RawHashSource};
pub use object::{HeaderState, HeapObject, ObjectHeader};
pub use table::{LockObject, SyncEntry, SyncTable};

/// Syncword version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize syncword with default configuration
///
/// # Examples
///
/// ```rust
/// let ctx = syncword::init()?;
/// let object = syncword::HeapObject::new();
/// assert_ne!(ctx.hash_code_of(Some(&object)), 0);
/// # Ok::<(), syncword::SyncError>(())
/// ```
pub fn init() -> Result<SyncContext> {
    SyncContext::new(SyncConfig::default())
}

/// Initialize syncword with custom configuration
pub fn init_with_config(config: SyncConfig) -> Result<SyncContext> {
    SyncContext::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_default() {
        let result = init();
        assert!(result.is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = SyncConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_version_not_empty() {
        assert!(!VERSION.is_empty());
    }
}
