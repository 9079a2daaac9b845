//! Monitor Association - sync-entry installation and lock acquisition
//!
//! Converts a header from Empty or HasHash into HasEntry, migrating any
//! resident hash into the entry table so it survives the transition, and
//! hands out the lock object backing monitor-style locking for an object.
//!
//! Installation is serialized process-wide by the table's installation
//! lock; the retry loop here only contends with concurrent hash assignment
//! and collector mark-bit traffic on the same word.

use std::sync::atomic::{fence, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::logging::{log_event, SyncEvent};
use crate::object::header::{self, HeaderState, ObjectHeader, MAX_PAYLOAD};
use crate::object::HeapObject;
use crate::table::{LockObject, SyncTable};

/// Retry count after which a starved install CAS is logged
const CAS_WARN_THRESHOLD: usize = 100;

/// The lock object for `object`, installing a sync entry on first request
///
/// Every caller, on every thread, receives a handle to the same underlying
/// lock object for the same heap object. Fails only when the sync table is
/// exhausted, which cannot happen under normal operation.
pub fn acquire_lock_object(table: &SyncTable, object: &HeapObject) -> Result<Arc<LockObject>> {
    let target = object.header();

    // Fast path: the entry already exists. Relaxed snapshot is fine; a
    // stale miss just falls through to the locked path, which re-checks.
    if let Some(index) = header::entry_index(target.load()) {
        // Pair with the publishing CAS so the entry is visible in the table
        fence(Ordering::Acquire);
        return Ok(table.lock_object_for(index));
    }

    let index = table.allocate_entry(target, |index| install_entry(target, index, table))?;
    Ok(table.lock_object_for(index))
}

/// Install `index` into `target`
///
/// Caller contract: the table's installation lock is held, and `target`
/// does not already encode an entry index. The loop only races against
/// hash assignment and collector bits, never against another installer.
///
/// # Panics
///
/// Panics if `target` already encodes an entry index. That is a bug in the
/// allocation discipline, not a transient race: the installation lock
/// guarantees exclusivity, so a resident index means this was called twice
/// for the same object. It must never be retried or silently overwritten.
pub fn install_entry(target: &ObjectHeader, index: u32, table: &SyncTable) {
    debug_assert!(
        table.install_lock().is_locked(),
        "install_entry requires the installation lock"
    );
    debug_assert!(index != 0 && index <= MAX_PAYLOAD, "index out of range");

    let mut retries = 0usize;
    loop {
        let current = target.load_acquire();
        match header::decode(current) {
            HeaderState::Entry(existing) => {
                panic!(
                    "entry {} already installed, installation of {} invoked twice for one object",
                    existing, index
                );
            },
            HeaderState::Hash(hash) => {
                // Overwriting the payload would drop the hash; park it in
                // the entry first. Re-running this on a retry is harmless,
                // the entry is not published anywhere yet.
                table.migrate_hash(index, hash);
            },
            HeaderState::Empty => {},
        }

        match target.compare_exchange(current, header::encode_entry(current, index)) {
            Ok(_) => {
                log_event(SyncEvent::EntryInstalled { index });
                return;
            },
            Err(_) => {
                // A hash assignment or a collector bit landed in between;
                // the re-read above picks it up.
                retries += 1;
                if retries == CAS_WARN_THRESHOLD {
                    log::warn!("header CAS starved after {} retries during entry install", retries);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::hash::{hash_code_of, RandomHashSource};

    fn table() -> SyncTable {
        SyncTable::new(&SyncConfig::default())
    }

    #[test]
    fn test_acquire_installs_entry() {
        let table = table();
        let object = HeapObject::new();

        let lock = acquire_lock_object(&table, &object).unwrap();
        let _guard = lock.lock();

        let index = header::entry_index(object.header().load()).unwrap();
        assert_eq!(index, 1);
        assert_eq!(table.entry_count(), 1);
    }

    #[test]
    fn test_acquire_is_idempotent() {
        let table = table();
        let object = HeapObject::new();

        let first = acquire_lock_object(&table, &object).unwrap();
        let second = acquire_lock_object(&table, &object).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(table.entry_count(), 1);
    }

    #[test]
    fn test_install_migrates_resident_hash() {
        let table = table();
        let object = HeapObject::new();

        let hash = hash_code_of(&table, &RandomHashSource, Some(&object));
        assert_eq!(object.header().state(), HeaderState::Hash(hash));

        acquire_lock_object(&table, &object).unwrap();

        let index = header::entry_index(object.header().load()).unwrap();
        assert_eq!(table.cached_hash(index), hash);
        assert_eq!(hash, hash_code_of(&table, &RandomHashSource, Some(&object)));
    }

    #[test]
    fn test_install_preserves_collector_bits() {
        let table = table();
        let object = HeapObject::new();
        object.header().set_marked1();

        acquire_lock_object(&table, &object).unwrap();

        assert!(object.header().is_marked1());
        assert!(!object.header().is_marked0());
        assert!(matches!(object.header().state(), HeaderState::Entry(_)));
    }

    #[test]
    fn test_empty_install_leaves_entry_hash_unset() {
        let table = table();
        let object = HeapObject::new();

        acquire_lock_object(&table, &object).unwrap();

        let index = header::entry_index(object.header().load()).unwrap();
        assert_eq!(table.cached_hash(index), 0);
    }

    #[test]
    #[should_panic(expected = "invoked twice")]
    fn test_double_install_is_fatal() {
        let table = table();
        let object = HeapObject::new();

        // Drive the protocol directly, bypassing allocate_entry's re-check
        let guard = table.install_lock().lock();
        install_entry(object.header(), 1, &table);
        install_entry(object.header(), 2, &table);
        drop(guard);
    }

    #[test]
    fn test_exhausted_table_surfaces_error() {
        let table = SyncTable::new(&SyncConfig {
            initial_capacity: 1,
            max_entries: 1,
            ..Default::default()
        });

        acquire_lock_object(&table, &HeapObject::new()).unwrap();
        let err = acquire_lock_object(&table, &HeapObject::new()).unwrap_err();
        assert!(err.is_recoverable());
    }
}
