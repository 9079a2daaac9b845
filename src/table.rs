//! Sync Entry Table - per-object synchronization entries
//!
//! Owns the entries referenced by header words in the HasEntry state, and
//! the single process-wide installation lock that serializes every
//! entry-index installation. Entries are reached only through their 1-based
//! index; slot 0 is a reserved placeholder so index 0 can mean "absent"
//! in the header payload.
//!
//! The table is grow-only: an entry is never reused while a header still
//! points at it, and reclamation of entries for dead objects is the
//! collector's problem, not this crate's.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::logging::{log_event, SyncEvent};
use crate::object::header::{self, ObjectHeader};

/// The lock object backing monitor-style locking for one heap object
///
/// Handles are compared by identity (`Arc::ptr_eq`): every caller asking
/// for the lock of the same object receives the same underlying object.
/// Wait/notify queueing is out of scope; this is the mutual-exclusion
/// handle only.
pub struct LockObject {
    mutex: Mutex<()>,
}

impl LockObject {
    fn new() -> Self {
        Self {
            mutex: Mutex::new(()),
        }
    }

    /// Block until the lock is held
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.mutex.lock()
    }

    /// Try to take the lock without blocking
    pub fn try_lock(&self) -> Option<MutexGuard<'_, ()>> {
        self.mutex.try_lock()
    }

    /// Check whether any thread currently holds the lock
    pub fn is_locked(&self) -> bool {
        self.mutex.is_locked()
    }
}

impl std::fmt::Debug for LockObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockObject")
            .field("locked", &self.is_locked())
            .finish()
    }
}

/// One sync-table entry: the cached identity hash (0 = unset) and the
/// lazily created lock object for one specific heap object
#[derive(Debug)]
pub struct SyncEntry {
    hash: AtomicU32,
    lock: Mutex<Option<Arc<LockObject>>>,
}

impl SyncEntry {
    fn new() -> Self {
        Self {
            hash: AtomicU32::new(0),
            lock: Mutex::new(None),
        }
    }

    /// The cached hash code, 0 if none has been stored yet
    pub fn cached_hash(&self) -> u32 {
        self.hash.load(Ordering::Acquire)
    }

    /// Store `candidate` if no hash is cached yet; returns the value now
    /// stored, whether just-set or pre-existing
    pub fn set_hash_if_unset(&self, candidate: u32) -> u32 {
        debug_assert!(candidate != 0, "hash code 0 is reserved for 'absent'");
        match self
            .hash
            .compare_exchange(0, candidate, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => candidate,
            Err(existing) => existing,
        }
    }

    /// Unconditional store, used only during installation while the
    /// installation lock is held
    fn store_hash(&self, hash: u32) {
        self.hash.store(hash, Ordering::Release);
    }

    /// Fetch the lock object, creating it on first request.
    /// The bool reports whether this call created it.
    pub(crate) fn lock_object(&self) -> (Arc<LockObject>, bool) {
        let mut slot = self.lock.lock();
        match &*slot {
            Some(lock) => (Arc::clone(lock), false),
            None => {
                let lock = Arc::new(LockObject::new());
                *slot = Some(Arc::clone(&lock));
                (lock, true)
            },
        }
    }
}

/// The process-wide sync entry table
pub struct SyncTable {
    /// Entries indexed by the 1-based index stored in header payloads.
    /// Slot 0 holds a reserved placeholder and is never handed out.
    entries: RwLock<Vec<Arc<SyncEntry>>>,

    /// Serializes every entry-index installation in the process
    install_lock: Mutex<()>,

    /// Hard limit on live entries (validated to fit the payload field)
    max_entries: usize,
}

impl SyncTable {
    /// Create a table sized per `config`
    pub fn new(config: &SyncConfig) -> Self {
        let mut entries = Vec::with_capacity(config.initial_capacity + 1);
        entries.push(Arc::new(SyncEntry::new())); // reserved slot 0

        Self {
            entries: RwLock::new(entries),
            install_lock: Mutex::new(()),
            max_entries: config.max_entries.min(header::MAX_PAYLOAD as usize),
        }
    }

    /// Number of live entries (excludes the reserved slot 0)
    pub fn entry_count(&self) -> usize {
        self.entries.read().len() - 1
    }

    /// The configured entry limit
    pub fn entry_limit(&self) -> usize {
        self.max_entries
    }

    /// The installation lock
    ///
    /// Exposed so the installation protocol can assert its precondition,
    /// and so tests can drive the protocol directly.
    pub fn install_lock(&self) -> &Mutex<()> {
        &self.install_lock
    }

    /// Look up an entry by index
    ///
    /// Panics on an index the table never handed out; a header can only
    /// hold such an index through corruption or a codec bug.
    fn entry(&self, index: u32) -> Arc<SyncEntry> {
        let entries = self.entries.read();
        assert!(
            (index as usize) < entries.len() && index != 0,
            "entry index {} not allocated by this table",
            index
        );
        Arc::clone(&entries[index as usize])
    }

    /// Cached hash for `index`, 0 if unset
    pub fn cached_hash(&self, index: u32) -> u32 {
        self.entry(index).cached_hash()
    }

    /// Store `candidate` as the hash for `index` unless one exists;
    /// returns the value now stored
    pub fn set_hash_if_unset(&self, index: u32, candidate: u32) -> u32 {
        self.entry(index).set_hash_if_unset(candidate)
    }

    /// Move a header-resident hash into the entry for `index`
    ///
    /// Called by the installation protocol just before it overwrites the
    /// header payload, so the hash survives the HasHash -> HasEntry
    /// transition. The caller holds the installation lock, which is what
    /// makes the unconditional store safe: the index is not published in
    /// any header yet, so no other writer can race this store.
    pub fn migrate_hash(&self, index: u32, hash: u32) {
        debug_assert!(
            self.install_lock.is_locked(),
            "migrate_hash requires the installation lock"
        );
        self.entry(index).store_hash(hash);
        log_event(SyncEvent::HashMigrated { index, hash });
    }

    /// Lock object for `index`, created lazily on first request
    pub fn lock_object_for(&self, index: u32) -> Arc<LockObject> {
        let entry = self.entry(index);
        let (lock, created) = entry.lock_object();
        if created {
            log_event(SyncEvent::LockCreated { index });
        }
        lock
    }

    /// Allocate a fresh entry for the object owning `target` and install
    /// its index via `install`, all under the installation lock
    ///
    /// If another thread completed an installation for the same header
    /// between the caller's fast-path check and our lock acquisition, that
    /// existing index is returned and nothing is allocated or installed.
    pub fn allocate_entry<F>(&self, target: &ObjectHeader, install: F) -> Result<u32>
    where
        F: FnOnce(u32),
    {
        let _guard = self.install_lock.lock();

        // Re-check under the lock: losing the fast-path race is expected,
        // installing twice is not.
        if let Some(existing) = header::entry_index(target.load_acquire()) {
            return Ok(existing);
        }

        let (index, in_use) = {
            let mut entries = self.entries.write();
            let in_use = entries.len() - 1;
            if in_use >= self.max_entries {
                return Err(SyncError::TableExhausted {
                    in_use,
                    limit: self.max_entries,
                });
            }
            entries.push(Arc::new(SyncEntry::new()));
            ((entries.len() - 1) as u32, in_use + 1)
        };

        log_event(SyncEvent::EntryAllocated { index, in_use });
        install(index);
        Ok(index)
    }

    /// Emit a table statistics event
    pub fn log_stats(&self) {
        log_event(SyncEvent::TableStats {
            in_use: self.entry_count(),
            limit: self.max_entries,
        });
    }
}

impl std::fmt::Debug for SyncTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncTable")
            .field("entries", &self.entry_count())
            .field("limit", &self.max_entries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::header::encode_entry;

    fn small_table() -> SyncTable {
        SyncTable::new(&SyncConfig {
            initial_capacity: 2,
            max_entries: 4,
            ..Default::default()
        })
    }

    #[test]
    fn test_allocation_starts_at_index_one() {
        let table = small_table();
        let header = ObjectHeader::new();

        let index = table.allocate_entry(&header, |_| {}).unwrap();
        assert_eq!(index, 1);
        assert_eq!(table.entry_count(), 1);
    }

    #[test]
    fn test_allocate_invokes_callback_under_lock() {
        let table = small_table();
        let header = ObjectHeader::new();

        table
            .allocate_entry(&header, |index| {
                assert_eq!(index, 1);
                assert!(table.install_lock().is_locked());
            })
            .unwrap();
    }

    #[test]
    fn test_allocate_returns_existing_index_without_installing() {
        let table = small_table();
        // Header already points at entry 1
        let header = ObjectHeader::from_raw(encode_entry(0, 1));
        table.allocate_entry(&ObjectHeader::new(), |_| {}).unwrap();

        let index = table
            .allocate_entry(&header, |_| panic!("must not install twice"))
            .unwrap();

        assert_eq!(index, 1);
        assert_eq!(table.entry_count(), 1);
    }

    #[test]
    fn test_exhaustion() {
        let table = small_table();

        for _ in 0..4 {
            table.allocate_entry(&ObjectHeader::new(), |_| {}).unwrap();
        }

        let err = table
            .allocate_entry(&ObjectHeader::new(), |_| {})
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::TableExhausted { in_use: 4, limit: 4 }
        ));
    }

    #[test]
    fn test_set_hash_if_unset_resolves_race() {
        let table = small_table();
        let index = table.allocate_entry(&ObjectHeader::new(), |_| {}).unwrap();

        assert_eq!(table.cached_hash(index), 0);
        assert_eq!(table.set_hash_if_unset(index, 7), 7);
        // The loser gets the winner's value, not its own candidate
        assert_eq!(table.set_hash_if_unset(index, 9), 7);
        assert_eq!(table.cached_hash(index), 7);
    }

    #[test]
    fn test_lock_object_is_idempotent() {
        let table = small_table();
        let index = table.allocate_entry(&ObjectHeader::new(), |_| {}).unwrap();

        let first = table.lock_object_for(index);
        let second = table.lock_object_for(index);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_lock_object_is_usable() {
        let table = small_table();
        let index = table.allocate_entry(&ObjectHeader::new(), |_| {}).unwrap();

        let lock = table.lock_object_for(index);
        assert!(!lock.is_locked());
        {
            let _guard = lock.lock();
            assert!(lock.is_locked());
            assert!(lock.try_lock().is_none());
        }
        assert!(!lock.is_locked());
    }

    #[test]
    #[should_panic(expected = "not allocated")]
    fn test_unallocated_index_is_a_bug() {
        let table = small_table();
        table.cached_hash(3);
    }

    #[test]
    #[should_panic(expected = "not allocated")]
    fn test_index_zero_is_never_valid() {
        let table = small_table();
        table.lock_object_for(0);
    }
}
