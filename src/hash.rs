//! Identity Hash Assignment - lazily computed, permanently stable hashes
//!
//! The hash protocol is lock-free: the only synchronization primitive on
//! the hot path is the header word compare-and-swap. It interleaves safely
//! with sync-entry installation on the same object because an occupied
//! header is terminal for the assignment loop: whichever state it finds,
//! there is a hash to return or a table slot to resolve through.

use std::sync::atomic::{fence, Ordering};

use rand::Rng;

use crate::logging::{log_event, SyncEvent};
use crate::object::header::{self, HeaderState, ObjectHeader, PAYLOAD_MASK};
use crate::object::HeapObject;
use crate::table::SyncTable;

/// Source of raw hash material
///
/// Any distribution is acceptable as long as it is not adversarially
/// collidable in practice. The trait is the seam for deterministic sources
/// in tests.
pub trait RawHashSource: Send + Sync {
    /// Draw one raw 32-bit value; it is masked to the payload width by the
    /// protocol, so the full word may be used
    fn next_raw_hash(&self) -> u32;
}

/// Production hash source backed by the thread-local RNG
#[derive(Debug, Default)]
pub struct RandomHashSource;

impl RawHashSource for RandomHashSource {
    fn next_raw_hash(&self) -> u32 {
        rand::thread_rng().gen()
    }
}

/// Mask a raw draw into the payload field and remap 0, which is reserved
/// as "no hash assigned"
#[inline]
fn mask_candidate(raw: u32) -> u32 {
    let masked = raw & PAYLOAD_MASK;
    if masked == 0 {
        1
    } else {
        masked
    }
}

/// The identity hash code of `object`
///
/// Total and idempotent: after the first successful assignment every call,
/// from any thread, returns the identical value for the object's lifetime.
/// Returns 0 only for `None` (the absent-object sentinel); an assigned
/// hash is never 0.
pub fn hash_code_of(
    table: &SyncTable,
    source: &dyn RawHashSource,
    object: Option<&HeapObject>,
) -> u32 {
    let Some(object) = object else {
        return 0;
    };
    let target = object.header();

    // Plain relaxed snapshot for the fast path. A stale value only sends us
    // into the assignment loop one round early; the CAS there is the sole
    // correctness point.
    match header::decode(target.load()) {
        HeaderState::Hash(hash) => hash,
        HeaderState::Entry(index) => {
            // Pair with the installer's publishing CAS so the entry itself
            // is visible in the table before we index into it.
            fence(Ordering::Acquire);
            let cached = table.cached_hash(index);
            if cached != 0 {
                cached
            } else {
                // Entry exists but no hash was ever cached for it
                assign_hash(table, source, target)
            }
        },
        HeaderState::Empty => assign_hash(table, source, target),
    }
}

/// Assignment loop: publish one candidate, or adopt whatever beat us
///
/// The candidate is drawn once; every retry re-reads the header and acts on
/// its current state. An occupied header ends the loop: a resident hash is
/// adopted directly, a resident entry index resolves through the table's
/// set-if-unset call so the candidate is either stored or replaced by the
/// value that got there first. Either way no hash, ours or anyone else's,
/// is ever lost.
fn assign_hash(table: &SyncTable, source: &dyn RawHashSource, target: &ObjectHeader) -> u32 {
    let candidate = mask_candidate(source.next_raw_hash());

    let mut current = target.load_acquire();
    loop {
        match header::decode(current) {
            HeaderState::Empty => {
                match target.compare_exchange(current, header::encode_hash(current, candidate)) {
                    Ok(_) => {
                        log_event(SyncEvent::HashAssigned { hash: candidate });
                        return candidate;
                    },
                    Err(actual) => current = actual,
                }
            },
            HeaderState::Hash(hash) => return hash,
            HeaderState::Entry(index) => return table.set_hash_if_unset(index, candidate),
        }
    }
}
