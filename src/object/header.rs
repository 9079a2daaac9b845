//! Object Header Word - hash / sync-entry metadata for GC-managed objects
//!
//! Header Word Layout (32-bit):
//! ┌──────┬──────┬─────────┬──────┬──────────────────────────────┐
//! │  M1  │  M0  │ unused  │ Hash │          Payload             │
//! │  31  │  30  │  29-27  │  26  │           25-0               │
//! └──────┴──────┴─────────┴──────┴──────────────────────────────┘
//!
//! - Bits 0-25: payload, either an identity hash code or a 1-based
//!   sync-entry index
//! - Bit 26: is-hash-code flag; set means the payload is a hash code,
//!   clear with a nonzero payload means the payload is an entry index
//! - Bits 27-31: reserved; bits 30/31 are the collector's mark bits,
//!   bits 27-29 are unassigned. All five are carried verbatim through
//!   every update made by this crate.
//!
//! Payload value 0 is "absent" in both domains: a header with flag clear
//! and payload 0 is empty, and a flag-set/payload-0 word is never produced.

use std::sync::atomic::{AtomicU32, Ordering};

/// Width of the payload field in bits
pub const PAYLOAD_BITS: u32 = 26;

/// Mask selecting the payload field
pub const PAYLOAD_MASK: u32 = (1 << PAYLOAD_BITS) - 1;

/// Position of the is-hash-code flag
pub const HASH_FLAG_BIT: u32 = PAYLOAD_BITS;

/// Mask selecting the is-hash-code flag
pub const HASH_FLAG_MASK: u32 = 1 << HASH_FLAG_BIT;

/// Bits this crate never interprets, only preserves
pub const RESERVED_MASK: u32 = !(PAYLOAD_MASK | HASH_FLAG_MASK);

/// Largest representable hash code or entry index
pub const MAX_PAYLOAD: u32 = PAYLOAD_MASK;

/// Collector mark bit positions (within the reserved range)
pub const GC_MARKED0_BIT: u32 = 30;
pub const GC_MARKED1_BIT: u32 = 31;

/// Masks for the collector mark bits
pub const GC_MARKED0_MASK: u32 = 1 << GC_MARKED0_BIT;
pub const GC_MARKED1_MASK: u32 = 1 << GC_MARKED1_BIT;

/// Decoded header word state
///
/// The three states are mutually exclusive and exhaustive: a snapshot of a
/// header word always decodes to exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderState {
    /// No hash assigned, no sync entry installed
    Empty,
    /// Payload holds the object's identity hash code (nonzero)
    Hash(u32),
    /// Payload holds a 1-based sync-entry index (nonzero)
    Entry(u32),
}

/// Decode a header word snapshot
///
/// Pure function; safe to call on a stale snapshot. A stale decode can only
/// send a caller into a retry loop, never produce a wrong final answer.
#[inline]
pub fn decode(word: u32) -> HeaderState {
    let payload = word & PAYLOAD_MASK;
    if word & HASH_FLAG_MASK != 0 {
        debug_assert!(payload != 0, "hash flag set with zero payload");
        HeaderState::Hash(payload)
    } else if payload != 0 {
        HeaderState::Entry(payload)
    } else {
        HeaderState::Empty
    }
}

/// The authoritative "object already has a sync entry" test
///
/// Returns the entry index iff the flag is clear and the payload is nonzero.
#[inline]
pub fn entry_index(word: u32) -> Option<u32> {
    let payload = word & PAYLOAD_MASK;
    if word & HASH_FLAG_MASK == 0 && payload != 0 {
        Some(payload)
    } else {
        None
    }
}

/// Build a HasHash word: flag set, payload = `hash`, reserved bits carried
/// over from `word`
#[inline]
pub fn encode_hash(word: u32, hash: u32) -> u32 {
    debug_assert!(hash != 0, "hash code 0 is reserved for 'absent'");
    debug_assert!(hash <= MAX_PAYLOAD, "hash code exceeds payload width");
    (word & RESERVED_MASK) | HASH_FLAG_MASK | hash
}

/// Build a HasEntry word: flag clear, payload = `index`, reserved bits
/// carried over from `word`
#[inline]
pub fn encode_entry(word: u32, index: u32) -> u32 {
    debug_assert!(index != 0, "entry index 0 is never assigned");
    debug_assert!(index <= MAX_PAYLOAD, "entry index exceeds payload width");
    (word & RESERVED_MASK) | index
}

/// Object Header
///
/// One atomic word logically attached to every heap object. The word is
/// shared with the collector: this crate owns the flag and payload bits,
/// the collector owns the mark bits, and every update from either side is
/// a whole-word compare-and-swap so neither can tear the other's bits.
pub struct ObjectHeader {
    word: AtomicU32,
}

impl ObjectHeader {
    /// Create an empty header (no hash, no entry, no mark bits)
    pub fn new() -> Self {
        Self {
            word: AtomicU32::new(0),
        }
    }

    /// Create a header from a raw word value
    pub fn from_raw(word: u32) -> Self {
        Self {
            word: AtomicU32::new(word),
        }
    }

    /// Plain snapshot of the word
    ///
    /// Relaxed on purpose: the fast paths tolerate a stale value because the
    /// compare-and-swap in the slow paths is the sole correctness point. A
    /// stale read costs one redundant retry, nothing more.
    #[inline]
    pub fn load(&self) -> u32 {
        self.word.load(Ordering::Relaxed)
    }

    /// Acquire snapshot, used at the top of every retry loop
    #[inline]
    pub fn load_acquire(&self) -> u32 {
        self.word.load(Ordering::Acquire)
    }

    /// Decode the current state from a plain snapshot
    #[inline]
    pub fn state(&self) -> HeaderState {
        decode(self.load())
    }

    /// Whole-word compare-and-swap
    ///
    /// Returns `Err` with the actual current word when `current` was stale.
    #[inline]
    pub fn compare_exchange(&self, current: u32, new: u32) -> Result<u32, u32> {
        self.word
            .compare_exchange(current, new, Ordering::AcqRel, Ordering::Acquire)
    }

    // === Collector Mark Bit Operations ===
    //
    // These model the collector's side of the shared word. The hash and
    // entry protocols never call them; they exist so the preservation
    // contract can be exercised.

    /// Check if the collector's Marked0 bit is set
    #[inline]
    pub fn is_marked0(&self) -> bool {
        self.word.load(Ordering::Acquire) & GC_MARKED0_MASK != 0
    }

    /// Check if the collector's Marked1 bit is set
    #[inline]
    pub fn is_marked1(&self) -> bool {
        self.word.load(Ordering::Acquire) & GC_MARKED1_MASK != 0
    }

    /// Set Marked0 atomically; returns true if it was already set
    #[inline]
    pub fn set_marked0(&self) -> bool {
        self.word.fetch_or(GC_MARKED0_MASK, Ordering::AcqRel) & GC_MARKED0_MASK != 0
    }

    /// Set Marked1 atomically; returns true if it was already set
    #[inline]
    pub fn set_marked1(&self) -> bool {
        self.word.fetch_or(GC_MARKED1_MASK, Ordering::AcqRel) & GC_MARKED1_MASK != 0
    }

    /// Clear both mark bits atomically
    #[inline]
    pub fn clear_mark_bits(&self) {
        self.word
            .fetch_and(!(GC_MARKED0_MASK | GC_MARKED1_MASK), Ordering::AcqRel);
    }
}

impl Default for ObjectHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ObjectHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let word = self.load();
        f.debug_struct("ObjectHeader")
            .field("word", &format_args!("{:#010x}", word))
            .field("state", &decode(word))
            .finish()
    }
}
