//! Entity handles.
//!
//! An [`Entity`] is a 64-bit handle that packs a monotonically increasing
//! *sequence* number in the high 48 bits and a fixed *valid tag* in the low 16
//! bits. The tag lets [`Entity::is_tagged`] reject arbitrary integers before
//! they are ever used as an index into storage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag stored in the low 16 bits of every entity handed out by a
/// [`Manager`](crate::manager::Manager).
pub const VALID_ENTITY_TAG: u64 = 0x5A17;

/// Number of low bits reserved for the tag.
pub const TAG_BITS: u32 = 16;

const TAG_MASK: u64 = (1 << TAG_BITS) - 1;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// An opaque entity identifier.
///
/// Layout: `[sequence: 48 bits | tag: 16 bits]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(u64);

impl Entity {
    /// Build a tagged entity from a sequence number.
    #[inline]
    pub fn from_sequence(sequence: u64) -> Self {
        Self(sequence << TAG_BITS | VALID_ENTITY_TAG)
    }

    /// The sequence portion (high 48 bits). Used as the sparse-array index.
    #[inline]
    pub fn sequence(self) -> u64 {
        self.0 >> TAG_BITS
    }

    /// The tag portion (low 16 bits).
    #[inline]
    pub fn tag(self) -> u16 {
        (self.0 & TAG_MASK) as u16
    }

    /// Whether the low bits carry [`VALID_ENTITY_TAG`].
    ///
    /// This is a structural check only; it says nothing about liveness.
    #[inline]
    pub fn is_tagged(self) -> bool {
        self.0 & TAG_MASK == VALID_ENTITY_TAG
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reinterpret a raw `u64`. No validation is performed.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Sparse-array slot for this entity.
    #[inline]
    pub(crate) fn slot(self) -> usize {
        self.sequence() as usize
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_tagged() {
            write!(f, "Entity({})", self.sequence())
        } else {
            write!(f, "Entity(invalid {:#x})", self.0)
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_tagged() {
            write!(f, "e{}", self.sequence())
        } else {
            write!(f, "invalid({:#x})", self.0)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
