//! Row identifiers and the temporary-id allocator
//!
//! Two id spaces meet in a draft: ids assigned by the server and ids minted
//! locally for rows the server has never seen. Both are plain integers used
//! as join keys; neither carries provenance information (the row itself
//! does).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(pub u64);

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier unique within one draft's row list
///
/// For rows loaded from the server this mirrors the server id; for rows
/// added locally it is minted by [`IdAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(pub u64);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ServerId> for LocalId {
    fn from(id: ServerId) -> Self {
        Self(id.0)
    }
}

/// Mints temporary identifiers for locally added rows
///
/// The counter is seeded to one past the highest server id observed at the
/// last full reload of the authoritative children list, so a temporary id
/// can never collide with an id already present on the server. Reseeding
/// never moves the counter backwards; a too-high seed is harmless, a reused
/// one is not.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Allocator with no observed server ids
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Re-seed from the authoritative set of server ids
    ///
    /// Called at every full reload. The new floor is `max(known) + 1`, or
    /// the current counter when that is already higher.
    pub fn reseed<I>(&mut self, known: I)
    where
        I: IntoIterator<Item = ServerId>,
    {
        let max = known.into_iter().map(|id| id.0).max().unwrap_or(0);
        let floor = max + 1;
        if floor > self.next {
            self.next = floor;
        }
        tracing::debug!(watermark = self.next, "allocator reseeded");
    }

    /// Mint the next temporary id
    pub fn next_temp_id(&mut self) -> LocalId {
        let id = self.next;
        self.next += 1;
        LocalId(id)
    }

    /// Lowest id the allocator may hand out next
    #[inline]
    #[must_use]
    pub fn watermark(&self) -> u64 {
        self.next
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
