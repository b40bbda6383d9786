//! Identifiers and the two environment capabilities the core consumes:
//! a monotonic id source (`fresh_id`) and a microsecond clock (`now_us`).
//!
//! Both capabilities are external collaborators per the design (§1, §6):
//! the core only needs values that satisfy [`Id`]'s total order, and never
//! generates them itself outside of tests.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A totally-ordered identifier. Used both for add-ids and for tombstone
/// (timestamp) ids; the core treats both uniformly as `Id`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Id(pub u64);

impl Id {
    pub const ZERO: Id = Id(0);

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Id {
    fn from(v: u64) -> Self {
        Id(v)
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns totally-ordered identifiers, strictly greater than any previously
/// returned by this replica. Assumed monotonic per replica; the core never
/// validates monotonicity across replicas, only against its own last-seen id.
pub trait IdSource {
    fn fresh_id(&mut self) -> Id;
}

/// Returns microsecond-granularity monotonic timestamps, used as tombstone ids.
pub trait TimeSource {
    fn now_us(&mut self) -> Id;
}

/// Simple monotonically-increasing counter, useful for tests and as a
/// default when no real id/time source is wired in.
#[derive(Clone, Debug, Default)]
pub struct MonotonicCounter {
    next: u64,
}

impl MonotonicCounter {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn starting_at(start: u64) -> Self {
        Self { next: start }
    }
}

impl IdSource for MonotonicCounter {
    fn fresh_id(&mut self) -> Id {
        let id = Id(self.next);
        self.next += 1;
        id
    }
}

impl TimeSource for MonotonicCounter {
    fn now_us(&mut self) -> Id {
        let id = Id(self.next);
        self.next += 1;
        id
    }
}
