#![forbid(unsafe_code)]
//! A garbage-collectable Observed-Remove Set (OR-Set) CRDT.
//!
//! Two subsystems, leaves-first:
//!
//! - [`rot`]: a self-balancing, content-addressed range-ordered tree of
//!   time-ordered buckets, used to negotiate which complete buckets of
//!   tombstones every replica has observed.
//! - [`gset`]: an OR-Set whose tombstone store is a [`rot::Rot`], garbage
//!   collecting fully-observed tombstone buckets from both the add-set and
//!   the tombstone store.
//!
//! The crate is pure: every operation returns a new state value and performs
//! no I/O. It consumes exactly two capabilities from its environment —
//! [`id::IdSource::fresh_id`] and [`id::TimeSource::now_us`] — both totally
//! ordered per replica.

pub mod digest;
pub mod error;
pub mod gset;
pub mod id;
pub mod ordered_set;
pub mod rot;

pub use digest::{Digest, Encode};
pub use error::{Error, Result};
pub use gset::{GSet, GcOutcome};
pub use id::{Id, IdSource, MonotonicCounter, TimeSource};
pub use ordered_set::OrderedSet;
pub use rot::{Entry, Handle, Rot};
