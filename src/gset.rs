//! GSET: an OR-Set whose tombstone store is a ROT, enabling garbage
//! collection of fully-observed tombstone buckets (§4.2, §4.3).

use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::digest::{Digest, Encode};
use crate::error::{Error, Result};
use crate::id::Id;
use crate::ordered_set::OrderedSet;
use crate::rot::{Entry, Handle, Rot};

/// Result of a `gc` call: distinguishes an effective GC step from a replay
/// of a handle this replica has never observed (§7 `UnknownHandle`, not an
/// error — just a no-op that still extends the GC trail for convergence).
#[derive(Debug)]
pub enum GcOutcome<T> {
    Applied(T),
    UnknownHandle(T),
}

impl<T> GcOutcome<T> {
    pub fn into_inner(self) -> T {
        match self {
            GcOutcome::Applied(t) | GcOutcome::UnknownHandle(t) => t,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, GcOutcome::Applied(_))
    }
}

/// Garbage-collectable OR-Set.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GSet<E: Clone + Ord + Encode> {
    size: u32,
    adds: OrderedSet<Entry<E>>,
    removes: Rot<(Id, E)>,
    gced: Rot<Digest>,
    last_add_id: Option<Id>,
    last_tomb_id: Option<Id>,
}

impl<E: Clone + Ord + Encode> GSet<E> {
    pub fn new(size: u32) -> Result<Self> {
        Ok(Self {
            size,
            adds: OrderedSet::new(),
            removes: Rot::new(size)?,
            gced: Rot::new(size)?,
            last_add_id: None,
            last_tomb_id: None,
        })
    }

    pub fn bucket_size(&self) -> u32 {
        self.size
    }

    /// Inserts `(id, elem)` into `adds`. `id` must be strictly greater than
    /// any id previously used for `add` by this replica (§4.2, §7).
    pub fn add(&self, id: Id, elem: E) -> Result<Self> {
        if let Some(last) = self.last_add_id {
            if id <= last {
                return Err(Error::NonMonotonicId {
                    id: id.get(),
                    last: last.get(),
                });
            }
        }
        let mut adds = self.adds.clone();
        adds.insert(Entry { id, payload: elem });
        Ok(Self {
            adds,
            last_add_id: Some(id),
            ..self.clone()
        })
    }

    /// Tombstones every currently-observed add-record of `elem`, tagging each
    /// tombstone with `tomb_id` (conventionally `now_us()`).
    pub fn remove(&self, tomb_id: Id, elem: E) -> Result<Self> {
        if let Some(last) = self.last_tomb_id {
            if tomb_id <= last {
                return Err(Error::NonMonotonicId {
                    id: tomb_id.get(),
                    last: last.get(),
                });
            }
        }
        let removed_pairs = self.removed_pairs();
        let mut removes = self.removes.clone();
        for entry in self.adds.iter() {
            if entry.payload != elem {
                continue;
            }
            if removed_pairs.contains(&(entry.id, entry.payload.clone())) {
                continue;
            }
            removes = removes.add(tomb_id, (entry.id, entry.payload.clone()));
        }
        Ok(Self {
            removes,
            last_tomb_id: Some(tomb_id),
            ..self.clone()
        })
    }

    /// `(add_id, payload)` pairs that have been tombstoned, per `value(removes)`.
    fn removed_pairs(&self) -> OrderedSet<(Id, E)> {
        self.removes.value().into_vec().into_iter().map(|e| e.payload).collect()
    }

    /// The effective set: `adds \ removed`, projected to payloads (§4.2).
    pub fn value(&self) -> OrderedSet<E> {
        let removed = self.removed_pairs();
        self.adds
            .iter()
            .filter(|e| !removed.contains(&(e.id, e.payload.clone())))
            .map(|e| e.payload.clone())
            .collect()
    }

    /// Union of sealed-bucket handles from both `removes` and `gced`; the
    /// intersection of this across replicas is the safe-to-GC set.
    pub fn gcable(&self) -> Vec<Handle> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for handle in self.removes.full().into_iter().chain(self.gced.full()) {
            if seen.insert(handle) {
                out.push(handle);
            }
        }
        out
    }

    /// Applies one GC step for `handle` (§4.2 "gc protocol"). A handle unknown
    /// to this replica's `removes` is a no-op on `adds`/`removes`, but the
    /// handle is still recorded in `gced` to preserve convergence of the GC
    /// trail across replicas (§7 `UnknownHandle`).
    pub fn gc(&self, handle: Handle) -> GcOutcome<Self> {
        let (entries_removed, removes) = self.removes.remove(handle);
        let (_, gced_stripped) = self.gced.remove(handle);
        let gced = gced_stripped.add(handle.newest, handle.digest);

        if entries_removed.is_empty() {
            return GcOutcome::UnknownHandle(Self {
                removes,
                gced,
                ..self.clone()
            });
        }

        let victims: OrderedSet<(Id, E)> = entries_removed.into_iter().map(|e| e.payload).collect();
        let adds = self
            .adds
            .iter()
            .filter(|e| !victims.contains(&(e.id, e.payload.clone())))
            .cloned()
            .collect();

        GcOutcome::Applied(Self {
            adds,
            removes,
            gced,
            ..self.clone()
        })
    }

    /// Merge protocol (§4.2): replay each side's GC trail into the other
    /// before unioning surviving state, so GC'd entries are never
    /// re-introduced by the union step.
    pub fn merge(a: &Self, b: &Self) -> Self {
        let mut a_prime = a.clone();
        for entry in b.gced.value().into_vec() {
            let handle = Handle {
                newest: entry.id,
                digest: entry.payload,
            };
            a_prime = a_prime.gc(handle).into_inner();
        }

        let mut b_prime = b.clone();
        for entry in a.gced.value().into_vec() {
            let handle = Handle {
                newest: entry.id,
                digest: entry.payload,
            };
            b_prime = b_prime.gc(handle).into_inner();
        }

        let mut adds = a_prime.adds.clone();
        for entry in b_prime.adds.into_vec() {
            adds.insert(entry);
        }

        Self {
            size: a.size,
            adds,
            removes: Rot::merge(&a_prime.removes, &b_prime.removes),
            gced: a_prime.gced,
            last_add_id: std::cmp::max(a.last_add_id, b.last_add_id),
            last_tomb_id: std::cmp::max(a.last_tomb_id, b.last_tomb_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_plain_adds() {
        let g = GSet::new(3).unwrap();
        let g = g.add(Id(1), "x".to_string()).unwrap();
        let g = g.add(Id(2), "y".to_string()).unwrap();
        assert_eq!(g.value().into_vec(), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn s2_new_add_wins_over_tombstone() {
        let g = GSet::new(3).unwrap();
        let g = g.add(Id(1), "x".to_string()).unwrap();
        let g = g.remove(Id(10), "x".to_string()).unwrap();
        assert!(g.value().is_empty());
        let g = g.add(Id(2), "x".to_string()).unwrap();
        assert_eq!(g.value().into_vec(), vec!["x".to_string()]);
    }

    #[test]
    fn s3_commutative_independent_adds() {
        let a = GSet::new(3).unwrap().add(Id(1), "x".to_string()).unwrap();
        let b = GSet::new(3).unwrap().add(Id(2), "y".to_string()).unwrap();
        let ab = GSet::merge(&a, &b);
        let ba = GSet::merge(&b, &a);
        assert_eq!(ab.value(), ba.value());
        assert_eq!(ab.value().into_vec(), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn s4_uncovered_add_survives() {
        let a = GSet::new(3).unwrap();
        let a = a.add(Id(1), "x".to_string()).unwrap();
        let a = a.remove(Id(10), "x".to_string()).unwrap();
        let b = GSet::new(3).unwrap().add(Id(2), "x".to_string()).unwrap();
        let merged = GSet::merge(&a, &b);
        assert_eq!(merged.value().into_vec(), vec!["x".to_string()]);
    }

    #[test]
    fn monotonic_id_rejected() {
        let g = GSet::new(3).unwrap().add(Id(5), "x".to_string()).unwrap();
        let err = g.add(Id(5), "y".to_string()).unwrap_err();
        assert!(matches!(err, Error::NonMonotonicId { id: 5, last: 5 }));
    }

    #[test]
    fn idempotent_merge() {
        let a = GSet::new(3).unwrap().add(Id(1), "x".to_string()).unwrap();
        let merged = GSet::merge(&a, &a);
        assert_eq!(a.value(), merged.value());
    }
}
