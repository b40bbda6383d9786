//! SHA-1 content addressing for sealed ROT buckets (§3, §6).
//!
//! SHA-1 is used for historical compatibility, not security (§9 "Hash
//! choice"): any 160-bit-or-wider digest would satisfy the design, but
//! swapping it changes wire-level handles, not semantics.

use sha1::{Digest as _, Sha1};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::id::Id;

/// A 20-byte SHA-1 digest, opaque beyond equality and ordering.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Digest(pub [u8; 20]);

impl Digest {
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(40);
        for b in &self.0 {
            out.push_str(&format!("{:02x}", b));
        }
        out
    }
}

impl std::fmt::Debug for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Types that can be deterministically, canonically serialized for hashing.
/// Framing is fixed-endian and length-prefixed where the content is
/// variable-length, per §6's "canonical serialization" requirement.
pub trait Encode {
    fn encode_into(&self, out: &mut Vec<u8>);
}

impl Encode for Id {
    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.get().to_be_bytes());
    }
}

impl Encode for Digest {
    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0);
    }
}

impl Encode for String {
    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.len() as u32).to_be_bytes());
        out.extend_from_slice(self.as_bytes());
    }
}

impl Encode for Vec<u8> {
    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.len() as u32).to_be_bytes());
        out.extend_from_slice(self);
    }
}

impl<A: Encode, B: Encode> Encode for (A, B) {
    fn encode_into(&self, out: &mut Vec<u8>) {
        self.0.encode_into(out);
        self.1.encode_into(out);
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode_into(&self, out: &mut Vec<u8>) {
        (**self).encode_into(out)
    }
}

/// Digest of a leaf's canonical entry framing: `id || len(payload) || payload`
/// per entry, concatenated in ascending order.
pub fn seal_leaf<P: Encode>(entries: &[(Id, P)]) -> Digest {
    let mut buf = Vec::new();
    for (id, payload) in entries {
        id.encode_into(&mut buf);
        payload.encode_into(&mut buf);
    }
    let mut hasher = Sha1::new();
    hasher.update(&buf);
    Digest(hasher.finalize().into())
}

/// Digest of an internal node: SHA-1 feed of child digests, left-to-right,
/// smallest `newest` first (§3).
pub fn seal_internal(child_digests: &[Digest]) -> Digest {
    let mut hasher = Sha1::new();
    for d in child_digests {
        hasher.update(d.0);
    }
    Digest(hasher.finalize().into())
}
