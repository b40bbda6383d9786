//! ROT: a self-balancing, content-addressed range-ordered tree (§4.1).
//!
//! Every operation is pure: it consumes a tree by reference and returns a
//! new one. Sealed nodes (leaf or internal) are never mutated in place —
//! overflow always produces new, re-sealed nodes, per the state machine in
//! §4.1.

use crate::digest::{seal_internal, seal_leaf, Digest, Encode};
use crate::error::{Error, Result};
use crate::id::Id;
use crate::ordered_set::OrderedSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// `E = (id, payload)`, ordered by id, ties broken by payload (§3).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Entry<P> {
    pub id: Id,
    pub payload: P,
}

impl<P: PartialEq> PartialEq for Entry<P> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.payload == other.payload
    }
}
impl<P: Eq> Eq for Entry<P> {}

impl<P: Ord> PartialOrd for Entry<P> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: Ord> Ord for Entry<P> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id).then_with(|| self.payload.cmp(&other.payload))
    }
}

/// A `(newest, digest)` pair identifying a sealed subtree across replicas (§3, glossary).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Handle {
    pub newest: Id,
    pub digest: Digest,
}

impl Handle {
    /// Big-endian length-prefixed-free wire encoding: `newest` (8 bytes) followed
    /// by the raw 20-byte digest. Framing is implementer-defined per §6; fixed
    /// width suffices since both fields have fixed size.
    pub fn encode(&self) -> [u8; 28] {
        let mut out = [0u8; 28];
        out[..8].copy_from_slice(&self.newest.get().to_be_bytes());
        out[8..].copy_from_slice(&self.digest.0);
        out
    }

    pub fn decode(bytes: &[u8; 28]) -> Self {
        let mut id_bytes = [0u8; 8];
        id_bytes.copy_from_slice(&bytes[..8]);
        let mut digest_bytes = [0u8; 20];
        digest_bytes.copy_from_slice(&bytes[8..]);
        Handle {
            newest: Id(u64::from_be_bytes(id_bytes)),
            digest: Digest(digest_bytes),
        }
    }
}

#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct LeafNode<P> {
    size: u32,
    entries: Vec<Entry<P>>,
    newest: Id,
    hash: Option<Digest>,
}

#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct InternalNode<P> {
    size: u32,
    children: Vec<Node<P>>,
    newest: Id,
    hash: Option<Digest>,
}

#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
enum Node<P> {
    Leaf(LeafNode<P>),
    Internal(InternalNode<P>),
}

impl<P> Node<P> {
    fn newest(&self) -> Id {
        match self {
            Node::Leaf(l) => l.newest,
            Node::Internal(i) => i.newest,
        }
    }

    fn hash(&self) -> Option<Digest> {
        match self {
            Node::Leaf(l) => l.hash,
            Node::Internal(i) => i.hash,
        }
    }

    fn count(&self) -> usize {
        match self {
            Node::Leaf(l) => l.entries.len(),
            Node::Internal(i) => i.children.len(),
        }
    }

    fn size(&self) -> u32 {
        match self {
            Node::Leaf(l) => l.size,
            Node::Internal(i) => i.size,
        }
    }
}

/// Outcome of inserting into a subtree: either it still fits (`Ok`), or it
/// overflowed and demoted its smallest child/entry one level up (`Branch`).
enum RAdd<P> {
    Ok(Node<P>),
    Branch(Node<P>, Node<P>),
}

fn seal_leaf_entries<P: Encode>(entries: &[Entry<P>]) -> Digest {
    let pairs: Vec<(Id, &P)> = entries.iter().map(|e| (e.id, &e.payload)).collect();
    seal_leaf(&pairs)
}

fn seal_if_ready<P>(children: &[Node<P>], size: u32) -> Option<Digest> {
    if children.len() as u32 != size {
        return None;
    }
    let mut digests = Vec::with_capacity(children.len());
    for c in children {
        digests.push(c.hash()?);
    }
    Some(seal_internal(&digests))
}

fn radd<P: Clone + Ord + Encode>(entry: Entry<P>, node: &Node<P>) -> RAdd<P> {
    match node {
        Node::Leaf(leaf) => radd_leaf(entry, leaf),
        Node::Internal(int) => radd_internal(entry, int),
    }
}

fn radd_leaf<P: Clone + Ord + Encode>(entry: Entry<P>, leaf: &LeafNode<P>) -> RAdd<P> {
    let size = leaf.size;

    if leaf.entries.contains(&entry) {
        return RAdd::Ok(Node::Leaf(leaf.clone()));
    }

    if (leaf.entries.len() as u32) < size {
        let mut entries = leaf.entries.clone();
        let idx = entries.partition_point(|e| *e < entry);
        entries.insert(idx, entry);
        let newest = entries.last().expect("just inserted").id;
        let count = entries.len() as u32;
        let hash = if count == size {
            Some(seal_leaf_entries(&entries))
        } else {
            None
        };
        RAdd::Ok(Node::Leaf(LeafNode {
            size,
            entries,
            newest,
            hash,
        }))
    } else {
        // Sealed: conceptually insert into a size+1 list, demote the smallest.
        let mut combined = leaf.entries.clone();
        let idx = combined.partition_point(|e| *e < entry);
        combined.insert(idx, entry);
        let smallest = combined.remove(0);
        let newest = combined.last().expect("size >= 2").id;
        let surviving = LeafNode {
            size,
            hash: Some(seal_leaf_entries(&combined)),
            entries: combined,
            newest,
        };
        let promoted = LeafNode {
            size,
            newest: smallest.id,
            hash: None, // a lone entry never reaches capacity (size >= 2)
            entries: vec![smallest],
        };
        RAdd::Branch(Node::Leaf(surviving), Node::Leaf(promoted))
    }
}

fn radd_internal<P: Clone + Ord + Encode>(entry: Entry<P>, node: &InternalNode<P>) -> RAdd<P> {
    let size = node.size;
    let idx = node
        .children
        .iter()
        .position(|c| c.newest() >= entry.id)
        .unwrap_or(node.children.len() - 1);

    let mut children = node.children.clone();
    match radd(entry, &children[idx]) {
        RAdd::Ok(new_child) => {
            children[idx] = new_child;
            finish_internal(children, size)
        }
        RAdd::Branch(new_child, promoted) => {
            children[idx] = new_child;
            let p_newest = promoted.newest();
            let ins_idx = children.partition_point(|c| c.newest() < p_newest);
            children.insert(ins_idx, promoted);
            finish_internal(children, size)
        }
    }
}

fn finish_internal<P: Clone + Ord + Encode>(mut children: Vec<Node<P>>, size: u32) -> RAdd<P> {
    if children.len() as u32 > size {
        // Demote the smallest (leftmost, by `newest`) sibling one level up.
        let demoted = children.remove(0);
        let newest = children.last().map(|c| c.newest()).unwrap_or(Id::ZERO);
        let hash = seal_if_ready(&children, size);
        RAdd::Branch(
            Node::Internal(InternalNode {
                size,
                children,
                newest,
                hash,
            }),
            demoted,
        )
    } else {
        let newest = children.last().map(|c| c.newest()).unwrap_or(Id::ZERO);
        let hash = seal_if_ready(&children, size);
        RAdd::Ok(Node::Internal(InternalNode {
            size,
            children,
            newest,
            hash,
        }))
    }
}

fn collect_entries<P: Clone>(node: &Node<P>, out: &mut Vec<Entry<P>>) {
    match node {
        Node::Leaf(l) => out.extend(l.entries.iter().cloned()),
        Node::Internal(i) => {
            for c in &i.children {
                collect_entries(c, out);
            }
        }
    }
}

fn full_node<P>(node: &Node<P>, out: &mut Vec<Handle>) {
    match node {
        Node::Leaf(l) => {
            if let Some(digest) = l.hash {
                out.push(Handle { newest: l.newest, digest });
            }
        }
        Node::Internal(i) => {
            if let Some(digest) = i.hash {
                out.push(Handle { newest: i.newest, digest });
            } else {
                for c in &i.children {
                    full_node(c, out);
                }
            }
        }
    }
}

/// `None` => handle not found in this subtree.
/// `Some((entries, None))` => this node matched the handle and is excised entirely.
/// `Some((entries, Some(node)))` => the handle was found in a descendant; `node`
/// is this node's replacement with that subtree spliced out.
fn remove_handle<P: Clone + Ord + Encode>(
    node: &Node<P>,
    handle: Handle,
) -> Option<(Vec<Entry<P>>, Option<Node<P>>)> {
    if let Some(digest) = node.hash() {
        if node.newest() == handle.newest && digest == handle.digest {
            let mut entries = Vec::new();
            collect_entries(node, &mut entries);
            return Some((entries, None));
        }
    }

    match node {
        Node::Leaf(_) => None,
        Node::Internal(i) => {
            for (idx, child) in i.children.iter().enumerate() {
                if let Some((entries, replacement)) = remove_handle(child, handle) {
                    let mut children = i.children.clone();
                    match replacement {
                        None => {
                            children.remove(idx);
                        }
                        Some(new_child) => {
                            children[idx] = new_child;
                        }
                    }
                    return Some((entries, Some(rebuild_internal(children, i.size))));
                }
            }
            None
        }
    }
}

/// Rebuilds an internal node after excising a subtree, collapsing a
/// single-surviving-child node into that child directly to avoid leaving
/// degenerate one-child wrappers in the tree.
fn rebuild_internal<P>(children: Vec<Node<P>>, size: u32) -> Node<P> {
    if children.len() == 1 {
        return children.into_iter().next().expect("len == 1");
    }
    let newest = children.last().map(|c| c.newest()).unwrap_or(Id::ZERO);
    let hash = seal_if_ready(&children, size);
    Node::Internal(InternalNode {
        size,
        children,
        newest,
        hash,
    })
}

/// Range-Ordered Tree: a self-balancing, content-addressed tree of
/// time-ordered buckets (§2).
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rot<P> {
    size: u32,
    root: Node<P>,
}

impl<P: Clone + Ord + Encode> Rot<P> {
    pub fn new(size: u32) -> Result<Self> {
        if size < 2 {
            return Err(Error::CapacityViolation(size));
        }
        Ok(Self {
            size,
            root: Node::Leaf(LeafNode {
                size,
                entries: Vec::new(),
                newest: Id::ZERO,
                hash: None,
            }),
        })
    }

    pub fn bucket_size(&self) -> u32 {
        self.size
    }

    /// Inserts `entry`; returns a new tree. A duplicate `(id, payload)` is a no-op.
    pub fn add(&self, id: Id, payload: P) -> Self {
        let entry = Entry { id, payload };
        match radd(entry, &self.root) {
            RAdd::Ok(new_root) => Rot {
                size: self.size,
                root: new_root,
            },
            RAdd::Branch(a, b) => {
                let mut children = vec![a, b];
                children.sort_by_key(|c| c.newest());
                let newest = children.last().expect("two children").newest();
                let hash = seal_if_ready(&children, self.size);
                Rot {
                    size: self.size,
                    root: Node::Internal(InternalNode {
                        size: self.size,
                        children,
                        newest,
                        hash,
                    }),
                }
            }
        }
    }

    /// The ordered set of all entries currently in the tree.
    pub fn value(&self) -> OrderedSet<Entry<P>> {
        let mut entries = Vec::new();
        collect_entries(&self.root, &mut entries);
        entries.into_iter().collect()
    }

    /// Every sealed node's `(newest, digest)` handle, used for GC negotiation (§4.1).
    pub fn full(&self) -> Vec<Handle> {
        let mut out = Vec::new();
        full_node(&self.root, &mut out);
        out
    }

    /// Locates the sealed subtree matching `handle`, extracts its entries, and
    /// returns a tree with that subtree excised. A no-op (empty removal, tree
    /// unchanged) if no sealed subtree matches.
    pub fn remove(&self, handle: Handle) -> (Vec<Entry<P>>, Self) {
        match remove_handle(&self.root, handle) {
            None => (Vec::new(), self.clone()),
            Some((entries, None)) => (
                entries,
                Rot::new(self.size).expect("size was already validated"),
            ),
            Some((entries, Some(new_root))) => {
                let root = if new_root.count() == 0 {
                    Node::Leaf(LeafNode {
                        size: self.size,
                        entries: Vec::new(),
                        newest: Id::ZERO,
                        hash: None,
                    })
                } else {
                    new_root
                };
                (
                    entries,
                    Rot {
                        size: self.size,
                        root,
                    },
                )
            }
        }
    }

    /// Set-union of two trees. Realized by replaying `b`'s entries into `a`.
    pub fn merge(a: &Self, b: &Self) -> Self {
        let mut out = a.clone();
        for entry in b.value().into_vec() {
            out = out.add(entry.id, entry.payload);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.root.count() == 0
    }
}
