//! This crate provides a binary trie for IPv4 and IPv6 networks. Any lookup
//! performs longest-prefix match.
//!
//! # Description of the Tree
//!
//! One [`NetTrie`] holds two independent trees, one per address family, so a
//! single instance answers lookups for either family. Every node carries a
//! [`Network`] key and has two child slots, selected by the first host bit of
//! the key. The tree consists of two kinds of nodes:
//!
//! - *Value node*: holds a network inserted by the caller, and its payload.
//! - *Routing node*: a synthetic node representing the smallest common
//!   supernet of its two children. Routing nodes appear when two unrelated
//!   networks need a common parent, and disappear again once removal leaves
//!   them with fewer than two children.
//!
//! The tree shape depends only on the set of inserted networks, never on the
//! order of insertion: [`NetTrie::remove`] exactly reverts
//! [`NetTrie::insert`].
//!
//! # Concurrency
//!
//! The base trie is a single-writer / multiple-reader structure: write
//! operations take `&mut self`, while readers never lock. Every structural
//! mutation is published as one release-store of a child pointer, and
//! replaced nodes are retired through an epoch collector, so readers observe
//! either the pre-update or the post-update shape but never a torn node.
//! [`SyncNetTrie`] wraps the trie with a writer mutex for shared-reference
//! use across threads.
//!
//! ```
//! use net_trie::{NetTrie, Network};
//!
//! let mut trie: NetTrie<&str> = NetTrie::new();
//! trie.insert("10.0.0.0/8".parse()?, "rfc1918")?;
//! trie.insert("10.1.0.0/16".parse()?, "branch office")?;
//!
//! let (net, value) = trie.get_match("10.1.2.3".parse().unwrap())?;
//! assert_eq!(net, "10.1.0.0/16".parse()?);
//! assert_eq!(*value, "branch office");
//! # Ok::<(), net_trie::NetError>(())
//! ```

mod classify;
mod errors;
mod family;
mod insert;
mod network;
mod node;
mod query;
mod remove;
mod render;
#[cfg(feature = "serde")]
mod serde;
mod set;
mod summarize;
mod sync;
mod walk;

#[cfg(test)]
mod fuzzing;

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::{AcqRel, Acquire, Relaxed};

use crossbeam_epoch::{self as epoch, Atomic, Guard, Owned};
use log::debug;

use node::{drop_subtree_now, retire_subtree, Node};

pub use classify::{AddressClass, Allocation};
pub use errors::NetError;
pub use family::Family;
pub use insert::{Entry, OccupiedEntry, VacantEntry};
pub use network::{Network, Subnets};
pub use set::NetTrieSet;
pub use summarize::summarize;
pub use sync::SyncNetTrie;

/// A longest-prefix matching trie over IPv4 and IPv6 [`Network`]s.
///
/// Write operations require `&mut self`; read operations take `&self` and
/// are safe to run from any number of threads concurrently. To interleave
/// writes with concurrent reads, use [`SyncNetTrie`].
pub struct NetTrie<T> {
    roots: [Atomic<Node<T>>; 2],
    count: AtomicUsize,
}

impl<T> NetTrie<T> {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self {
            roots: [
                Atomic::new(Node::routing(Network::zero(Family::V4))),
                Atomic::new(Node::routing(Network::zero(Family::V6))),
            ],
            count: AtomicUsize::new(0),
        }
    }

    /// The root slot of the tree holding networks of the given family.
    #[inline(always)]
    pub(crate) fn root(&self, family: Family) -> &Atomic<Node<T>> {
        &self.roots[family as usize]
    }

    /// Returns the number of networks stored in `self`.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.count.load(Relaxed)
    }

    /// Returns `true` if the trie contains no networks.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all networks from both family trees.
    pub fn clear(&mut self) {
        let guard = epoch::pin();
        self.clear_internal(&guard);
    }

    pub(crate) fn clear_internal(&self, guard: &Guard) {
        debug!("clearing the trie");
        for family in [Family::V4, Family::V6] {
            let fresh = Owned::new(Node::routing(Network::zero(family)));
            let old = self.root(family).swap(fresh, AcqRel, guard);
            unsafe { retire_subtree(old, guard) };
        }
        self.count.store(0, Relaxed);
    }

    /// Visit every stored (network, value) pair in ascending network order,
    /// IPv4 before IPv6. The value references outlive the traversal: no
    /// writer can run while `self` is borrowed.
    pub(crate) fn visit_values<'a, F: FnMut(&Network, &'a T)>(&'a self, mut f: F) {
        let guard = epoch::pin();
        for family in [Family::V4, Family::V6] {
            let mut stack = vec![self.root(family).load(Acquire, &guard)];
            while let Some(shared) = stack.pop() {
                let node = match unsafe { shared.as_ref() } {
                    Some(node) => node,
                    None => continue,
                };
                let right = node.children[1].load(Acquire, &guard);
                let left = node.children[0].load(Acquire, &guard);
                if !right.is_null() {
                    stack.push(right);
                }
                if !left.is_null() {
                    stack.push(left);
                }
                if let Some(value) = node.load_value(&guard) {
                    f(&node.net, unsafe { query::extend(value) });
                }
            }
        }
    }
}

impl<T> Default for NetTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for NetTrie<T> {
    fn drop(&mut self) {
        let guard = unsafe { epoch::unprotected() };
        for family in [Family::V4, Family::V6] {
            let root = self.root(family).load(Relaxed, guard);
            if !root.is_null() {
                unsafe { drop_subtree_now(root) };
            }
        }
    }
}

impl<T: Clone> Clone for NetTrie<T> {
    fn clone(&self) -> Self {
        let clone = Self::new();
        let guard = epoch::pin();
        self.visit_values(|net, value| {
            let _ = clone.insert_internal(*net, value.clone(), &guard);
        });
        clone
    }
}

impl<T> FromIterator<(Network, T)> for NetTrie<T> {
    fn from_iter<I: IntoIterator<Item = (Network, T)>>(iter: I) -> Self {
        let mut trie = Self::new();
        trie.extend(iter);
        trie
    }
}

impl<T> Extend<(Network, T)> for NetTrie<T> {
    /// Insert all pairs, ignoring networks that are already present.
    fn extend<I: IntoIterator<Item = (Network, T)>>(&mut self, iter: I) {
        for (net, value) in iter {
            let _ = self.try_insert(net, value);
        }
    }
}
