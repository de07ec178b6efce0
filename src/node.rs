//! The internal trie node and its reclamation helpers.

use std::sync::atomic::Ordering::{Acquire, Relaxed};

use crossbeam_epoch::{self as epoch, Atomic, Guard, Shared};

use crate::network::Network;

/// A single trie node: the Network key plus the bit fields used in the hot
/// path, two child slots, and the payload pointer.
///
/// A node holding a payload is a *value node*; a node with a null payload is
/// a *routing node*, present only to give structure to the tree. All cached
/// fields are set before a node is published into a parent slot and are
/// never mutated afterwards; the payload pointer is the only mutable field,
/// written with release ordering and read with acquire ordering.
pub(crate) struct Node<T> {
    pub(crate) net: Network,
    pub(crate) bits: u128,
    pub(crate) mask: u128,
    pub(crate) prefix: u8,
    split_mask: u128,
    pub(crate) value: Atomic<T>,
    pub(crate) children: [Atomic<Node<T>>; 2],
}

impl<T> Node<T> {
    fn with_value(net: Network, value: Atomic<T>) -> Self {
        let len = net.family().bits();
        let prefix = net.prefix_len();
        Self {
            net,
            bits: net.bits(),
            mask: net.mask_bits(),
            prefix,
            split_mask: if prefix < len {
                1u128 << (len - prefix - 1)
            } else {
                0
            },
            value,
            children: [Atomic::null(), Atomic::null()],
        }
    }

    /// A routing node: no payload, two empty child slots.
    pub(crate) fn routing(net: Network) -> Self {
        Self::with_value(net, Atomic::null())
    }

    /// A value node holding a payload.
    pub(crate) fn value(net: Network, value: T) -> Self {
        Self::with_value(net, Atomic::new(value))
    }

    /// The child slot an address with the given bits falls into. Undefined
    /// for host-route nodes; the trie never descends below those.
    #[inline(always)]
    pub(crate) fn slot(&self, bits: u128) -> usize {
        debug_assert_ne!(self.split_mask, 0);
        usize::from(bits & self.split_mask != 0)
    }

    /// Check if an address with the given bits lies inside this node's
    /// network.
    #[inline(always)]
    pub(crate) fn covers(&self, bits: u128) -> bool {
        bits & self.mask == self.bits
    }

    /// Load the payload, if any. Acquire pairs with the release store that
    /// published it.
    #[inline(always)]
    pub(crate) fn load_value<'g>(&self, guard: &'g Guard) -> Option<&'g T> {
        unsafe { self.value.load(Acquire, guard).as_ref() }
    }
}

/// Retire an unlinked subtree. New readers can no longer reach it; current
/// readers are protected by their epoch pins, so every node and payload is
/// handed to the collector instead of being freed in place.
///
/// # Safety
///
/// The subtree must be unreachable from any root, and the caller must be the
/// single writer.
pub(crate) unsafe fn retire_subtree<T>(node: Shared<'_, Node<T>>, guard: &Guard) {
    let n = node.deref();
    for child in &n.children {
        let c = child.load(Relaxed, guard);
        if !c.is_null() {
            retire_subtree(c, guard);
        }
    }
    let value = n.value.load(Relaxed, guard);
    if !value.is_null() {
        guard.defer_destroy(value);
    }
    guard.defer_destroy(node);
}

/// Free a subtree immediately. Only callable when no reader can hold a
/// reference any longer (the trie is being dropped).
///
/// # Safety
///
/// The caller must have exclusive access to the whole trie.
pub(crate) unsafe fn drop_subtree_now<T>(node: Shared<'_, Node<T>>) {
    let guard = epoch::unprotected();
    let n = node.deref();
    for child in &n.children {
        let c = child.load(Relaxed, guard);
        if !c.is_null() {
            drop_subtree_now(c);
        }
    }
    let value = n.value.load(Relaxed, guard);
    if !value.is_null() {
        drop(value.into_owned());
    }
    drop(node.into_owned());
}
