//! Code for removing networks from the trie.

use std::sync::atomic::Ordering::{AcqRel, Acquire, Relaxed, Release};

use crossbeam_epoch::{self as epoch, Guard, Shared};
use log::trace;

use crate::{NetError, NetTrie, Network};

impl<T> NetTrie<T> {
    /// Remove a network. Fails with [`NetError::NotFound`] unless the exact
    /// network was inserted before. Removal exactly reverts the matching
    /// insertion: the tree ends up indistinguishable from one where the
    /// network was never inserted.
    ///
    /// ```
    /// use net_trie::{NetError, NetTrie};
    ///
    /// let mut trie: NetTrie<u32> = NetTrie::new();
    /// trie.insert("10.0.0.0/8".parse()?, 1)?;
    /// assert_eq!(trie.remove(&"10.0.0.0/8".parse()?), Ok(()));
    /// assert_eq!(trie.remove(&"10.0.0.0/8".parse()?), Err(NetError::NotFound));
    /// assert!(trie.is_empty());
    /// # Ok::<(), net_trie::NetError>(())
    /// ```
    pub fn remove(&mut self, net: &Network) -> Result<(), NetError> {
        let guard = epoch::pin();
        self.remove_internal(net, &guard)
    }

    /// Remove a network, returning `false` if the exact network is not
    /// present.
    pub fn try_remove(&mut self, net: &Network) -> bool {
        self.remove(net).is_ok()
    }

    /// Perform the removal. The caller must be the single writer.
    ///
    /// The value node is first demoted to a routing node; the recorded walk
    /// path is then revisited toward the root, unlinking childless routing
    /// nodes and splicing out single-child ones. Each step publishes exactly
    /// one child-slot store, so concurrent readers always traverse a
    /// consistent shape.
    pub(crate) fn remove_internal(
        &self,
        net: &Network,
        guard: &Guard,
    ) -> Result<(), NetError> {
        let path = self.walk(net, guard);
        let last = unsafe { path[path.len() - 1].node.deref() };
        if last.net != *net {
            return Err(NetError::NotFound);
        }
        let value = last.value.swap(Shared::null(), AcqRel, guard);
        if value.is_null() {
            // present only as a routing node
            return Err(NetError::NotFound);
        }
        trace!("demoting {} to a routing node", net);
        unsafe { guard.defer_destroy(value) };
        self.count.fetch_sub(1, Relaxed);

        // collapse dead routing nodes, never touching the family root
        for i in (1..path.len()).rev() {
            let step = path[i];
            let node = unsafe { step.node.deref() };
            if !node.value.load(Acquire, guard).is_null() {
                break;
            }
            let left = node.children[0].load(Acquire, guard);
            let right = node.children[1].load(Acquire, guard);
            let replacement = match (left.is_null(), right.is_null()) {
                (true, true) => {
                    trace!("unlinking empty routing node {}", node.net);
                    Shared::null()
                }
                (false, true) => {
                    trace!("splicing single child past routing node {}", node.net);
                    left
                }
                (true, false) => {
                    trace!("splicing single child past routing node {}", node.net);
                    right
                }
                (false, false) => break,
            };
            let parent = unsafe { path[i - 1].node.deref() };
            parent.children[step.slot].store(replacement, Release);
            unsafe { guard.defer_destroy(step.node) };
        }
        Ok(())
    }
}
