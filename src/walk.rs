//! The downward tree walk shared by insertion and removal.

use std::sync::atomic::Ordering::Acquire;

use crossbeam_epoch::{Guard, Shared};

use crate::node::Node;
use crate::{NetTrie, Network};

/// One step of a walk: the node reached, and the child slot it occupies in
/// its parent (unused for the root).
pub(crate) struct WalkStep<'g, T> {
    pub(crate) node: Shared<'g, Node<T>>,
    pub(crate) slot: usize,
}

impl<T> Clone for WalkStep<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for WalkStep<'_, T> {}

impl<T> NetTrie<T> {
    /// Walk from the family root toward `target`, recording the path of
    /// nodes visited. The walk stops when the next child is absent, more
    /// specific than the target, or diverges from it; the last recorded node
    /// is where insertion and removal operate.
    ///
    /// The path always starts at the family root, which is never absent.
    pub(crate) fn walk<'g>(
        &self,
        target: &Network,
        guard: &'g Guard,
    ) -> Vec<WalkStep<'g, T>> {
        let root = self.root(target.family()).load(Acquire, guard);
        let mut path = vec![WalkStep {
            node: root,
            slot: 0,
        }];
        let mut cur = unsafe { root.deref() };
        while cur.prefix < target.prefix_len() {
            let slot = cur.slot(target.bits());
            let child = cur.children[slot].load(Acquire, guard);
            let next = match unsafe { child.as_ref() } {
                Some(next) => next,
                None => break,
            };
            if next.prefix > target.prefix_len() || !next.covers(target.bits()) {
                break;
            }
            path.push(WalkStep { node: child, slot });
            cur = next;
        }
        path
    }
}
