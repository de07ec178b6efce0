//! Code for inserting networks, and the entry pattern.

use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};

use crossbeam_epoch::{self as epoch, Guard, Owned, Shared};
use log::trace;

use crate::node::Node;
use crate::{NetError, NetTrie, Network};

impl<T> NetTrie<T> {
    /// Insert a network with its payload. Fails with [`NetError::Duplicate`]
    /// if the exact network is already present; existing values are never
    /// replaced.
    ///
    /// ```
    /// use net_trie::{NetError, NetTrie};
    ///
    /// let mut trie: NetTrie<u32> = NetTrie::new();
    /// assert_eq!(trie.insert("192.168.1.0/24".parse()?, 1), Ok(()));
    /// assert_eq!(trie.insert("192.168.1.0/24".parse()?, 2), Err(NetError::Duplicate));
    /// assert_eq!(trie.len(), 1);
    /// # Ok::<(), net_trie::NetError>(())
    /// ```
    pub fn insert(&mut self, net: Network, value: T) -> Result<(), NetError> {
        let guard = epoch::pin();
        self.insert_internal(net, value, &guard).map(|_| ())
    }

    /// Insert a network with its payload, returning `false` (and dropping
    /// the payload) if the exact network is already present.
    pub fn try_insert(&mut self, net: Network, value: T) -> bool {
        self.insert(net, value).is_ok()
    }

    /// Get a reference to the value stored under the exact network,
    /// inserting the result of `default` first if the network is absent.
    ///
    /// ```
    /// use net_trie::NetTrie;
    ///
    /// let mut trie: NetTrie<Vec<u32>> = NetTrie::new();
    /// trie.get_or_insert_with("10.0.0.0/8".parse()?, Vec::new).push(1);
    /// trie.get_or_insert_with("10.0.0.0/8".parse()?, Vec::new).push(2);
    /// assert_eq!(trie.get(&"10.0.0.0/8".parse()?), Some(&vec![1, 2]));
    /// # Ok::<(), net_trie::NetError>(())
    /// ```
    pub fn get_or_insert_with<F: FnOnce() -> T>(
        &mut self,
        net: Network,
        default: F,
    ) -> &mut T {
        self.entry(net).or_insert_with(default)
    }

    /// Get the entry for a network, for in-place manipulation.
    ///
    /// ```
    /// use net_trie::NetTrie;
    ///
    /// let mut trie: NetTrie<u32> = NetTrie::new();
    /// *trie.entry("10.0.0.0/8".parse()?).or_insert(0) += 1;
    /// *trie.entry("10.0.0.0/8".parse()?).or_insert(0) += 1;
    /// assert_eq!(trie.get(&"10.0.0.0/8".parse()?), Some(&2));
    /// # Ok::<(), net_trie::NetError>(())
    /// ```
    pub fn entry(&mut self, net: Network) -> Entry<'_, T> {
        let guard = epoch::pin();
        let path = self.walk(&net, &guard);
        let last = path[path.len() - 1].node;
        let node = unsafe { last.deref() };
        if node.net == net && node.load_value(&guard).is_some() {
            let node = last.as_raw();
            Entry::Occupied(OccupiedEntry { _trie: self, node })
        } else {
            Entry::Vacant(VacantEntry { trie: self, net })
        }
    }

    /// Perform the insertion. The caller must be the single writer. Returns
    /// the (new or promoted) value node.
    ///
    /// Nodes are fully initialized before the single release-store that
    /// publishes them into their parent's slot, so concurrent readers see
    /// either the old shape or the new one.
    pub(crate) fn insert_internal<'g>(
        &self,
        net: Network,
        value: T,
        guard: &'g Guard,
    ) -> Result<Shared<'g, Node<T>>, NetError> {
        let path = self.walk(&net, guard);
        let last = path[path.len() - 1];
        let parent = unsafe { last.node.deref() };

        if parent.net == net {
            // exact hit: either a duplicate, or a routing node to promote
            if !parent.value.load(Acquire, guard).is_null() {
                return Err(NetError::Duplicate);
            }
            trace!("promoting routing node {} to a value node", net);
            parent.value.store(Owned::new(value), Release);
            self.count.fetch_add(1, Relaxed);
            return Ok(last.node);
        }

        let slot = parent.slot(net.bits());
        let existing = parent.children[slot].load(Acquire, guard);
        let inserted = match unsafe { existing.as_ref() } {
            None => {
                trace!("inserting {} as a new leaf under {}", net, parent.net);
                let node = Owned::new(Node::value(net, value)).into_shared(guard);
                parent.children[slot].store(node, Release);
                node
            }
            Some(child) if net.contains(&child.net) => {
                trace!("inserting {} above {}", net, child.net);
                let node = Node::value(net, value);
                node.children[node.slot(child.bits)].store(existing, Relaxed);
                let node = Owned::new(node).into_shared(guard);
                parent.children[slot].store(node, Release);
                node
            }
            Some(child) => {
                // siblings: introduce their smallest common supernet
                let supernet = Network::common_supernet(&net, &child.net);
                trace!(
                    "inserting {} next to {} under new routing node {}",
                    net,
                    child.net,
                    supernet
                );
                let routing = Node::routing(supernet);
                let node = Owned::new(Node::value(net, value)).into_shared(guard);
                debug_assert_ne!(routing.slot(net.bits()), routing.slot(child.bits));
                routing.children[routing.slot(net.bits())].store(node, Relaxed);
                routing.children[routing.slot(child.bits)].store(existing, Relaxed);
                parent.children[slot].store(Owned::new(routing), Release);
                node
            }
        };
        self.count.fetch_add(1, Relaxed);
        Ok(inserted)
    }
}

/// A mutable view into a single entry in a trie, which may either be vacant
/// or occupied.
pub enum Entry<'a, T> {
    /// The network is present as a value node.
    Occupied(OccupiedEntry<'a, T>),
    /// The network is absent (or present only as a routing node).
    Vacant(VacantEntry<'a, T>),
}

/// A mutable view into an occupied entry.
pub struct OccupiedEntry<'a, T> {
    // holds the exclusive borrow that keeps `node` alive and un-aliased
    _trie: &'a mut NetTrie<T>,
    node: *const Node<T>,
}

/// A mutable view into a vacant entry.
pub struct VacantEntry<'a, T> {
    trie: &'a mut NetTrie<T>,
    net: Network,
}

impl<'a, T> Entry<'a, T> {
    /// The network of this entry.
    pub fn key(&self) -> Network {
        match self {
            Entry::Occupied(e) => e.key(),
            Entry::Vacant(e) => e.key(),
        }
    }

    /// Insert `default` if the entry is vacant, and return a mutable
    /// reference to the value.
    pub fn or_insert(self, default: T) -> &'a mut T {
        self.or_insert_with(|| default)
    }

    /// Insert the result of `default` if the entry is vacant, and return a
    /// mutable reference to the value.
    pub fn or_insert_with<F: FnOnce() -> T>(self, default: F) -> &'a mut T {
        match self {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(default()),
        }
    }

    /// Modify the value in place if the entry is occupied.
    pub fn and_modify<F: FnOnce(&mut T)>(self, f: F) -> Self {
        match self {
            Entry::Occupied(mut e) => {
                f(e.get_mut());
                Entry::Occupied(e)
            }
            Entry::Vacant(e) => Entry::Vacant(e),
        }
    }
}

impl<'a, T: Default> Entry<'a, T> {
    /// Insert the default value if the entry is vacant, and return a mutable
    /// reference to the value.
    pub fn or_default(self) -> &'a mut T {
        self.or_insert_with(T::default)
    }
}

impl<'a, T> OccupiedEntry<'a, T> {
    fn node(&self) -> &Node<T> {
        // the node stays live for as long as the trie is mutably borrowed
        unsafe { &*self.node }
    }

    /// The network of this entry.
    pub fn key(&self) -> Network {
        self.node().net
    }

    /// A reference to the value.
    pub fn get(&self) -> &T {
        // exclusive borrow of the trie: the payload cannot be retired
        let guard = unsafe { epoch::unprotected() };
        unsafe { self.node().value.load(Acquire, guard).deref() }
    }

    /// A mutable reference to the value.
    pub fn get_mut(&mut self) -> &mut T {
        let guard = unsafe { epoch::unprotected() };
        let value = self.node().value.load(Acquire, guard);
        unsafe { &mut *(value.as_raw() as *mut T) }
    }

    /// Convert the entry into a mutable reference to the value, bound to the
    /// trie borrow.
    pub fn into_mut(self) -> &'a mut T {
        let guard = unsafe { epoch::unprotected() };
        let value = self.node().value.load(Acquire, guard);
        unsafe { &mut *(value.as_raw() as *mut T) }
    }
}

impl<'a, T> VacantEntry<'a, T> {
    /// The network of this entry.
    pub fn key(&self) -> Network {
        self.net
    }

    /// Insert a value, and return a mutable reference to it.
    pub fn insert(self, value: T) -> &'a mut T {
        let guard = epoch::pin();
        let node = match self.trie.insert_internal(self.net, value, &guard) {
            Ok(node) => node,
            // the entry was vacant and we hold the only write access
            Err(_) => unreachable!(),
        };
        let value = unsafe { node.deref() }.value.load(Acquire, &guard);
        unsafe { &mut *(value.as_raw() as *mut T) }
    }
}
