//! A writer-serializing wrapper with lock-free readers.

use std::net::IpAddr;
use std::sync::atomic::Ordering::Acquire;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crossbeam_epoch::{self as epoch, Guard};

use crate::{Family, NetError, NetTrie, Network};

/// A [`NetTrie`] shareable across threads: writers serialize on an internal
/// mutex, readers never take a lock.
///
/// Read operations take an epoch [`Guard`] (obtained from
/// [`SyncNetTrie::guard`]) and return references that live as long as the
/// guard: the guard keeps replaced nodes alive until every reader pinned
/// before the replacement has moved on.
///
/// ```
/// use net_trie::SyncNetTrie;
///
/// let trie: SyncNetTrie<&str> = SyncNetTrie::new();
/// trie.insert("10.0.0.0/8".parse()?, "rfc1918")?;
///
/// std::thread::scope(|scope| {
///     scope.spawn(|| {
///         let guard = trie.guard();
///         let (_, value) = trie.get_match("10.1.2.3".parse().unwrap(), &guard).unwrap();
///         assert_eq!(*value, "rfc1918");
///     });
/// });
/// # Ok::<(), net_trie::NetError>(())
/// ```
pub struct SyncNetTrie<T> {
    trie: NetTrie<T>,
    write_lock: Mutex<()>,
}

impl<T> SyncNetTrie<T> {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self::from(NetTrie::new())
    }

    /// Pin the current epoch for a sequence of read operations.
    pub fn guard(&self) -> Guard {
        epoch::pin()
    }

    /// Serialize writers. A poisoned lock is re-entered: writer sections
    /// publish their only structural change last, so no torn state survives
    /// a panicking writer.
    fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The number of networks stored in `self`.
    pub fn len(&self) -> usize {
        self.trie.len()
    }

    /// Returns `true` if the trie contains no networks.
    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }

    /// Insert a network with its payload. Fails with
    /// [`NetError::Duplicate`] if the exact network is already present.
    pub fn insert(&self, net: Network, value: T) -> Result<(), NetError> {
        let _write = self.write_guard();
        let guard = epoch::pin();
        self.trie.insert_internal(net, value, &guard).map(|_| ())
    }

    /// Insert a network with its payload, returning `false` if the exact
    /// network is already present.
    pub fn try_insert(&self, net: Network, value: T) -> bool {
        self.insert(net, value).is_ok()
    }

    /// Get the value stored under the exact network, inserting the result
    /// of `default` first if the network is absent.
    pub fn get_or_insert_with<'g, F: FnOnce() -> T>(
        &'g self,
        net: Network,
        default: F,
        guard: &'g Guard,
    ) -> (Network, &'g T) {
        let _write = self.write_guard();
        if let Some(found) = self.trie.get_internal(&net, guard) {
            return found;
        }
        match self.trie.insert_internal(net, default(), guard) {
            Ok(node) => {
                let node = unsafe { node.deref() };
                let value = unsafe { node.value.load(Acquire, guard).deref() };
                (node.net, value)
            }
            // the exact network was absent and we hold the writer lock
            Err(_) => unreachable!(),
        }
    }

    /// Remove a network. Fails with [`NetError::NotFound`] unless the exact
    /// network was inserted before.
    pub fn remove(&self, net: &Network) -> Result<(), NetError> {
        let _write = self.write_guard();
        let guard = epoch::pin();
        self.trie.remove_internal(net, &guard)
    }

    /// Remove a network, returning `false` if the exact network is not
    /// present.
    pub fn try_remove(&self, net: &Network) -> bool {
        self.remove(net).is_ok()
    }

    /// Remove all networks from both family trees.
    pub fn clear(&self) {
        let _write = self.write_guard();
        let guard = epoch::pin();
        self.trie.clear_internal(&guard);
    }

    /// Get the value stored under the exact network.
    pub fn get<'g>(&'g self, net: &Network, guard: &'g Guard) -> Option<&'g T> {
        self.trie.get_internal(net, guard).map(|(_, value)| value)
    }

    /// Check if the exact network is present.
    pub fn contains_key(&self, net: &Network) -> bool {
        let guard = epoch::pin();
        self.trie.get_internal(net, &guard).is_some()
    }

    /// Find the most specific network covering the address, with its value.
    /// Fails with [`NetError::NotFound`] if no stored network covers it.
    pub fn get_match<'g>(
        &'g self,
        addr: IpAddr,
        guard: &'g Guard,
    ) -> Result<(Network, &'g T), NetError> {
        self.try_get_match(addr, guard).ok_or(NetError::NotFound)
    }

    /// Like [`SyncNetTrie::get_match`], returning `None` instead of failing.
    pub fn try_get_match<'g>(
        &'g self,
        addr: IpAddr,
        guard: &'g Guard,
    ) -> Option<(Network, &'g T)> {
        self.trie.match_internal(&Network::host(addr), guard)
    }

    /// Find the most specific network containing or equal to the queried
    /// network, with its value.
    pub fn get_match_net<'g>(
        &'g self,
        net: &Network,
        guard: &'g Guard,
    ) -> Result<(Network, &'g T), NetError> {
        self.trie.match_internal(net, guard).ok_or(NetError::NotFound)
    }

    /// Like [`SyncNetTrie::get_match_net`], returning `None` instead of
    /// failing.
    pub fn try_get_match_net<'g>(
        &'g self,
        net: &Network,
        guard: &'g Guard,
    ) -> Option<(Network, &'g T)> {
        self.trie.match_internal(net, guard)
    }

    /// Collect every stored network covering the address, from least to
    /// most specific. Fails with [`NetError::NotFound`] if there is none.
    pub fn get_matches<'g>(
        &'g self,
        addr: IpAddr,
        guard: &'g Guard,
    ) -> Result<Vec<(Network, &'g T)>, NetError> {
        let matches = self.try_get_matches(addr, guard);
        if matches.is_empty() {
            Err(NetError::NotFound)
        } else {
            Ok(matches)
        }
    }

    /// Like [`SyncNetTrie::get_matches`], returning an empty list instead
    /// of failing.
    pub fn try_get_matches<'g>(
        &'g self,
        addr: IpAddr,
        guard: &'g Guard,
    ) -> Vec<(Network, &'g T)> {
        self.trie.matches_internal(&Network::host(addr), guard)
    }

    /// Collect every stored network containing or equal to the queried
    /// network, from least to most specific. Fails with
    /// [`NetError::NotFound`] if there is none.
    pub fn get_matches_net<'g>(
        &'g self,
        net: &Network,
        guard: &'g Guard,
    ) -> Result<Vec<(Network, &'g T)>, NetError> {
        let matches = self.try_get_matches_net(net, guard);
        if matches.is_empty() {
            Err(NetError::NotFound)
        } else {
            Ok(matches)
        }
    }

    /// Like [`SyncNetTrie::get_matches_net`], returning an empty list
    /// instead of failing.
    pub fn try_get_matches_net<'g>(
        &'g self,
        net: &Network,
        guard: &'g Guard,
    ) -> Vec<(Network, &'g T)> {
        self.trie.matches_internal(net, guard)
    }

    /// Render the tree of one family as text; see
    /// [`NetTrie::to_text_tree`].
    pub fn to_text_tree(&self, family: Family) -> String {
        self.trie.to_text_tree(family)
    }

    /// Unwrap the inner trie, ending the shared use.
    pub fn into_inner(self) -> NetTrie<T> {
        self.trie
    }
}

impl<T> Default for SyncNetTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<NetTrie<T>> for SyncNetTrie<T> {
    fn from(trie: NetTrie<T>) -> Self {
        Self {
            trie,
            write_lock: Mutex::new(()),
        }
    }
}
