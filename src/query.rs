//! Exact and longest-prefix lookups.

use std::net::IpAddr;
use std::sync::atomic::Ordering::Acquire;

use crossbeam_epoch::{self as epoch, Guard};

use crate::{NetError, NetTrie, Network};

/// Extend a guard-scoped reference to the `&self` borrow of the trie.
///
/// # Safety
///
/// Sound only for the single-writer API of [`NetTrie`]: every write
/// operation takes `&mut self`, so while the returned reference (and the
/// `&self` borrow it is derived from) lives, no node or payload can be
/// retired.
pub(crate) unsafe fn extend<'a, T: ?Sized>(value: &T) -> &'a T {
    &*(value as *const T)
}

impl<T> NetTrie<T> {
    /// Get the value stored under the exact network.
    ///
    /// ```
    /// use net_trie::NetTrie;
    ///
    /// let mut trie: NetTrie<u32> = NetTrie::new();
    /// trie.insert("192.168.1.0/24".parse()?, 1)?;
    /// assert_eq!(trie.get(&"192.168.1.0/24".parse()?), Some(&1));
    /// assert_eq!(trie.get(&"192.168.0.0/23".parse()?), None);
    /// assert_eq!(trie.get(&"192.168.1.128/25".parse()?), None);
    /// # Ok::<(), net_trie::NetError>(())
    /// ```
    pub fn get(&self, net: &Network) -> Option<&T> {
        let guard = epoch::pin();
        self.get_internal(net, &guard)
            .map(|(_, value)| unsafe { extend(value) })
    }

    /// Get the stored network and value by matching exactly.
    pub fn get_key_value(&self, net: &Network) -> Option<(Network, &T)> {
        let guard = epoch::pin();
        self.get_internal(net, &guard)
            .map(|(found, value)| (found, unsafe { extend(value) }))
    }

    /// Check if the exact network is present.
    pub fn contains_key(&self, net: &Network) -> bool {
        let guard = epoch::pin();
        self.get_internal(net, &guard).is_some()
    }

    /// Find the most specific network covering the address, with its value.
    /// Fails with [`NetError::NotFound`] if no stored network covers it.
    ///
    /// ```
    /// use net_trie::NetTrie;
    ///
    /// let mut trie: NetTrie<u32> = NetTrie::new();
    /// trie.insert("10.0.0.0/8".parse()?, 8)?;
    /// trie.insert("10.1.0.0/16".parse()?, 16)?;
    /// let (net, value) = trie.get_match("10.1.2.3".parse().unwrap())?;
    /// assert_eq!(net, "10.1.0.0/16".parse()?);
    /// assert_eq!(*value, 16);
    /// let (net, _) = trie.get_match("10.200.0.1".parse().unwrap())?;
    /// assert_eq!(net, "10.0.0.0/8".parse()?);
    /// assert!(trie.get_match("11.0.0.1".parse().unwrap()).is_err());
    /// # Ok::<(), net_trie::NetError>(())
    /// ```
    pub fn get_match(&self, addr: IpAddr) -> Result<(Network, &T), NetError> {
        self.try_get_match(addr).ok_or(NetError::NotFound)
    }

    /// Like [`NetTrie::get_match`], returning `None` instead of failing.
    pub fn try_get_match(&self, addr: IpAddr) -> Option<(Network, &T)> {
        self.try_get_match_net(&Network::host(addr))
    }

    /// Find the most specific network that contains or equals the queried
    /// network, with its value. A query never matches networks more specific
    /// than itself: matching `10.0.0.0/25` against a trie holding
    /// `10.0.0.0/24` and `10.0.0.0/32` yields the `/24`.
    pub fn get_match_net(&self, net: &Network) -> Result<(Network, &T), NetError> {
        self.try_get_match_net(net).ok_or(NetError::NotFound)
    }

    /// Like [`NetTrie::get_match_net`], returning `None` instead of failing.
    pub fn try_get_match_net(&self, net: &Network) -> Option<(Network, &T)> {
        let guard = epoch::pin();
        self.match_internal(net, &guard)
            .map(|(found, value)| (found, unsafe { extend(value) }))
    }

    /// Collect every stored network covering the address, from least to most
    /// specific. Fails with [`NetError::NotFound`] if there is none.
    ///
    /// ```
    /// use net_trie::NetTrie;
    ///
    /// let mut trie: NetTrie<u32> = NetTrie::new();
    /// trie.insert("0.0.0.0/0".parse()?, 0)?;
    /// trie.insert("10.0.0.0/8".parse()?, 8)?;
    /// trie.insert("10.1.0.0/16".parse()?, 16)?;
    /// trie.insert("10.2.0.0/16".parse()?, 99)?;
    /// let matches = trie.get_matches("10.1.2.3".parse().unwrap())?;
    /// let prefixes: Vec<u8> = matches.iter().map(|(n, _)| n.prefix_len()).collect();
    /// assert_eq!(prefixes, [0, 8, 16]);
    /// # Ok::<(), net_trie::NetError>(())
    /// ```
    pub fn get_matches(&self, addr: IpAddr) -> Result<Vec<(Network, &T)>, NetError> {
        let matches = self.try_get_matches(addr);
        if matches.is_empty() {
            Err(NetError::NotFound)
        } else {
            Ok(matches)
        }
    }

    /// Like [`NetTrie::get_matches`], returning an empty list instead of
    /// failing.
    pub fn try_get_matches(&self, addr: IpAddr) -> Vec<(Network, &T)> {
        self.try_get_matches_net(&Network::host(addr))
    }

    /// Collect every stored network containing or equal to the queried
    /// network, from least to most specific. Fails with
    /// [`NetError::NotFound`] if there is none.
    pub fn get_matches_net(
        &self,
        net: &Network,
    ) -> Result<Vec<(Network, &T)>, NetError> {
        let matches = self.try_get_matches_net(net);
        if matches.is_empty() {
            Err(NetError::NotFound)
        } else {
            Ok(matches)
        }
    }

    /// Like [`NetTrie::get_matches_net`], returning an empty list instead of
    /// failing.
    pub fn try_get_matches_net(&self, net: &Network) -> Vec<(Network, &T)> {
        let guard = epoch::pin();
        self.matches_internal(net, &guard)
            .into_iter()
            .map(|(found, value)| (found, unsafe { extend(value) }))
            .collect()
    }

    /// Exact lookup: the terminal node of the walk must carry the queried
    /// network and hold a value.
    pub(crate) fn get_internal<'g>(
        &self,
        net: &Network,
        guard: &'g Guard,
    ) -> Option<(Network, &'g T)> {
        let path = self.walk(net, guard);
        let last = unsafe { path[path.len() - 1].node.deref() };
        if last.net == *net {
            last.load_value(guard).map(|value| (last.net, value))
        } else {
            None
        }
    }

    /// Longest-prefix match: walk downward recording the most recent value
    /// node, stopping when the next child is absent, diverges, or is more
    /// specific than the query.
    pub(crate) fn match_internal<'g>(
        &self,
        query: &Network,
        guard: &'g Guard,
    ) -> Option<(Network, &'g T)> {
        let mut cur = unsafe { self.root(query.family()).load(Acquire, guard).deref() };
        let mut best = None;
        loop {
            if let Some(value) = cur.load_value(guard) {
                best = Some((cur.net, value));
            }
            if cur.prefix >= query.prefix_len() {
                break;
            }
            let child = cur.children[cur.slot(query.bits())].load(Acquire, guard);
            match unsafe { child.as_ref() } {
                Some(next)
                    if next.prefix <= query.prefix_len()
                        && next.covers(query.bits()) =>
                {
                    cur = next
                }
                _ => break,
            }
        }
        best
    }

    /// The same walk as [`NetTrie::match_internal`], collecting every value
    /// node in root-to-leaf order.
    pub(crate) fn matches_internal<'g>(
        &self,
        query: &Network,
        guard: &'g Guard,
    ) -> Vec<(Network, &'g T)> {
        let mut cur = unsafe { self.root(query.family()).load(Acquire, guard).deref() };
        let mut matches = Vec::new();
        loop {
            if let Some(value) = cur.load_value(guard) {
                matches.push((cur.net, value));
            }
            if cur.prefix >= query.prefix_len() {
                break;
            }
            let child = cur.children[cur.slot(query.bits())].load(Acquire, guard);
            match unsafe { child.as_ref() } {
                Some(next)
                    if next.prefix <= query.prefix_len()
                        && next.covers(query.bits()) =>
                {
                    cur = next
                }
                _ => break,
            }
        }
        matches
    }
}
