//! A value-less trie over networks, based on [`NetTrie`].

use std::fmt;
use std::net::IpAddr;

use crate::{Family, NetError, NetTrie, Network};

/// A set of networks, organized as a longest-prefix matching trie. This is
/// [`NetTrie`] with a unit payload.
///
/// ```
/// use net_trie::NetTrieSet;
///
/// let mut set = NetTrieSet::new();
/// set.insert("10.0.0.0/8".parse()?)?;
/// set.insert("10.1.0.0/16".parse()?)?;
/// assert_eq!(
///     set.get_match("10.1.2.3".parse().unwrap())?,
///     "10.1.0.0/16".parse()?
/// );
/// # Ok::<(), net_trie::NetError>(())
/// ```
#[derive(Clone, Default)]
pub struct NetTrieSet(NetTrie<()>);

impl NetTrieSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self(NetTrie::new())
    }

    /// Returns the number of networks stored in `self`.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set contains no networks.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Insert a network. Fails with [`NetError::Duplicate`] if the exact
    /// network is already present.
    pub fn insert(&mut self, net: Network) -> Result<(), NetError> {
        self.0.insert(net, ())
    }

    /// Insert a network, returning `false` if it is already present.
    pub fn try_insert(&mut self, net: Network) -> bool {
        self.0.try_insert(net, ())
    }

    /// Remove a network. Fails with [`NetError::NotFound`] unless the exact
    /// network was inserted before.
    pub fn remove(&mut self, net: &Network) -> Result<(), NetError> {
        self.0.remove(net)
    }

    /// Remove a network, returning `false` if it is not present.
    pub fn try_remove(&mut self, net: &Network) -> bool {
        self.0.try_remove(net)
    }

    /// Check whether the exact network is present, without longest-prefix
    /// matching.
    pub fn contains(&self, net: &Network) -> bool {
        self.0.contains_key(net)
    }

    /// The most specific network in the set covering the address. Fails
    /// with [`NetError::NotFound`] if no stored network covers it.
    pub fn get_match(&self, addr: IpAddr) -> Result<Network, NetError> {
        self.0.get_match(addr).map(|(net, _)| net)
    }

    /// Like [`NetTrieSet::get_match`], returning `None` instead of failing.
    pub fn try_get_match(&self, addr: IpAddr) -> Option<Network> {
        self.0.try_get_match(addr).map(|(net, _)| net)
    }

    /// The most specific network in the set containing or equal to the
    /// queried network.
    pub fn get_match_net(&self, net: &Network) -> Result<Network, NetError> {
        self.0.get_match_net(net).map(|(found, _)| found)
    }

    /// Like [`NetTrieSet::get_match_net`], returning `None` instead of
    /// failing.
    pub fn try_get_match_net(&self, net: &Network) -> Option<Network> {
        self.0.try_get_match_net(net).map(|(found, _)| found)
    }

    /// Every network in the set covering the address, from least to most
    /// specific.
    pub fn get_matches(&self, addr: IpAddr) -> Vec<Network> {
        self.0
            .try_get_matches(addr)
            .into_iter()
            .map(|(net, _)| net)
            .collect()
    }

    /// Remove all networks.
    pub fn clear(&mut self) {
        self.0.clear()
    }

    /// Render the tree of one family as text; see
    /// [`NetTrie::to_text_tree`].
    pub fn to_text_tree(&self, family: Family) -> String {
        self.0.to_text_tree(family)
    }

    #[cfg(feature = "serde")]
    pub(crate) fn inner(&self) -> &NetTrie<()> {
        &self.0
    }
}

impl FromIterator<Network> for NetTrieSet {
    fn from_iter<I: IntoIterator<Item = Network>>(iter: I) -> Self {
        Self(iter.into_iter().map(|net| (net, ())).collect())
    }
}

impl Extend<Network> for NetTrieSet {
    fn extend<I: IntoIterator<Item = Network>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(|net| (net, ())))
    }
}

impl fmt::Debug for NetTrieSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
