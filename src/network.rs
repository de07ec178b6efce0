//! The `Network` value type: a canonical (address, prefix) pair.

use std::fmt;
use std::net::{IpAddr, ToSocketAddrs};
use std::str::FromStr;

use crate::errors::NetError;
use crate::family::{addr_to_bits, bits_to_addr, Family};

/// An IPv4 or IPv6 network, stored as canonical address bits and a prefix
/// length.
///
/// The host part of the address is truncated on construction, so two networks
/// are equal iff their family, canonical address, and prefix length are
/// equal. Networks order IPv4 before IPv6, then by address, then by prefix
/// length.
///
/// ```
/// use net_trie::Network;
///
/// let net: Network = "192.168.1.1/24".parse()?;
/// assert_eq!(net.to_string(), "192.168.1.0/24");
/// assert_eq!(net.prefix_len(), 24);
/// # Ok::<(), net_trie::NetError>(())
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Network {
    family: Family,
    bits: u128,
    prefix: u8,
}

impl Network {
    /// Create a network from an address and a prefix length. The host part
    /// of the address is truncated.
    ///
    /// ```
    /// use net_trie::Network;
    ///
    /// let net = Network::new("10.1.2.3".parse()?, 16)?;
    /// assert_eq!(net.to_string(), "10.1.0.0/16");
    /// assert!(Network::new("10.1.2.3".parse()?, 33).is_err());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(addr: IpAddr, prefix: u8) -> Result<Self, NetError> {
        let family = Family::of(addr);
        if prefix > family.bits() {
            return Err(NetError::InvalidPrefix);
        }
        Ok(Self {
            family,
            bits: addr_to_bits(addr) & family.network_mask(prefix),
            prefix,
        })
    }

    /// Create a host route (`/32` or `/128`) for an address.
    pub fn host(addr: IpAddr) -> Self {
        let family = Family::of(addr);
        Self {
            family,
            bits: addr_to_bits(addr),
            prefix: family.bits(),
        }
    }

    /// Create a network from an address and a dotted mask. Fails with
    /// [`NetError::InvalidMask`] unless the mask is a contiguous prefix mask
    /// of the same family.
    ///
    /// ```
    /// use net_trie::Network;
    ///
    /// let net = Network::with_mask("10.1.2.3".parse()?, "255.255.0.0".parse()?)?;
    /// assert_eq!(net.to_string(), "10.1.0.0/16");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn with_mask(addr: IpAddr, mask: IpAddr) -> Result<Self, NetError> {
        let family = Family::of(addr);
        if Family::of(mask) != family {
            return Err(NetError::UnsupportedFamily);
        }
        let prefix = family.prefix_from_mask(addr_to_bits(mask))?;
        Self::new(addr, prefix)
    }

    /// The default route (`0.0.0.0/0` or `::/0`) of a family.
    pub fn zero(family: Family) -> Self {
        Self {
            family,
            bits: 0,
            prefix: 0,
        }
    }

    /// Construct directly from canonical bits. The caller guarantees that
    /// `bits` carries no host part and that `prefix` is in bounds.
    #[inline(always)]
    pub(crate) fn from_bits(bits: u128, prefix: u8, family: Family) -> Self {
        debug_assert!(prefix <= family.bits());
        debug_assert_eq!(bits & family.host_mask(prefix), 0);
        Self {
            family,
            bits,
            prefix,
        }
    }

    /// The address family.
    #[inline(always)]
    pub fn family(&self) -> Family {
        self.family
    }

    /// The canonical network address.
    #[inline(always)]
    pub fn addr(&self) -> IpAddr {
        bits_to_addr(self.bits, self.family)
    }

    /// The prefix length.
    #[inline(always)]
    pub fn prefix_len(&self) -> u8 {
        self.prefix
    }

    /// The address length of the family: 32 for IPv4, 128 for IPv6.
    #[inline(always)]
    pub fn max_prefix_len(&self) -> u8 {
        self.family.bits()
    }

    /// `true` for host routes (`/32` or `/128`).
    #[inline(always)]
    pub fn is_host(&self) -> bool {
        self.prefix == self.family.bits()
    }

    /// Canonical address bits in the low `max_prefix_len()` bits.
    #[inline(always)]
    pub(crate) fn bits(&self) -> u128 {
        self.bits
    }

    /// Network mask bits for this prefix length.
    #[inline(always)]
    pub(crate) fn mask_bits(&self) -> u128 {
        self.family.network_mask(self.prefix)
    }

    /// The network mask as an address, e.g. `255.255.255.0` for a `/24`.
    pub fn netmask(&self) -> IpAddr {
        bits_to_addr(self.mask_bits(), self.family)
    }

    /// The wildcard (host) mask as an address, e.g. `0.0.0.255` for a `/24`.
    pub fn wildcard(&self) -> IpAddr {
        bits_to_addr(self.family.host_mask(self.prefix), self.family)
    }

    /// The highest address of the network.
    pub fn broadcast(&self) -> IpAddr {
        bits_to_addr(self.bits | self.family.host_mask(self.prefix), self.family)
    }

    /// The number of addresses covered, saturating at `u128::MAX` for `::/0`.
    pub fn addr_count(&self) -> u128 {
        let shift = self.family.bits() - self.prefix;
        if shift == 128 {
            u128::MAX
        } else {
            1u128 << shift
        }
    }

    /// The number of usable host addresses: all addresses except network and
    /// broadcast, with the point-to-point (`/31`, `/127`) and host-route
    /// exceptions, and the full block for the default route.
    ///
    /// ```
    /// use net_trie::Network;
    ///
    /// assert_eq!("10.0.0.0/24".parse::<Network>()?.host_count(), 254);
    /// assert_eq!("10.0.0.0/31".parse::<Network>()?.host_count(), 2);
    /// assert_eq!("10.0.0.0/32".parse::<Network>()?.host_count(), 1);
    /// assert_eq!("0.0.0.0/0".parse::<Network>()?.host_count(), 1 << 32);
    /// # Ok::<(), net_trie::NetError>(())
    /// ```
    pub fn host_count(&self) -> u128 {
        let len = self.family.bits();
        if self.prefix == 0 {
            self.addr_count()
        } else if self.prefix == len {
            1
        } else if self.prefix == len - 1 {
            2
        } else {
            self.addr_count() - 2
        }
    }

    /// The first usable host address. Fails with [`NetError::NoHosts`] for
    /// the default route.
    pub fn first_host(&self) -> Result<IpAddr, NetError> {
        if self.prefix == 0 {
            Err(NetError::NoHosts)
        } else if self.prefix >= self.family.bits() - 1 {
            Ok(self.addr())
        } else {
            Ok(bits_to_addr(self.bits + 1, self.family))
        }
    }

    /// The last usable host address. Fails with [`NetError::NoHosts`] for
    /// the default route.
    pub fn last_host(&self) -> Result<IpAddr, NetError> {
        let broadcast = self.bits | self.family.host_mask(self.prefix);
        if self.prefix == 0 {
            Err(NetError::NoHosts)
        } else if self.prefix >= self.family.bits() - 1 {
            Ok(bits_to_addr(broadcast, self.family))
        } else {
            Ok(bits_to_addr(broadcast - 1, self.family))
        }
    }

    /// Check if `self` strictly contains `other`: same family, shorter
    /// prefix, and `other` inside the address range of `self`.
    ///
    /// ```
    /// use net_trie::Network;
    ///
    /// let a: Network = "10.0.0.0/8".parse()?;
    /// let b: Network = "10.128.0.0/9".parse()?;
    /// assert!(a.contains(&b));
    /// assert!(!b.contains(&a));
    /// assert!(!a.contains(&a));
    /// # Ok::<(), net_trie::NetError>(())
    /// ```
    #[inline(always)]
    pub fn contains(&self, other: &Self) -> bool {
        self.family == other.family
            && self.prefix < other.prefix
            && other.bits & self.mask_bits() == self.bits
    }

    /// Like [`Network::contains`], but also `true` when both networks are
    /// equal.
    #[inline(always)]
    pub fn contains_or_equal(&self, other: &Self) -> bool {
        self.family == other.family
            && self.prefix <= other.prefix
            && other.bits & self.mask_bits() == self.bits
    }

    /// Check if the address lies inside this network.
    #[inline(always)]
    pub fn contains_addr(&self, addr: IpAddr) -> bool {
        Family::of(addr) == self.family
            && addr_to_bits(addr) & self.mask_bits() == self.bits
    }

    /// The sibling network sharing the same prefix length and all but the
    /// final network bit. Fails with [`NetError::NoComplement`] for the
    /// default route.
    ///
    /// ```
    /// use net_trie::Network;
    ///
    /// let net: Network = "10.0.0.0/24".parse()?;
    /// assert_eq!(net.complement()?.to_string(), "10.0.1.0/24");
    /// assert_eq!(net.complement()?.complement()?, net);
    /// # Ok::<(), net_trie::NetError>(())
    /// ```
    pub fn complement(&self) -> Result<Self, NetError> {
        if self.prefix == 0 {
            return Err(NetError::NoComplement);
        }
        Ok(Self {
            family: self.family,
            bits: self.bits ^ (1u128 << (self.family.bits() - self.prefix)),
            prefix: self.prefix,
        })
    }

    /// The smallest network containing both `a` and `b`. Both networks must
    /// belong to the same family.
    ///
    /// ```
    /// use net_trie::Network;
    ///
    /// let a: Network = "10.0.0.0/24".parse()?;
    /// let b: Network = "10.0.1.0/24".parse()?;
    /// assert_eq!(Network::common_supernet(&a, &b).to_string(), "10.0.0.0/23");
    /// # Ok::<(), net_trie::NetError>(())
    /// ```
    pub fn common_supernet(a: &Self, b: &Self) -> Self {
        debug_assert_eq!(a.family, b.family);
        let family = a.family;
        if a.prefix == 0 || b.prefix == 0 {
            return Self::zero(family);
        }
        let x = a.bits ^ b.bits;
        if x == 0 {
            return if a.prefix <= b.prefix { *a } else { *b };
        }
        let diverge = 128 - x.leading_zeros() as u8;
        let prefix = (family.bits() - diverge).min(a.prefix).min(b.prefix);
        Self {
            family,
            bits: a.bits & family.network_mask(prefix),
            prefix,
        }
    }

    /// The network `count` blocks of `addr_count()` addresses after `self`.
    /// Fails with [`NetError::Overflow`] when the result leaves the address
    /// space of the family.
    ///
    /// ```
    /// use net_trie::Network;
    ///
    /// let net: Network = "10.0.0.0/24".parse()?;
    /// assert_eq!(net.checked_add(2)?.to_string(), "10.0.2.0/24");
    /// assert!("255.255.255.0/24".parse::<Network>()?.checked_add(1).is_err());
    /// # Ok::<(), net_trie::NetError>(())
    /// ```
    pub fn checked_add(&self, count: u128) -> Result<Self, NetError> {
        let shift = self.family.bits() - self.prefix;
        if shift == 128 {
            return if count == 0 { Ok(*self) } else { Err(NetError::Overflow) };
        }
        let bits = count
            .checked_mul(1u128 << shift)
            .and_then(|step| self.bits.checked_add(step))
            .ok_or(NetError::Overflow)?;
        if bits & !self.family.network_mask(self.family.bits()) != 0 {
            return Err(NetError::Overflow);
        }
        Ok(Self {
            family: self.family,
            bits,
            prefix: self.prefix,
        })
    }

    /// The network `count` blocks before `self`. Fails with
    /// [`NetError::Overflow`] when the result would precede address zero.
    pub fn checked_sub(&self, count: u128) -> Result<Self, NetError> {
        let shift = self.family.bits() - self.prefix;
        if shift == 128 {
            return if count == 0 { Ok(*self) } else { Err(NetError::Overflow) };
        }
        let bits = count
            .checked_mul(1u128 << shift)
            .and_then(|step| self.bits.checked_sub(step))
            .ok_or(NetError::Overflow)?;
        Ok(Self {
            family: self.family,
            bits,
            prefix: self.prefix,
        })
    }

    /// Split into the subnets of prefix length `new_prefix` covering `self`,
    /// in ascending order. Fails with [`NetError::SplitTooFine`] when
    /// `new_prefix` exceeds the address length, and with
    /// [`NetError::InvalidPrefix`] when it is shorter than the prefix of
    /// `self`.
    ///
    /// ```
    /// use net_trie::Network;
    ///
    /// let net: Network = "10.0.0.0/22".parse()?;
    /// let subnets: Vec<String> = net.subnets(24)?.map(|n| n.to_string()).collect();
    /// assert_eq!(
    ///     subnets,
    ///     ["10.0.0.0/24", "10.0.1.0/24", "10.0.2.0/24", "10.0.3.0/24"]
    /// );
    /// # Ok::<(), net_trie::NetError>(())
    /// ```
    pub fn subnets(&self, new_prefix: u8) -> Result<Subnets, NetError> {
        if new_prefix > self.family.bits() {
            return Err(NetError::SplitTooFine);
        }
        if new_prefix < self.prefix {
            return Err(NetError::InvalidPrefix);
        }
        let shift = (self.family.bits() - new_prefix) as u32;
        let last = (self.bits | self.family.host_mask(self.prefix))
            & self.family.network_mask(new_prefix);
        Ok(Subnets {
            family: self.family,
            prefix: new_prefix,
            step: 1u128.checked_shl(shift).unwrap_or(0),
            next: Some(self.bits),
            last,
        })
    }

    /// Subtract a strictly contained network, returning the minimal set of
    /// networks covering the rest of `self`, in ascending order. Fails with
    /// [`NetError::NotFound`] when `other` is not strictly contained.
    ///
    /// ```
    /// use net_trie::Network;
    ///
    /// let net: Network = "10.0.0.0/24".parse()?;
    /// let rest = net.exclude(&"10.0.0.64/26".parse()?)?;
    /// let rest: Vec<String> = rest.iter().map(|n| n.to_string()).collect();
    /// assert_eq!(rest, ["10.0.0.0/26", "10.0.0.128/25"]);
    /// # Ok::<(), net_trie::NetError>(())
    /// ```
    pub fn exclude(&self, other: &Self) -> Result<Vec<Self>, NetError> {
        if self.family != other.family {
            return Err(NetError::UnsupportedFamily);
        }
        if !self.contains(other) {
            return Err(NetError::NotFound);
        }
        let mut rest = Vec::with_capacity((other.prefix - self.prefix) as usize);
        let mut cur = *self;
        while cur != *other {
            let half = Self::from_bits(cur.bits, cur.prefix + 1, cur.family);
            let sibling = match half.complement() {
                Ok(s) => s,
                Err(_) => unreachable!(),
            };
            if half.contains_or_equal(other) {
                rest.push(sibling);
                cur = half;
            } else {
                rest.push(half);
                cur = sibling;
            }
        }
        rest.sort();
        Ok(rest)
    }
}

/// Iterator over the subnets of a network, created by [`Network::subnets`].
#[derive(Clone, Debug)]
pub struct Subnets {
    family: Family,
    prefix: u8,
    step: u128,
    next: Option<u128>,
    last: u128,
}

impl Iterator for Subnets {
    type Item = Network;

    fn next(&mut self) -> Option<Network> {
        let bits = self.next?;
        self.next = if bits == self.last {
            None
        } else {
            Some(bits + self.step)
        };
        Some(Network::from_bits(bits, self.prefix, self.family))
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr(), self.prefix)
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Parse an address literal, falling back to hostname resolution. Names map
/// to the first resolved address.
fn resolve(s: &str) -> Result<IpAddr, NetError> {
    if let Ok(addr) = s.parse::<IpAddr>() {
        return Ok(addr);
    }
    (s, 0u16)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .map(|sock| sock.ip())
        .ok_or(NetError::MalformedAddress)
}

impl FromStr for Network {
    type Err = NetError;

    /// Parse `A/p`, `A mask`, or a bare address `A` (implying a host route).
    /// An address literal that fails to parse is resolved as a hostname.
    ///
    /// ```
    /// use net_trie::Network;
    ///
    /// assert_eq!("10.0.0.1/8".parse::<Network>()?.to_string(), "10.0.0.0/8");
    /// assert_eq!(
    ///     "10.0.0.1 255.0.0.0".parse::<Network>()?.to_string(),
    ///     "10.0.0.0/8"
    /// );
    /// assert_eq!("10.0.0.1".parse::<Network>()?.to_string(), "10.0.0.1/32");
    /// assert_eq!("2001:db8::/32".parse::<Network>()?.to_string(), "2001:db8::/32");
    /// # Ok::<(), net_trie::NetError>(())
    /// ```
    fn from_str(s: &str) -> Result<Self, NetError> {
        let s = s.trim();
        if let Some((addr, prefix)) = s.split_once('/') {
            let prefix = prefix
                .trim()
                .parse::<u8>()
                .map_err(|_| NetError::InvalidPrefix)?;
            Self::new(resolve(addr.trim())?, prefix)
        } else if let Some((addr, mask)) = s.split_once(char::is_whitespace) {
            let mask = mask
                .trim()
                .parse::<IpAddr>()
                .map_err(|_| NetError::InvalidMask)?;
            Self::with_mask(resolve(addr.trim())?, mask)
        } else {
            Ok(Self::host(resolve(s)?))
        }
    }
}

impl From<IpAddr> for Network {
    /// A bare address converts to its host route.
    fn from(addr: IpAddr) -> Self {
        Self::host(addr)
    }
}

#[cfg(feature = "ipnet")]
mod ipnet_impls {
    use super::*;
    use ipnet::{IpNet, Ipv4Net, Ipv6Net};

    impl From<Ipv4Net> for Network {
        fn from(net: Ipv4Net) -> Self {
            Self::from_bits(
                u32::from(net.network()) as u128,
                net.prefix_len(),
                Family::V4,
            )
        }
    }

    impl From<Ipv6Net> for Network {
        fn from(net: Ipv6Net) -> Self {
            Self::from_bits(u128::from(net.network()), net.prefix_len(), Family::V6)
        }
    }

    impl From<IpNet> for Network {
        fn from(net: IpNet) -> Self {
            match net {
                IpNet::V4(n) => n.into(),
                IpNet::V6(n) => n.into(),
            }
        }
    }

    impl From<Network> for IpNet {
        fn from(net: Network) -> Self {
            match IpNet::new(net.addr(), net.prefix_len()) {
                Ok(n) => n,
                Err(_) => unreachable!(),
            }
        }
    }
}
