//! Address classification: historical IPv4 classes and the special-use
//! registries of both families.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::OnceLock;

use crate::family::Family;
use crate::{NetTrie, Network};

/// Historical IPv4 address class, derived from the leading address bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressClass {
    /// `0.0.0.0/1`: leading bit `0`.
    A,
    /// `128.0.0.0/2`: leading bits `10`.
    B,
    /// `192.0.0.0/3`: leading bits `110`.
    C,
    /// `224.0.0.0/4`: leading bits `1110`, multicast.
    D,
    /// `240.0.0.0/4`: leading bits `1111`, reserved.
    E,
}

impl AddressClass {
    /// Classify an IPv4 address by its leading bits.
    ///
    /// ```
    /// use net_trie::AddressClass;
    ///
    /// assert_eq!(AddressClass::of("10.0.0.1".parse().unwrap()), AddressClass::A);
    /// assert_eq!(AddressClass::of("172.16.0.1".parse().unwrap()), AddressClass::B);
    /// assert_eq!(AddressClass::of("192.168.1.1".parse().unwrap()), AddressClass::C);
    /// assert_eq!(AddressClass::of("224.0.0.1".parse().unwrap()), AddressClass::D);
    /// assert_eq!(AddressClass::of("255.255.255.255".parse().unwrap()), AddressClass::E);
    /// ```
    pub fn of(addr: Ipv4Addr) -> Self {
        match addr.octets()[0] {
            0..=127 => AddressClass::A,
            128..=191 => AddressClass::B,
            192..=223 => AddressClass::C,
            224..=239 => AddressClass::D,
            240..=255 => AddressClass::E,
        }
    }
}

/// Special-use allocation of an address, from the IANA special-purpose
/// registries of both families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Allocation {
    /// `0.0.0.0/8` and `::/128`.
    Unspecified,
    /// `10.0.0.0/8`, `172.16.0.0/12`, `192.168.0.0/16`.
    Private,
    /// `100.64.0.0/10`, carrier-grade NAT.
    SharedAddressSpace,
    /// `127.0.0.0/8` and `::1/128`.
    Loopback,
    /// `169.254.0.0/16` and `fe80::/10`.
    LinkLocal,
    /// `192.0.0.0/24`, IETF protocol assignments.
    IetfProtocol,
    /// `192.0.2.0/24`, `198.51.100.0/24`, `203.0.113.0/24`, `2001:db8::/32`.
    Documentation,
    /// `198.18.0.0/15`, device benchmarking.
    Benchmarking,
    /// `224.0.0.0/4` and `ff00::/8`.
    Multicast,
    /// `240.0.0.0/4`, reserved for future use.
    Reserved,
    /// `255.255.255.255/32`, limited broadcast.
    Broadcast,
    /// `::ffff:0:0/96`, IPv4-mapped IPv6.
    Ipv4Mapped,
    /// `64:ff9b::/96`, IPv4/IPv6 translation.
    Ipv4Translation,
    /// `100::/64`, discard-only.
    Discard,
    /// `fc00::/7`, unique local addresses.
    UniqueLocal,
    /// `2002::/16`, 6to4.
    SixToFour,
}

fn v4(octets: [u8; 4], prefix: u8) -> Network {
    Network::from_bits(u32::from_be_bytes(octets) as u128, prefix, Family::V4)
}

fn v6(segments: [u16; 8], prefix: u8) -> Network {
    let mut bits = 0u128;
    for segment in segments {
        bits = (bits << 16) | segment as u128;
    }
    Network::from_bits(bits, prefix, Family::V6)
}

static REGISTRY: OnceLock<NetTrie<Allocation>> = OnceLock::new();

impl Allocation {
    /// The special-use registry of both families as one trie, queried by
    /// longest match.
    pub fn registry() -> &'static NetTrie<Allocation> {
        REGISTRY.get_or_init(|| {
            use Allocation::*;
            let mut trie = NetTrie::new();
            let entries = [
                (v4([0, 0, 0, 0], 8), Unspecified),
                (v4([10, 0, 0, 0], 8), Private),
                (v4([100, 64, 0, 0], 10), SharedAddressSpace),
                (v4([127, 0, 0, 0], 8), Loopback),
                (v4([169, 254, 0, 0], 16), LinkLocal),
                (v4([172, 16, 0, 0], 12), Private),
                (v4([192, 0, 0, 0], 24), IetfProtocol),
                (v4([192, 0, 2, 0], 24), Documentation),
                (v4([192, 168, 0, 0], 16), Private),
                (v4([198, 18, 0, 0], 15), Benchmarking),
                (v4([198, 51, 100, 0], 24), Documentation),
                (v4([203, 0, 113, 0], 24), Documentation),
                (v4([224, 0, 0, 0], 4), Multicast),
                (v4([240, 0, 0, 0], 4), Reserved),
                (v4([255, 255, 255, 255], 32), Broadcast),
                (v6([0, 0, 0, 0, 0, 0, 0, 0], 128), Unspecified),
                (v6([0, 0, 0, 0, 0, 0, 0, 1], 128), Loopback),
                (v6([0, 0, 0, 0, 0, 0xffff, 0, 0], 96), Ipv4Mapped),
                (v6([0x64, 0xff9b, 0, 0, 0, 0, 0, 0], 96), Ipv4Translation),
                (v6([0x100, 0, 0, 0, 0, 0, 0, 0], 64), Discard),
                (v6([0x2001, 0xdb8, 0, 0, 0, 0, 0, 0], 32), Documentation),
                (v6([0x2002, 0, 0, 0, 0, 0, 0, 0], 16), SixToFour),
                (v6([0xfc00, 0, 0, 0, 0, 0, 0, 0], 7), UniqueLocal),
                (v6([0xfe80, 0, 0, 0, 0, 0, 0, 0], 10), LinkLocal),
                (v6([0xff00, 0, 0, 0, 0, 0, 0, 0], 8), Multicast),
            ];
            trie.extend(entries);
            trie
        })
    }

    /// The special-use allocation covering an address, if any.
    ///
    /// ```
    /// use net_trie::Allocation;
    ///
    /// assert_eq!(
    ///     Allocation::of("192.168.1.1".parse().unwrap()),
    ///     Some(Allocation::Private)
    /// );
    /// assert_eq!(
    ///     Allocation::of("2001:db8::1".parse().unwrap()),
    ///     Some(Allocation::Documentation)
    /// );
    /// assert_eq!(Allocation::of("9.9.9.9".parse().unwrap()), None);
    /// ```
    pub fn of(addr: IpAddr) -> Option<Allocation> {
        Self::registry()
            .try_get_match(addr)
            .map(|(_, allocation)| *allocation)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn classes() {
        assert_eq!(AddressClass::of(Ipv4Addr::new(0, 1, 2, 3)), AddressClass::A);
        assert_eq!(
            AddressClass::of(Ipv4Addr::new(127, 255, 255, 255)),
            AddressClass::A
        );
        assert_eq!(
            AddressClass::of(Ipv4Addr::new(191, 0, 0, 0)),
            AddressClass::B
        );
        assert_eq!(
            AddressClass::of(Ipv4Addr::new(223, 0, 0, 0)),
            AddressClass::C
        );
        assert_eq!(
            AddressClass::of(Ipv4Addr::new(239, 0, 0, 0)),
            AddressClass::D
        );
        assert_eq!(
            AddressClass::of(Ipv4Addr::new(240, 0, 0, 0)),
            AddressClass::E
        );
    }

    #[test]
    fn allocations() {
        let cases: &[(&str, Option<Allocation>)] = &[
            ("10.1.2.3", Some(Allocation::Private)),
            ("172.16.0.1", Some(Allocation::Private)),
            ("172.32.0.1", None),
            ("100.64.0.1", Some(Allocation::SharedAddressSpace)),
            ("127.0.0.1", Some(Allocation::Loopback)),
            ("169.254.1.1", Some(Allocation::LinkLocal)),
            ("198.51.100.7", Some(Allocation::Documentation)),
            ("233.1.2.3", Some(Allocation::Multicast)),
            ("255.255.255.255", Some(Allocation::Broadcast)),
            ("8.8.8.8", None),
            ("::1", Some(Allocation::Loopback)),
            ("::", Some(Allocation::Unspecified)),
            ("fe80::1", Some(Allocation::LinkLocal)),
            ("fd12::1", Some(Allocation::UniqueLocal)),
            ("ff02::1", Some(Allocation::Multicast)),
            ("2001:db8:1::1", Some(Allocation::Documentation)),
            ("2600::1", None),
        ];
        for (addr, expected) in cases {
            assert_eq!(
                Allocation::of(addr.parse().unwrap()),
                *expected,
                "allocation of {}",
                addr
            );
        }
    }

    #[test]
    fn broadcast_beats_reserved() {
        // 255.255.255.255 is inside 240.0.0.0/4; the longest match wins
        assert_eq!(
            Allocation::of("255.255.255.255".parse().unwrap()),
            Some(Allocation::Broadcast)
        );
        assert_eq!(
            Allocation::of("250.0.0.1".parse().unwrap()),
            Some(Allocation::Reserved)
        );
    }
}
