//! Error conditions reported by networks and tries.

use std::fmt;

/// Possible errors returned by [`crate::Network`] and [`crate::NetTrie`]
/// operations. Only [`NetError::Duplicate`] and [`NetError::NotFound`] are
/// recoverable in the sense that a `try_*` twin exists for the operation
/// raising them; all other variants indicate an invalid argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetError {
    /// The exact network is already present in the trie.
    Duplicate,
    /// The requested network is not present (or, for a match operation, no
    /// stored network covers the query).
    NotFound,
    /// A dotted mask is not a canonical contiguous prefix mask.
    InvalidMask,
    /// A prefix length exceeds the address length of the family.
    InvalidPrefix,
    /// An address literal failed to parse and did not resolve as a hostname.
    MalformedAddress,
    /// Two operands belong to different address families.
    UnsupportedFamily,
    /// Block arithmetic moved the network outside the address space of its
    /// family.
    Overflow,
    /// The default route has no complementary network.
    NoComplement,
    /// The default route has no first or last host address.
    NoHosts,
    /// A network cannot be split into subnets longer than the address length.
    SplitTooFine,
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            NetError::Duplicate => {
                write!(f, "the network is already present in the trie")
            }
            NetError::NotFound => {
                write!(f, "the network cannot be found")
            }
            NetError::InvalidMask => {
                write!(f, "the mask is not a contiguous prefix mask")
            }
            NetError::InvalidPrefix => {
                write!(f, "the prefix length exceeds the address length")
            }
            NetError::MalformedAddress => {
                write!(f, "the address can neither be parsed nor resolved")
            }
            NetError::UnsupportedFamily => {
                write!(f, "the operands belong to different address families")
            }
            NetError::Overflow => {
                write!(f, "the operation overflows the address space")
            }
            NetError::NoComplement => {
                write!(f, "the default route has no complementary network")
            }
            NetError::NoHosts => {
                write!(f, "the default route has no host addresses")
            }
            NetError::SplitTooFine => {
                write!(
                    f,
                    "the requested subnet prefix exceeds the address length"
                )
            }
        }
    }
}

impl std::error::Error for NetError {}
