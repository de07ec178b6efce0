//! Set algebra over plain collections of networks.

use std::collections::BTreeSet;

use crate::Network;

/// Coalesce a set of networks into a minimal equivalent set, merging pairs
/// of complementary siblings into their common supernet from the most to the
/// least specific prefix length. Exact duplicates collapse; distinct
/// overlapping networks pass through untouched. The result is sorted in
/// ascending order.
///
/// ```
/// use net_trie::{summarize, Network};
///
/// let networks: Vec<Network> = ["10.0.0.0/24", "10.0.1.0/24", "10.0.2.0/23"]
///     .iter()
///     .map(|s| s.parse())
///     .collect::<Result<_, _>>()?;
/// let summary = summarize(networks);
/// assert_eq!(summary, vec!["10.0.0.0/22".parse()?]);
/// # Ok::<(), net_trie::NetError>(())
/// ```
pub fn summarize<I: IntoIterator<Item = Network>>(networks: I) -> Vec<Network> {
    let mut set: BTreeSet<Network> = networks.into_iter().collect();
    for prefix in (1..=128u8).rev() {
        let level: Vec<Network> = set
            .iter()
            .filter(|net| net.prefix_len() == prefix)
            .copied()
            .collect();
        for net in level {
            if !set.contains(&net) {
                // already merged as the sibling of an earlier candidate
                continue;
            }
            let sibling = match net.complement() {
                Ok(sibling) => sibling,
                Err(_) => unreachable!(),
            };
            if set.contains(&sibling) {
                set.remove(&net);
                set.remove(&sibling);
                set.insert(Network::common_supernet(&net, &sibling));
            }
        }
    }
    set.into_iter().collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn nets(list: &[&str]) -> Vec<Network> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn merges_recursively() {
        assert_eq!(
            summarize(nets(&[
                "10.0.0.0/24",
                "10.0.1.0/24",
                "10.0.2.0/24",
                "10.0.3.0/24"
            ])),
            nets(&["10.0.0.0/22"])
        );
    }

    #[test]
    fn keeps_unmergeable() {
        assert_eq!(
            summarize(nets(&["10.0.1.0/24", "10.0.2.0/24"])),
            nets(&["10.0.1.0/24", "10.0.2.0/24"])
        );
    }

    #[test]
    fn drops_duplicates() {
        assert_eq!(
            summarize(nets(&["10.0.0.0/24", "10.0.0.0/24"])),
            nets(&["10.0.0.0/24"])
        );
    }

    #[test]
    fn families_stay_separate() {
        assert_eq!(
            summarize(nets(&["0.0.0.0/1", "128.0.0.0/1", "::/1", "8000::/1"])),
            nets(&["0.0.0.0/0", "::/0"])
        );
    }

    #[test]
    fn mixed_block() {
        // overlapping networks pass through; complementary pairs merge
        assert_eq!(
            summarize(nets(&[
                "10.0.8.0/23",
                "10.0.10.0/24",
                "10.0.11.0/24",
                "10.0.12.0/22",
                "10.0.128.0/18",
                "10.0.192.0/18",
                "100.0.0.100/32",
                "100.0.0.101/32",
                "100.0.0.102/32",
                "0.0.0.0/0",
            ])),
            nets(&[
                "0.0.0.0/0",
                "10.0.8.0/21",
                "10.0.128.0/17",
                "100.0.0.100/31",
                "100.0.0.102/32",
            ])
        );
    }
}
