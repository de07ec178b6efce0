//! Single-writer / multi-reader contract: readers must always observe a
//! consistent tree, even while the writer churns the path above the node
//! they are looking for.

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use net_trie::{Network, SyncNetTrie};

fn churn_networks() -> Vec<Network> {
    let zero: IpAddr = "0.0.0.0".parse().unwrap();
    (1..=31)
        .flat_map(|prefix| {
            let net = Network::new(zero, prefix).unwrap();
            [net, net.complement().unwrap()]
        })
        .collect()
}

#[test]
fn reader_always_sees_the_pinned_host_route() {
    let trie: SyncNetTrie<&str> = SyncNetTrie::new();
    let target: Network = "0.0.0.0/32".parse().unwrap();
    trie.insert(target, "Success").unwrap();

    let churn = churn_networks();
    let cycles: usize = std::env::var("NET_TRIE_CHURN_CYCLES")
        .ok()
        .and_then(|x| x.parse().ok())
        .unwrap_or(10_000);

    let done = AtomicBool::new(false);
    std::thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..cycles {
                for net in &churn {
                    trie.insert(*net, "noise").unwrap();
                }
                for net in &churn {
                    trie.remove(net).unwrap();
                }
            }
            done.store(true, Ordering::Release);
        });

        for _ in 0..2 {
            scope.spawn(|| {
                let addr: IpAddr = "0.0.0.0".parse().unwrap();
                while !done.load(Ordering::Acquire) {
                    let guard = trie.guard();
                    let (net, value) = trie
                        .get_match(addr, &guard)
                        .expect("the host route must always match");
                    assert_eq!(net, target);
                    assert_eq!(*value, "Success");
                }
            });
        }
    });

    assert_eq!(trie.len(), 1);
    let guard = trie.guard();
    assert_eq!(trie.get(&target, &guard), Some(&"Success"));
}

#[test]
fn matches_stay_ordered_under_churn() {
    let trie: SyncNetTrie<u8> = SyncNetTrie::new();
    let target: Network = "0.0.0.0/32".parse().unwrap();
    trie.insert(target, 0).unwrap();

    let churn = churn_networks();
    let done = AtomicBool::new(false);
    std::thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..1_000 {
                for net in &churn {
                    trie.insert(*net, net.prefix_len()).unwrap();
                }
                for net in &churn {
                    trie.remove(net).unwrap();
                }
            }
            done.store(true, Ordering::Release);
        });

        scope.spawn(|| {
            let addr: IpAddr = "0.0.0.0".parse().unwrap();
            while !done.load(Ordering::Acquire) {
                let guard = trie.guard();
                let matches = trie.try_get_matches(addr, &guard);
                // general-to-specific, ending in the pinned host route
                assert!(matches
                    .windows(2)
                    .all(|w| w[0].0.prefix_len() < w[1].0.prefix_len()));
                assert_eq!(matches.last().map(|(net, _)| *net), Some(target));
            }
        });
    });
}
