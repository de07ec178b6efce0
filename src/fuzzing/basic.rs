use std::collections::{BTreeSet, HashMap};

use itertools::Itertools;

use super::*;

fn render_both(trie: &NetTrie<i32>) -> String {
    format!(
        "{}\n{}",
        trie.to_text_tree(Family::V4),
        trie.to_text_tree(Family::V6)
    )
}

qc!(insert_agrees_with_reference, _insert_agrees_with_reference);
fn _insert_agrees_with_reference(list: Vec<(TestNet, i32)>) -> bool {
    let mut trie = NetTrie::new();
    let mut reference = HashMap::new();
    for (TestNet(net), value) in list.iter().copied() {
        let vacant = !reference.contains_key(&net);
        if vacant {
            reference.insert(net, value);
        }
        if trie.try_insert(net, value) != vacant {
            return false;
        }
    }
    trie.len() == reference.len()
        && reference
            .iter()
            .all(|(net, value)| trie.get(net) == Some(value))
}

qc!(mixed_operations_agree_with_reference, _mixed_operations);
fn _mixed_operations(ops: Vec<Operation>) -> bool {
    let mut trie = NetTrie::new();
    let mut reference = HashMap::new();
    for op in ops {
        match op {
            Operation::Add(TestNet(net), value) => {
                let vacant = !reference.contains_key(&net);
                if vacant {
                    reference.insert(net, value);
                }
                if trie.try_insert(net, value) != vacant {
                    return false;
                }
            }
            Operation::Remove(TestNet(net)) => {
                if trie.try_remove(&net) != reference.remove(&net).is_some() {
                    return false;
                }
            }
        }
    }
    if trie.len() != reference.len() {
        return false;
    }
    if !reference
        .iter()
        .all(|(net, value)| trie.get(net) == Some(value))
    {
        return false;
    }
    // the tree is indistinguishable from one that never saw the removals
    let rebuilt: NetTrie<i32> = reference.iter().map(|(n, v)| (*n, *v)).collect();
    render_both(&trie) == render_both(&rebuilt)
}

qc!(shape_is_order_independent, _shape_is_order_independent);
fn _shape_is_order_independent(list: Vec<TestNet>) -> bool {
    let given: NetTrie<i32> = list.iter().map(|TestNet(n)| (*n, 0)).collect();
    let sorted: NetTrie<i32> = list
        .iter()
        .sorted()
        .map(|TestNet(n)| (*n, 0))
        .collect();
    let reversed: NetTrie<i32> = list
        .iter()
        .sorted()
        .rev()
        .map(|TestNet(n)| (*n, 0))
        .collect();
    render_both(&given) == render_both(&sorted)
        && render_both(&given) == render_both(&reversed)
}

qc!(longest_match_agrees_with_scan, _longest_match_agrees_with_scan);
fn _longest_match_agrees_with_scan(input: (Vec<TestNet>, Vec<TestNet>)) -> bool {
    let (list, probes) = input;
    let nets: Vec<Network> = list.iter().map(|TestNet(n)| *n).unique().collect();
    let trie: NetTrie<i32> = nets.iter().map(|n| (*n, 0)).collect();
    probes.iter().all(|TestNet(query)| {
        let expected = nets
            .iter()
            .filter(|n| n.contains_or_equal(query))
            .max_by_key(|n| n.prefix_len());
        let found = trie.try_get_match_net(query).map(|(n, _)| n);
        found.as_ref() == expected
    })
}

qc!(all_matches_are_ordered_and_complete, _all_matches);
fn _all_matches(input: (Vec<TestNet>, Vec<TestNet>)) -> bool {
    let (list, probes) = input;
    let nets: Vec<Network> = list.iter().map(|TestNet(n)| *n).unique().collect();
    let trie: NetTrie<i32> = nets.iter().map(|n| (*n, 0)).collect();
    probes.iter().all(|TestNet(query)| {
        let expected: Vec<Network> = nets
            .iter()
            .filter(|n| n.contains_or_equal(query))
            .copied()
            .sorted_by_key(|n| n.prefix_len())
            .collect();
        let found: Vec<Network> = trie
            .try_get_matches_net(query)
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        found == expected
    })
}

qc!(removal_reverts_insertion, _removal_reverts_insertion);
fn _removal_reverts_insertion(list: Vec<(TestNet, bool)>) -> bool {
    let entries: Vec<(Network, bool)> = list
        .iter()
        .map(|(TestNet(n), keep)| (*n, *keep))
        .unique_by(|(n, _)| *n)
        .collect();
    let mut trie: NetTrie<i32> = entries.iter().map(|(n, _)| (*n, 0)).collect();
    for (net, keep) in &entries {
        if !keep {
            trie.remove(net).unwrap();
        }
    }
    let kept: NetTrie<i32> = entries
        .iter()
        .filter(|(_, keep)| *keep)
        .map(|(n, _)| (*n, 0))
        .collect();
    render_both(&trie) == render_both(&kept)
}

qc!(summarize_is_minimal_and_covering, _summarize_properties);
fn _summarize_properties(list: Vec<TestNet>) -> bool {
    let nets: Vec<Network> = list.iter().map(|TestNet(n)| *n).collect();
    let summary = summarize(nets.clone());
    let summary_set: BTreeSet<Network> = summary.iter().copied().collect();

    // minimal: no duplicate entries and no complementary pair left
    if summary.len() != summary_set.len() {
        return false;
    }
    for net in &summary {
        if let Ok(sibling) = net.complement() {
            if summary_set.contains(&sibling) {
                return false;
            }
        }
    }
    // covering: every input network lies within some summarized network
    nets.iter().all(|net| {
        summary
            .iter()
            .any(|merged| merged.contains_or_equal(net))
    })
}

qc!(complement_is_an_involution, _complement_involution);
fn _complement_involution(net: TestNet) -> bool {
    let TestNet(net) = net;
    match net.complement() {
        Ok(sibling) => {
            sibling.complement() == Ok(net)
                && sibling.prefix_len() == net.prefix_len()
                && sibling != net
        }
        Err(err) => net.prefix_len() == 0 && err == NetError::NoComplement,
    }
}

qc!(supernet_is_smallest, _supernet_is_smallest);
fn _supernet_is_smallest(input: (TestNet, TestNet)) -> bool {
    let (TestNet(a), TestNet(b)) = input;
    if a.family() != b.family() {
        return true;
    }
    let supernet = Network::common_supernet(&a, &b);
    if !(supernet.contains_or_equal(&a) && supernet.contains_or_equal(&b)) {
        return false;
    }
    // no strictly smaller network covers both
    match a.prefix_len().min(b.prefix_len()) {
        0 => supernet.prefix_len() == 0,
        _ => {
            let finer = Network::new(a.addr(), supernet.prefix_len() + 1);
            match finer {
                Ok(finer) => {
                    !(finer.contains_or_equal(&a) && finer.contains_or_equal(&b))
                }
                // the supernet is one of the inputs at full length
                Err(_) => true,
            }
        }
    }
}
