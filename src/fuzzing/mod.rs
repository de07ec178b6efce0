//! Module for testing using fuzzing (quickcheck)

use std::fmt::Debug;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use quickcheck::{Arbitrary, Gen};

use crate::*;

mod basic;

/// An arbitrary network, drawn mostly from a dense IPv4 space so that
/// duplicates, siblings, and containment are common, with a tail of
/// uniformly random networks of both families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct TestNet(pub(crate) Network);

impl Arbitrary for TestNet {
    fn arbitrary(g: &mut Gen) -> Self {
        let dense = *g.choose(&[true, true, true, false]).unwrap();
        let net = if dense {
            let addr = Ipv4Addr::from((u16::arbitrary(g) as u32) << 16);
            Network::new(IpAddr::V4(addr), u8::arbitrary(g) % 17)
        } else if bool::arbitrary(g) {
            let addr = Ipv4Addr::from(u32::arbitrary(g));
            Network::new(IpAddr::V4(addr), u8::arbitrary(g) % 33)
        } else {
            let addr = Ipv6Addr::from(u128::arbitrary(g));
            Network::new(IpAddr::V6(addr), u8::arbitrary(g) % 129)
        };
        match net {
            Ok(net) => TestNet(net),
            Err(_) => unreachable!(),
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let net = self.0;
        Box::new(
            (0..net.prefix_len())
                .map(move |prefix| TestNet(Network::new(net.addr(), prefix).unwrap())),
        )
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub(crate) enum Operation {
    Add(TestNet, i32),
    Remove(TestNet),
}

impl Arbitrary for Operation {
    fn arbitrary(g: &mut Gen) -> Self {
        let net = TestNet::arbitrary(g);
        if *g
            .choose(&[
                true, true, true, true, true, true, true, false, false, false,
            ])
            .unwrap()
        {
            Operation::Add(net, i32::arbitrary(g))
        } else {
            Operation::Remove(net)
        }
    }
}

const DEFAULT_NUM_TESTS: usize = 1000;
const DEFAULT_GEN_SIZE: usize = 100;

fn proptest_runner<A: Arbitrary + Debug + PartialEq, F: Fn(A) -> bool>(f: F) {
    let num_tests: usize = std::env::var("QUICKCHECK_TESTS")
        .ok()
        .and_then(|x| x.parse::<usize>().ok())
        .unwrap_or(DEFAULT_NUM_TESTS);

    let gen_size: usize = std::env::var("QUICKCHECK_GENERATOR_SIZE")
        .ok()
        .and_then(|x| x.parse::<usize>().ok())
        .unwrap_or(DEFAULT_GEN_SIZE);

    let mut gen = Gen::new(gen_size);

    // sample all inputs
    for _ in 0..num_tests {
        let input = A::arbitrary(&mut gen);
        let input_c = input.clone();
        let success = f(input_c);
        if !success {
            shrink_failure(f, input)
        }
    }
}

fn shrink_failure<A: Arbitrary + Debug + PartialEq, F: Fn(A) -> bool>(f: F, input: A) -> ! {
    for i in input.shrink() {
        let i_c = i.clone();
        let success = f(i_c);
        if !success {
            shrink_failure(f, i)
        }
    }
    // if we reach this point, then all shrunken inputs work. Therefore, `input` is the
    // minimal input
    panic!(
        "[QUICKCHECK] Test case failed!\n  Minimal input:\n    {:?}",
        input
    );
}

#[allow(missing_docs)]
#[macro_export]
macro_rules! qc {
    ($name:ident, $f:ident) => {
        #[test]
        fn $name() {
            proptest_runner($f)
        }
    };
}
