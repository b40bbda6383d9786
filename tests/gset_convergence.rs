//! CRDT-law property tests for GSET (§8, properties 5-7).

use proptest::prelude::*;
use rot_gset::{GSet, Id};

#[derive(Clone, Debug)]
enum Op {
    Add(u64, String),
    Remove(u64, String),
}

fn apply(mut g: GSet<String>, ops: &[Op]) -> GSet<String> {
    for op in ops {
        g = match op {
            Op::Add(id, elem) => g.add(Id(*id), elem.clone()).unwrap_or(g),
            Op::Remove(id, elem) => g.remove(Id(*id), elem.clone()).unwrap_or(g),
        };
    }
    g
}

/// Builds a monotonic-id op sequence (each op's id strictly greater than the
/// last) within `start..start+count`, since both `add` and `remove` reject
/// non-monotonic ids (§7).
fn monotonic_ops(start: u64, count: u64) -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(
        prop_oneof![Just("x"), Just("y"), Just("z")].prop_map(|s: &str| s.to_string()),
        count as usize,
    )
        .prop_flat_map(move |elems| {
            proptest::collection::vec(any::<bool>(), elems.len()).prop_map(move |flags| {
                elems
                    .iter()
                    .zip(flags.iter())
                    .enumerate()
                    .map(|(i, (elem, &is_remove))| {
                        let id = start + i as u64;
                        if is_remove {
                            Op::Remove(id, elem.clone())
                        } else {
                            Op::Add(id, elem.clone())
                        }
                    })
                    .collect()
            })
        })
}

proptest! {
    #[test]
    fn commutativity(ops_a in monotonic_ops(1, 12), ops_b in monotonic_ops(1000, 12)) {
        let a = apply(GSet::new(3).unwrap(), &ops_a);
        let b = apply(GSet::new(3).unwrap(), &ops_b);
        let ab = GSet::merge(&a, &b);
        let ba = GSet::merge(&b, &a);
        prop_assert_eq!(ab.value(), ba.value());
    }

    #[test]
    fn associativity(ops_a in monotonic_ops(1, 10), ops_b in monotonic_ops(1000, 10), ops_c in monotonic_ops(2000, 10)) {
        let a = apply(GSet::new(3).unwrap(), &ops_a);
        let b = apply(GSet::new(3).unwrap(), &ops_b);
        let c = apply(GSet::new(3).unwrap(), &ops_c);

        let left = GSet::merge(&GSet::merge(&a, &b), &c);
        let right = GSet::merge(&a, &GSet::merge(&b, &c));
        prop_assert_eq!(left.value(), right.value());
    }

    #[test]
    fn idempotence(ops in monotonic_ops(1, 15)) {
        let a = apply(GSet::new(3).unwrap(), &ops);
        let merged = GSet::merge(&a, &a);
        prop_assert_eq!(a.value(), merged.value());
    }
}
