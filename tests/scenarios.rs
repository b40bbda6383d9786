//! End-to-end scenarios S1-S6 from the design (§8), all with ROT size = 3.

use rot_gset::{GSet, Id};

fn s(n: &str) -> String {
    n.to_string()
}

#[test]
fn s1_plain_adds() {
    let g = GSet::new(3).unwrap();
    let g = g.add(Id(1), s("x")).unwrap();
    let g = g.add(Id(2), s("y")).unwrap();
    assert_eq!(g.value().into_vec(), vec![s("x"), s("y")]);
}

#[test]
fn s2_new_add_wins_over_tombstone() {
    let g = GSet::new(3).unwrap();
    let g = g.add(Id(1), s("x")).unwrap();
    let g = g.remove(Id(10), s("x")).unwrap();
    let g = g.add(Id(2), s("x")).unwrap();
    assert_eq!(g.value().into_vec(), vec![s("x")]);
}

#[test]
fn s3_independent_replicas_converge() {
    let a = GSet::new(3).unwrap().add(Id(1), s("x")).unwrap();
    let b = GSet::new(3).unwrap().add(Id(2), s("y")).unwrap();
    let merged = GSet::merge(&a, &b);
    assert_eq!(merged.value().into_vec(), vec![s("x"), s("y")]);
}

#[test]
fn s4_uncovered_add_survives_merge() {
    let a = GSet::new(3).unwrap();
    let a = a.add(Id(1), s("x")).unwrap();
    let a = a.remove(Id(10), s("x")).unwrap();

    let b = GSet::new(3).unwrap().add(Id(2), s("x")).unwrap();

    let merged = GSet::merge(&a, &b);
    assert_eq!(merged.value().into_vec(), vec![s("x")]);
}

#[test]
fn s5_seal_gc_and_reconverge() {
    let mut g = GSet::new(3).unwrap();
    // Three distinct adds, all removed, to seal a tombstone bucket.
    for i in 1..=3u64 {
        g = g.add(Id(i), format!("v{i}")).unwrap();
    }
    for i in 1..=3u64 {
        g = g.remove(Id(100 + i), format!("v{i}")).unwrap();
    }
    assert!(g.value().is_empty());

    let handles = g.gcable();
    assert_eq!(handles.len(), 1, "a full bucket of 3 tombstones should seal");

    let before_adds = g.value();
    let gced = g.gc(handles[0]).into_inner();
    assert_eq!(gced.value(), before_adds, "GC must not change observable value");

    // Merging the GC'd replica with a fresh, unrelated one still converges.
    let other = GSet::new(3).unwrap().add(Id(50), s("z")).unwrap();
    let merged = GSet::merge(&gced, &other);
    assert_eq!(merged.value().into_vec(), vec![s("z")]);
}

#[test]
fn s6_gc_unknown_handle_is_harmless() {
    use rot_gset::{Digest, Handle};

    let a = GSet::new(3).unwrap().add(Id(1), s("x")).unwrap();
    let bogus = Handle {
        newest: Id(9_999),
        digest: Digest([7u8; 20]),
    };
    let outcome = a.gc(bogus);
    assert!(!outcome.is_applied());
    let a_after = outcome.into_inner();
    assert_eq!(a_after.value(), a.value());

    let b = GSet::new(3).unwrap().add(Id(2), s("y")).unwrap();
    let merged = GSet::merge(&a_after, &b);
    assert_eq!(merged.value().into_vec(), vec![s("x"), s("y")]);
}
