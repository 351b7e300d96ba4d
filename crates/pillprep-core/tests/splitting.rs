use pillprep_core::model::Split;
use pillprep_core::sample::Keyed;
use pillprep_core::split::{stratified_split, SplitRatios};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Stem {
    id: String,
    key: String,
}

impl Keyed for Stem {
    fn class_key(&self) -> &str {
        &self.key
    }
}

fn items(counts: &[usize]) -> Vec<Stem> {
    let mut out = Vec::new();
    for (class, &count) in counts.iter().enumerate() {
        for i in 0..count {
            out.push(Stem {
                id: format!("k{class}_{i}"),
                key: format!("k{class}"),
            });
        }
    }
    out
}

#[test]
fn split_is_a_partition() {
    let all = items(&[10, 7, 1, 23, 4]);
    let ratios = SplitRatios::default();
    let out = stratified_split(&all, &ratios, &mut StdRng::seed_from_u64(5));
    assert_eq!(all.len(), out.len());

    let mut seen = HashSet::new();
    for (_, item) in out.iter() {
        assert!(seen.insert(item.id.clone()), "{} assigned twice", item.id);
    }
    let expected: HashSet<String> = all.iter().map(|i| i.id.clone()).collect();
    assert_eq!(expected, seen);
}

#[test]
fn group_sizes_follow_floored_ratios() {
    // Single class of 10: 8 train, 1 val, 1 test.
    let out = stratified_split(&items(&[10]), &SplitRatios::default(), &mut StdRng::seed_from_u64(1));
    assert_eq!(8, out.get(Split::Train).len());
    assert_eq!(1, out.get(Split::Val).len());
    assert_eq!(1, out.get(Split::Test).len());

    // Per-class flooring: 7 -> 5/0/2 and 3 -> 2/0/1.
    let out = stratified_split(&items(&[7, 3]), &SplitRatios::default(), &mut StdRng::seed_from_u64(1));
    assert_eq!(7, out.train.len());
    assert_eq!(0, out.val.len());
    assert_eq!(3, out.test.len());
}

#[test]
fn singleton_class_lands_in_test() {
    let out = stratified_split(&items(&[1]), &SplitRatios::default(), &mut StdRng::seed_from_u64(9));
    assert!(out.train.is_empty());
    assert!(out.val.is_empty());
    assert_eq!(1, out.test.len());
}

#[test]
fn empty_input_gives_empty_splits() {
    let out = stratified_split::<Stem, _>(&[], &SplitRatios::default(), &mut StdRng::seed_from_u64(9));
    assert!(out.is_empty());
}

#[test]
fn same_seed_same_split() {
    let all = items(&[12, 9, 30]);
    let ratios = SplitRatios::new(0.7, 0.2, 0.1).unwrap();
    let a = stratified_split(&all, &ratios, &mut StdRng::seed_from_u64(2024));
    let b = stratified_split(&all, &ratios, &mut StdRng::seed_from_u64(2024));
    assert_eq!(a, b);
}

#[test]
fn ratios_must_sum_to_one() {
    assert!(SplitRatios::new(0.8, 0.1, 0.1).is_ok());
    assert!(SplitRatios::new(1.0, 0.0, 0.0).is_ok());
    assert!(SplitRatios::new(0.8, 0.2, 0.1).unwrap_err().is_config());
    assert!(SplitRatios::new(1.2, -0.1, -0.1).is_err());
}
