use proptest::prelude::*;
use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::border::ScoreBorder;
use crate::error::Error;
use crate::skiplist::{Element, Node};
use crate::sorted_set::SortedSet;

fn elem(member: &str, score: f64) -> Element {
    Element {
        member: member.to_string(),
        score,
    }
}

fn abcd() -> SortedSet {
    let mut zset = SortedSet::with_seed("test-zset", 0x5eed);
    for (member, score) in [("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)].iter() {
        assert_eq!(zset.add(*member, *score), Ok(true));
    }
    zset
}

#[test]
fn test_id() {
    let zset = SortedSet::new("test-zset");
    assert_eq!(zset.id(), "test-zset".to_string());
    assert_eq!(zset.len(), 0);
    assert!(zset.is_empty());
}

#[test]
fn test_load_from() {
    let entries = vec![
        ("x".to_string(), 3.0),
        ("y".to_string(), 1.0),
        ("x".to_string(), 0.5),
    ];
    let zset = SortedSet::load_from("test-zset", entries.into_iter()).unwrap();
    assert_eq!(zset.len(), 2);
    assert_eq!(zset.get("x"), Some(elem("x", 0.5)));
    assert_eq!(zset.get_rank("x", false), Some(0));
    assert!(zset.validate().is_ok());

    let entries = vec![("z".to_string(), std::f64::NAN)];
    let res = SortedSet::load_from("test-zset", entries.into_iter());
    assert!(matches!(res, Err(Error::NotANumber(_))));
}

#[test]
fn test_add() {
    let mut zset = abcd();
    assert_eq!(zset.len(), 4);

    // same score, no change.
    assert_eq!(zset.add("b", 2.0), Ok(false));
    assert_eq!(zset.len(), 4);

    // new score moves the member.
    assert_eq!(zset.add("a", 10.0), Ok(false));
    assert_eq!(zset.len(), 4);
    assert_eq!(zset.get("a"), Some(elem("a", 10.0)));
    assert_eq!(zset.get_rank("a", false), Some(3));
    assert_eq!(zset.get_rank("b", false), Some(0));
    assert_eq!(zset.skiplist().len(), 4);
    assert!(zset.validate().is_ok());

    let err = Error::NotANumber("nan".to_string());
    assert_eq!(zset.add("nan", std::f64::NAN), Err(err));
    assert!(zset.get("nan").is_none());
    assert!(zset.validate().is_ok());
}

#[test]
fn test_remove() {
    let mut zset = abcd();
    assert!(zset.remove("b"));
    assert!(!zset.remove("b"));
    assert!(!zset.remove("zz"));
    assert_eq!(zset.len(), 3);
    assert!(zset.get("b").is_none());
    assert_eq!(zset.get_rank("c", false), Some(1));
    assert!(zset.validate().is_ok());
}

#[test]
fn test_get_rank() {
    let zset = abcd();
    assert_eq!(zset.get_rank("a", false), Some(0));
    assert_eq!(zset.get_rank("d", false), Some(3));
    assert_eq!(zset.get_rank("a", true), Some(3));
    assert_eq!(zset.get_rank("d", true), Some(0));
    assert_eq!(zset.get_rank("zz", false), None);
}

#[test]
fn test_range() {
    let zset = abcd();
    let items = zset.range(1, 3, false).unwrap();
    assert_eq!(items, vec![elem("b", 2.0), elem("c", 3.0)]);
    let items = zset.range(0, 2, true).unwrap();
    assert_eq!(items, vec![elem("d", 4.0), elem("c", 3.0)]);
    assert_eq!(zset.range(0, 4, false).unwrap().len(), 4);
    assert!(zset.range(2, 2, false).unwrap().is_empty());

    assert_eq!(zset.range(0, 5, false), Err(Error::RankOutOfRange(0, 5, 4)));
    assert_eq!(zset.range(3, 1, false), Err(Error::RankOutOfRange(3, 1, 4)));

    // consumer stops early.
    let mut seen = vec![];
    zset.for_each(0, 4, false, |node| {
        seen.push(node.member().to_string());
        seen.len() < 2
    })
    .unwrap();
    assert_eq!(seen, vec!["a", "b"]);
}

#[test]
fn test_range_count() {
    let zset = abcd();
    let (min, max) = (ScoreBorder::inclusive(2.0), ScoreBorder::inclusive(3.0));
    assert_eq!(zset.range_count(&min, &max), 2);
    let (min, max) = (ScoreBorder::exclusive(2.0), ScoreBorder::inclusive(3.0));
    assert_eq!(zset.range_count(&min, &max), 1);
    let (min, max) = (ScoreBorder::NEG_INF, ScoreBorder::POS_INF);
    assert_eq!(zset.range_count(&min, &max), 4);
    let (min, max) = (ScoreBorder::exclusive(4.0), ScoreBorder::POS_INF);
    assert_eq!(zset.range_count(&min, &max), 0);
    let (min, max) = (ScoreBorder::inclusive(3.0), ScoreBorder::inclusive(2.0));
    assert_eq!(zset.range_count(&min, &max), 0);
}

#[test]
fn test_range_by_score() {
    let zset = abcd();
    let min: ScoreBorder = "(1".parse().unwrap();
    let max: ScoreBorder = "+inf".parse().unwrap();

    let items = zset.range_by_score(&min, &max, 0, None, false);
    assert_eq!(items, vec![elem("b", 2.0), elem("c", 3.0), elem("d", 4.0)]);
    let items = zset.range_by_score(&min, &max, 1, Some(1), false);
    assert_eq!(items, vec![elem("c", 3.0)]);
    let items = zset.range_by_score(&min, &max, 0, Some(2), true);
    assert_eq!(items, vec![elem("d", 4.0), elem("c", 3.0)]);
    let items = zset.range_by_score(&min, &max, 5, None, false);
    assert!(items.is_empty());

    let mut seen = vec![];
    zset.for_each_by_score(&min, &max, 0, None, true, |node: &Node| {
        seen.push(node.member().to_string());
        false
    });
    assert_eq!(seen, vec!["d"]);
}

#[test]
fn test_remove_by_score() {
    let mut zset = abcd();
    let (min, max) = (ScoreBorder::inclusive(2.0), ScoreBorder::exclusive(4.0));
    assert_eq!(zset.remove_by_score(&min, &max), 2);
    assert_eq!(zset.len(), 2);
    assert!(zset.get("b").is_none() && zset.get("c").is_none());
    assert!(zset.validate().is_ok());
    assert_eq!(zset.remove_by_score(&min, &max), 0);
}

#[test]
fn test_remove_by_rank() {
    let mut zset = abcd();
    assert_eq!(zset.remove_by_rank(1, 3), 2);
    let items = zset.range(0, 2, false).unwrap();
    assert_eq!(items, vec![elem("a", 1.0), elem("d", 4.0)]);
    assert!(zset.get("b").is_none());
    assert!(zset.validate().is_ok());

    assert_eq!(zset.remove_by_rank(1, 100), 1);
    assert_eq!(zset.remove_by_rank(5, 10), 0);
    assert_eq!(zset.len(), 1);
    assert!(zset.validate().is_ok());
}

#[test]
fn test_remove_by_rank_huge_window() {
    let mut zset = abcd();
    assert_eq!(zset.remove_by_rank(usize::MAX, usize::MAX), 0);
    assert_eq!(zset.remove_by_rank(usize::MAX - 1, usize::MAX), 0);
    assert_eq!(zset.len(), 4);
    assert_eq!(zset.remove_by_rank(2, usize::MAX), 2);
    let items = zset.range(0, 2, false).unwrap();
    assert_eq!(items, vec![elem("a", 1.0), elem("b", 2.0)]);
    assert!(zset.validate().is_ok());
}

#[test]
fn test_pop_min() {
    let mut zset = abcd();
    assert_eq!(zset.pop_min(2), vec![elem("a", 1.0), elem("b", 2.0)]);
    assert_eq!(zset.len(), 2);
    assert!(zset.get("a").is_none());
    assert!(zset.pop_min(0).is_empty());
    assert_eq!(zset.pop_min(10).len(), 2);
    assert!(zset.is_empty());
    assert!(zset.pop_min(1).is_empty());
    assert!(zset.validate().is_ok());
}

#[test]
fn test_bulk_increasing() {
    let n = 1000;
    let mut zset = SortedSet::new("test-zset");
    for i in 0..n {
        assert_eq!(zset.add(format!("member-{}", n - i), i as f64), Ok(true));
    }
    let items = zset.range(0, n, false).unwrap();
    for (i, item) in items.iter().enumerate() {
        assert_eq!(item.member, format!("member-{}", n - i));
        assert_eq!(zset.get_rank(&item.member, false), Some(i));
    }
    let stats = zset.validate().unwrap();
    assert_eq!(stats.entries(), n);
}

#[test]
fn test_crud() {
    let size = 300_i64;
    let seed: u64 = rand::random();
    println!("seed {}", seed);
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut zset = SortedSet::with_seed("test-zset", rng.gen());
    let mut refs = RefSet::new();

    for _ in 0..10_000 {
        let member = format!("key{}", rng.gen_range(0..size));
        let score = rng.gen_range(-10..size / 3) as f64;
        match rng.gen_range(0..10) {
            0 | 1 | 2 => {
                let new = refs.add(&member, score);
                assert_eq!(zset.add(member, score), Ok(new));
            }
            3 => {
                assert_eq!(zset.remove(&member), refs.remove(&member).is_some());
            }
            4 => {
                let desc = rng.gen();
                assert_eq!(zset.get(&member), refs.get(&member));
                assert_eq!(zset.get_rank(&member, desc), refs.rank(&member, desc));
            }
            5 => {
                let len = refs.len();
                let start = rng.gen_range(0..=len);
                let stop = rng.gen_range(start..=len);
                let desc = rng.gen();
                let items = zset.range(start, stop, desc).unwrap();
                assert_eq!(items, refs.range(start, stop, desc));
            }
            6 => {
                let min = random_border(&mut rng, size / 3);
                let max = random_border(&mut rng, size / 3);
                let (offset, desc) = (rng.gen_range(0..5), rng.gen());
                let limit = if rng.gen() { Some(rng.gen_range(0..20)) } else { None };
                let items = zset.range_by_score(&min, &max, offset, limit, desc);
                assert_eq!(items, refs.range_by_score(&min, &max, offset, limit, desc));
                assert_eq!(zset.range_count(&min, &max), refs.within(&min, &max).len());
            }
            7 => {
                let min = random_border(&mut rng, size / 3);
                let max = ScoreBorder::inclusive(min.value + rng.gen_range(0..3) as f64);
                assert_eq!(zset.remove_by_score(&min, &max), refs.remove_by_score(&min, &max));
            }
            8 => {
                let start = rng.gen_range(0..=refs.len());
                let stop = start + rng.gen_range(0..4);
                assert_eq!(zset.remove_by_rank(start, stop), refs.remove_by_rank(start, stop));
            }
            9 => {
                let count = rng.gen_range(0..3);
                assert_eq!(zset.pop_min(count), refs.pop_min(count));
            }
            op => panic!("unreachable {}", op),
        }
        assert!(zset.validate().is_ok());
        assert_eq!(zset.len(), refs.len());
    }

    let items = zset.range(0, zset.len(), false).unwrap();
    assert_eq!(items, refs.entries);
}

proptest! {
    #[test]
    fn prop_order_and_rank(
        entries in prop::collection::vec(("[a-f]{1,3}", -20_i32..20), 0..200),
        removals in prop::collection::vec("[a-f]{1,3}", 0..50),
    ) {
        let mut zset = SortedSet::with_seed("prop-zset", 7);
        let mut refs = RefSet::new();
        for (member, score) in entries.iter() {
            let new = refs.add(member, *score as f64);
            prop_assert_eq!(zset.add(member.clone(), *score as f64), Ok(new));
        }
        for member in removals.iter() {
            prop_assert_eq!(zset.remove(member), refs.remove(member).is_some());
        }
        prop_assert!(zset.validate().is_ok());

        let len = zset.len();
        let items = zset.range(0, len, false).unwrap();
        prop_assert_eq!(&items, &refs.entries);
        for (i, item) in items.iter().enumerate() {
            let sl = zset.skiplist();
            prop_assert_eq!(sl.get_rank(&item.member, item.score), i + 1);
            let node = sl.get_by_rank(i + 1).unwrap();
            prop_assert_eq!(node.member(), item.member.as_str());
        }
        prop_assert!(zset.skiplist().get_by_rank(len + 1).is_none());
    }
}

include!("./ref_test.rs");
