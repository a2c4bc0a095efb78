use std::collections::HashSet;
use std::hash::Hash;

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use super::*;
use crate::intervalset::{self, ListId};
use crate::node::natural_order;

const CHR: &str = "chr1";

type Iv = Interval<&'static str, i32>;
type Set = IntervalSet<Iv, &'static str, i32>;

fn iv(beg: i32, end: i32) -> Iv {
    Interval::new(CHR, beg, end)
}

struct IntervalGenerator {
    rng: StdRng,
    unique: HashSet<Iv>,
    limit: i32,
}

impl IntervalGenerator {
    fn new(seed: [u8; 32]) -> Self {
        const LIMIT: i32 = 1000;
        Self::with_limit(seed, LIMIT)
    }

    fn with_limit(seed: [u8; 32], limit: i32) -> Self {
        Self {
            rng: SeedableRng::from_seed(seed),
            unique: HashSet::new(),
            limit,
        }
    }

    fn next(&mut self) -> Iv {
        let beg = self.rng.gen_range(0..self.limit - 1);
        let end = self.rng.gen_range((beg + 1)..self.limit);
        iv(beg, end)
    }

    fn next_unique(&mut self) -> Iv {
        let mut interval = self.next();
        while self.unique.contains(&interval) {
            interval = self.next();
        }
        self.unique.insert(interval.clone());
        interval
    }

    fn next_with_range(&mut self, range: i32) -> Iv {
        let beg = self.rng.gen_range(0..self.limit - 1);
        let end = self
            .rng
            .gen_range((beg + 1)..self.limit.min(beg + 1 + range));
        iv(beg, end)
    }
}

impl<P, Ix> IntervalSet<P, &'static str, i32, Ix>
where
    P: Eq + Hash,
    Ix: IndexType,
{
    /// 1. No stored interval is empty and all share the set's namespace.
    /// 2. Every list is sorted by (beg, end) and its ends never decrease.
    /// 3. No entry contains a sibling.
    /// 4. Every entry lies strictly within the record owning its list.
    /// 5. `len` counts every reachable record.
    fn check_invariants(&self) {
        let count = self.check_list(None, None);
        assert_eq!(count, self.len());
        assert_eq!(self.iter().count(), self.len());
    }

    fn check_list(&self, list: ListId<Ix>, owner: Option<&Iv>) -> usize {
        let nodes = self.list(list).as_slice();
        let mut count = 0;
        for (i, node) in nodes.iter().enumerate() {
            assert!(!node.interval.is_empty());
            assert_eq!(Some(&node.interval.namespace), self.namespace());
            if let Some(owner) = owner {
                assert!(node.interval.is_proper_subinterval(owner));
            }
            if i > 0 {
                let prev = &nodes[i - 1].interval;
                assert!(natural_order(prev, &node.interval).is_le());
                assert!(prev.end <= node.interval.end);
                assert!(!prev.is_proper_subinterval(&node.interval));
                assert!(!node.interval.is_proper_subinterval(prev));
            }
            count += 1;
            if let Some(slot) = node.sublist() {
                count += self.check_list(Some(slot), Some(&node.interval));
            }
        }
        count
    }
}

fn with_set_and_generator(test_fn: impl Fn(Set, IntervalGenerator)) {
    let seeds = vec![[0; 32], [1; 32], [2; 32]];
    for seed in seeds {
        let gen = IntervalGenerator::new(seed);
        let set = IntervalSet::new();
        test_fn(set, gen);
    }
}

fn sorted<'a>(intervals: impl IntoIterator<Item = &'a Iv>) -> Vec<Iv> {
    let mut v: Vec<_> = intervals.into_iter().cloned().collect();
    v.sort_unstable();
    v
}

fn covers<'a>(mut intervals: impl Iterator<Item = &'a Iv>, point: i32) -> bool {
    intervals.any(|i| i.beg <= point && point < i.end)
}

#[test]
fn build_keeps_every_distinct_interval() {
    with_set_and_generator(|_, mut gen| {
        let intervals: Vec<_> = std::iter::repeat_with(|| gen.next()).take(1000).collect();
        let set = Set::build(intervals.clone()).unwrap();
        set.check_invariants();

        let unique: HashSet<_> = intervals.iter().cloned().collect();
        assert_eq!(set.len(), unique.len());
        assert_eq!(sorted(&set), sorted(&unique));
    });
}

#[test]
fn build_drops_empty_intervals_and_duplicates() {
    let set = Set::build([iv(5, 5), iv(1, 4), iv(1, 4), iv(9, 3), iv(2, 3)]).unwrap();
    set.check_invariants();
    assert_eq!(set.len(), 2);
    assert_eq!(sorted(&set), vec![iv(1, 4), iv(2, 3)]);
}

#[test]
fn build_rejects_mixed_namespaces() {
    let res = Set::build([iv(0, 5), Interval::new("chr2", 1, 3)]);
    assert_eq!(res.err(), Some(Error::MixedNamespace));
}

#[test]
fn iterate_visits_containers_before_contents() {
    let set = Set::build([iv(10, 100), iv(200, 500), iv(0, 150), iv(20, 30), iv(120, 300)])
        .unwrap();
    set.check_invariants();
    let order: Vec<_> = set.iter().cloned().collect();
    assert_eq!(
        order,
        vec![iv(0, 150), iv(10, 100), iv(20, 30), iv(120, 300), iv(200, 500)]
    );
    let header: Vec<_> = set.header().cloned().collect();
    assert_eq!(header, vec![iv(0, 150), iv(120, 300), iv(200, 500)]);
}

#[test]
fn insort_keeps_containment() {
    with_set_and_generator(|mut set, mut gen| {
        let intervals: Vec<_> = std::iter::repeat_with(|| gen.next()).take(500).collect();
        for (n, i) in intervals.iter().enumerate() {
            set.insort(i.clone()).unwrap();
            if n % 25 == 0 {
                set.check_invariants();
            }
        }
        set.check_invariants();
        let unique: HashSet<_> = intervals.iter().cloned().collect();
        assert_eq!(set.len(), unique.len());
        assert_eq!(sorted(&set), sorted(&unique));
    });
}

#[test]
fn insort_then_remove_restores_set() {
    with_set_and_generator(|_, mut gen| {
        let intervals: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(300)
            .collect();
        let mut set = Set::build(intervals).unwrap();
        let before = sorted(&set);
        for _ in 0..100 {
            let extra = gen.next_unique();
            set.insort(extra.clone()).unwrap();
            assert!(set.contains(&extra));
            assert_eq!(set.remove(&extra), Ok(extra.clone()));
            assert!(!set.contains(&extra));
        }
        set.check_invariants();
        assert_eq!(set.len(), 300);
        assert_eq!(sorted(&set), before);
    });
}

#[test]
fn remove_every_record_keeps_containment() {
    with_set_and_generator(|mut set, mut gen| {
        let mut intervals: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(300)
            .collect();
        for i in intervals.clone() {
            set.insert(i).unwrap();
        }
        assert_eq!(set.len(), 300);
        intervals.shuffle(&mut gen.rng);
        for (n, i) in intervals.iter().enumerate() {
            assert_eq!(set.remove(i).as_ref(), Ok(i));
            if n % 20 == 0 {
                set.check_invariants();
            }
        }
        assert!(set.is_empty());
        assert_eq!(set.iter().count(), 0);
    });
}

#[test]
fn remove_non_exist_interval_will_do_nothing() {
    with_set_and_generator(|mut set, mut gen| {
        let intervals: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(300)
            .collect();
        set.update(intervals).unwrap();
        let to_remove: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(300)
            .collect();
        for i in to_remove {
            assert_eq!(set.remove(&i), Err(Error::NotFound));
            assert_eq!(set.discard(&i), None);
        }
        assert_eq!(set.len(), 300);
        set.check_invariants();
    });
}

#[test]
fn insert_reports_duplicates_insort_absorbs_them() {
    let mut set = Set::build([iv(0, 10), iv(2, 5)]).unwrap();
    assert_eq!(set.insert(iv(2, 5)), Err(Error::DuplicateKey));
    assert_eq!(set.insort(iv(2, 5)), Ok(()));
    assert_eq!(set.insort(iv(0, 10)), Ok(()));
    assert_eq!(set.len(), 2);
    set.check_invariants();
}

#[test]
fn insert_rejects_empty_and_foreign_intervals() {
    let mut set = Set::build([iv(0, 10)]).unwrap();
    assert_eq!(set.insert(iv(4, 4)), Err(Error::EmptyInterval));
    assert_eq!(
        set.insort(Interval::new("chr2", 0, 3)),
        Err(Error::MixedNamespace)
    );
    assert_eq!(set.len(), 1);
}

#[test]
fn insert_adopts_contained_siblings() {
    let mut set = Set::build([iv(10, 20), iv(15, 25), iv(30, 40), iv(50, 60)]).unwrap();
    set.insert(iv(5, 45)).unwrap();
    set.check_invariants();
    let header: Vec<_> = set.header().cloned().collect();
    assert_eq!(header, vec![iv(5, 45), iv(50, 60)]);
    assert_eq!(
        set.iter().cloned().collect::<Vec<_>>(),
        vec![iv(5, 45), iv(10, 20), iv(15, 25), iv(30, 40), iv(50, 60)]
    );
}

#[test]
fn remove_renests_children_under_surviving_siblings() {
    let mut set = Set::build([iv(0, 50), iv(20, 100), iv(25, 40), iv(60, 70)]).unwrap();
    set.check_invariants();
    assert_eq!(set.remove(&iv(20, 100)), Ok(iv(20, 100)));
    set.check_invariants();
    let order: Vec<_> = set.iter().cloned().collect();
    assert_eq!(order, vec![iv(0, 50), iv(25, 40), iv(60, 70)]);
}

type Tagged = (Iv, u32);

fn tagged_set() -> IntervalSet<Tagged, &'static str, i32> {
    IntervalSet::with_projection(|t: &Tagged| t.0.clone())
}

#[test]
fn records_with_identical_bounds_stay_siblings() {
    let mut set = tagged_set();
    set.insert((iv(5, 10), 1)).unwrap();
    set.insert((iv(5, 10), 2)).unwrap();
    set.insert((iv(6, 7), 3)).unwrap();
    set.insert((iv(0, 20), 4)).unwrap();
    set.insert((iv(5, 10), 5)).unwrap();
    set.check_invariants();
    assert_eq!(set.insert((iv(5, 10), 2)), Err(Error::DuplicateKey));
    assert_eq!(set.len(), 5);

    let header: Vec<_> = set.header().cloned().collect();
    assert_eq!(header, vec![(iv(0, 20), 4)]);

    assert_eq!(set.remove(&(iv(5, 10), 5)), Ok((iv(5, 10), 5)));
    set.check_invariants();
    assert!(set.contains(&(iv(6, 7), 3)));
    assert_eq!(set.pop(), Ok((iv(0, 20), 4)));
    set.check_invariants();
    assert_eq!(set.len(), 3);
}

#[test]
fn crowded_records_survive_churn() {
    for seed in [[3; 32], [4; 32], [5; 32]] {
        let mut gen = IntervalGenerator::with_limit(seed, 30);
        let mut set = tagged_set();
        let mut records: Vec<Tagged> = (0..400).map(|id| (gen.next(), id)).collect();
        for r in records.clone() {
            set.insert(r).unwrap();
        }
        set.check_invariants();
        assert_eq!(set.len(), 400);

        let built = IntervalSet::build_with(records.clone(), |t: &Tagged| t.0.clone()).unwrap();
        built.check_invariants();
        assert_eq!(built.len(), 400);

        records.shuffle(&mut gen.rng);
        for (n, r) in records.iter().enumerate() {
            assert!(set.contains(r));
            assert_eq!(set.remove(r).as_ref(), Ok(r));
            if n % 10 == 0 {
                set.check_invariants();
            }
        }
        assert!(set.is_empty());
    }
}

#[test]
fn tie_merge_keeps_queued_children() {
    let mut set = tagged_set();
    let records = [
        (iv(5, 14), 0),
        (iv(8, 12), 0),
        (iv(10, 12), 2),
        (iv(8, 12), 1),
        (iv(2, 13), 0),
        (iv(8, 11), 1),
        (iv(8, 13), 2),
    ];
    for r in records.clone() {
        set.insert(r).unwrap();
    }
    set.check_invariants();

    assert_eq!(set.remove(&(iv(2, 13), 0)), Ok((iv(2, 13), 0)));
    set.check_invariants();
    assert_eq!(set.len(), 6);
    for r in records.iter().filter(|r| r.0 != iv(2, 13)) {
        assert!(set.contains(r), "{:?} went missing", r);
    }
    let mut hits: Vec<_> = set.overlapping(&iv(8, 9)).cloned().collect();
    hits.sort_unstable();
    let mut expect: Vec<_> = records
        .iter()
        .filter(|r| r.0 != iv(2, 13) && r.0.overlaps(&iv(8, 9)))
        .cloned()
        .collect();
    expect.sort_unstable();
    assert_eq!(hits, expect);

    set.insert((iv(3, 4), 0)).unwrap();
    set.insert((iv(9, 10), 3)).unwrap();
    set.check_invariants();
    assert_eq!(set.len(), 8);
}

#[test]
fn interleaved_churn_matches_model() {
    for seed in [[0; 32], [1; 32], [2; 32]] {
        let mut gen = IntervalGenerator::with_limit(seed, 25);
        let mut set = tagged_set();
        let mut model: HashSet<Tagged> = HashSet::new();
        for step in 0..600 {
            match gen.rng.gen_range(0..10) {
                0..=5 => {
                    let record = (gen.next(), gen.rng.gen_range(0..4));
                    set.insort(record.clone()).unwrap();
                    model.insert(record);
                }
                6..=8 => {
                    let mut live: Vec<_> = model.iter().cloned().collect();
                    live.sort_unstable();
                    let record = match live.choose(&mut gen.rng) {
                        Some(r) if gen.rng.gen_bool(0.8) => r.clone(),
                        _ => (gen.next(), gen.rng.gen_range(0..4)),
                    };
                    let expect = if model.remove(&record) {
                        Ok(record.clone())
                    } else {
                        Err(Error::NotFound)
                    };
                    assert_eq!(set.remove(&record), expect, "step {}", step);
                }
                _ => match set.pop() {
                    Ok(record) => assert!(model.remove(&record), "step {}", step),
                    Err(e) => {
                        assert_eq!(e, Error::NotFound);
                        assert!(model.is_empty());
                    }
                },
            }

            set.check_invariants();
            assert_eq!(set.len(), model.len(), "step {}", step);
            for r in &model {
                assert!(set.contains(r), "step {}: {:?} went missing", step, r);
            }
            let query = gen.next();
            let mut hits: Vec<_> = set.overlapping(&query).cloned().collect();
            hits.sort_unstable();
            let mut expect: Vec<_> = model
                .iter()
                .filter(|r| r.0.overlaps(&query))
                .cloned()
                .collect();
            expect.sort_unstable();
            assert_eq!(hits, expect, "step {}", step);
        }
    }
}

#[test]
fn pop_takes_leftmost_header() {
    let mut set = Set::build([iv(10, 20), iv(0, 30), iv(5, 8), iv(40, 50)]).unwrap();
    assert_eq!(set.pop(), Ok(iv(0, 30)));
    set.check_invariants();
    assert_eq!(set.header().cloned().collect::<Vec<_>>(), vec![iv(5, 8), iv(10, 20), iv(40, 50)]);
    assert_eq!(set.pop(), Ok(iv(5, 8)));
    assert_eq!(set.pop(), Ok(iv(10, 20)));
    assert_eq!(set.pop(), Ok(iv(40, 50)));
    assert_eq!(set.pop(), Err(Error::NotFound));
}

#[test]
fn find_overlaps_is_ok() {
    with_set_and_generator(|_, mut gen| {
        let intervals: Vec<_> = std::iter::repeat_with(|| gen.next_with_range(50))
            .take(500)
            .collect();
        let set = Set::build(intervals.clone()).unwrap();
        let unique: HashSet<_> = intervals.into_iter().collect();
        let to_find: Vec<_> = std::iter::repeat_with(|| gen.next()).take(300).collect();

        for q in &to_find {
            let expect = sorted(unique.iter().filter(|i| i.overlaps(q)));
            assert_eq!(sorted(set.overlapping(q)), expect);
            assert_eq!(set.is_overlapping(q), !expect.is_empty());
        }

        for window in to_find.chunks(7) {
            let expect = sorted(
                unique
                    .iter()
                    .filter(|i| window.iter().any(|q| i.overlaps(q))),
            );
            assert_eq!(sorted(set.overlaps(window)), expect);
        }
    });
}

#[test]
fn overlap_pairs_reports_every_pair() {
    with_set_and_generator(|_, mut gen| {
        let intervals: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(200)
            .collect();
        let set = Set::build(intervals.clone()).unwrap();
        let queries: Vec<_> = std::iter::repeat_with(|| gen.next()).take(50).collect();

        let mut expect: Vec<_> = queries
            .iter()
            .flat_map(|q| {
                intervals
                    .iter()
                    .filter(move |i| i.overlaps(q))
                    .map(move |i| (q.clone(), i.clone()))
            })
            .collect();
        let mut pairs: Vec<_> = set
            .overlap_pairs(&queries)
            .map(|(q, i)| (q.clone(), i.clone()))
            .collect();
        expect.sort_unstable();
        pairs.sort_unstable();
        assert_eq!(pairs, expect);
    });
}

struct TestCaseOverlaps {
    queries: Vec<Iv>,
    expected: Vec<Iv>,
}

#[test]
fn overlaps_yields_containers_first() {
    let tests = [
        TestCaseOverlaps {
            queries: vec![iv(75, 120)],
            expected: vec![iv(0, 150), iv(10, 100)],
        },
        TestCaseOverlaps {
            queries: vec![iv(150, 200)],
            expected: vec![],
        },
        TestCaseOverlaps {
            queries: vec![iv(499, 1000)],
            expected: vec![iv(200, 500)],
        },
        TestCaseOverlaps {
            queries: vec![iv(5, 6), iv(50, 60), iv(52, 55)],
            expected: vec![iv(0, 150), iv(10, 100), iv(40, 70)],
        },
        TestCaseOverlaps {
            queries: vec![Interval::new("chr2", 0, 1000)],
            expected: vec![],
        },
    ];

    let set = Set::build([iv(10, 100), iv(200, 500), iv(0, 150), iv(40, 70)]).unwrap();
    for (i, tt) in tests.iter().enumerate() {
        let v: Vec<_> = set.overlaps(&tt.queries).cloned().collect();
        assert_eq!(v, tt.expected, "#{}: error", i);
    }
    assert!(Set::new().overlapping(&iv(0, 10)).next().is_none());
}

#[test]
fn nearest_and_header_bounds() {
    let set = Set::build([iv(0, 10), iv(20, 30), iv(22, 25), iv(40, 50)]).unwrap();
    assert_eq!(set.nearest(&iv(12, 14)), Some(&iv(0, 10)));
    assert_eq!(set.nearest(&iv(17, 19)), Some(&iv(20, 30)));
    assert_eq!(set.nearest(&iv(60, 61)), Some(&iv(40, 50)));
    assert_eq!(set.nearest(&Interval::new("chr2", 0, 1)), None);
    assert_eq!(set.nearest_overlap(&iv(25, 45)), Some(&iv(20, 30)));
    assert_eq!(set.nearest_overlap(&iv(12, 14)), None);
    assert_eq!(set.header_overlap_bounds([&iv(5, 6), &iv(25, 26)]), Some((0, 2)));
    assert_eq!(set.header_overlap_bounds([&iv(12, 14)]), None);
}

#[test]
fn accessors_follow_the_header() {
    let set = Set::build([iv(10, 20), iv(5, 8), iv(15, 40)]).unwrap();
    assert_eq!(set.namespace(), Some(&CHR));
    assert_eq!(set.beg(), Some(&5));
    assert_eq!(set.end(), Some(&40));
    assert_eq!(set.hull(), Some(iv(5, 40)));
    let empty = Set::new();
    assert_eq!(empty.namespace(), None);
    assert_eq!(empty.hull(), None);
}

#[test]
fn merge_is_ok() {
    let set = Set::build([iv(1, 50), iv(45, 80)]).unwrap();
    assert_eq!(sorted(&set.merge(false)), vec![iv(1, 80)]);

    let set = Set::build([iv(1, 10), iv(10, 20), iv(25, 30), iv(26, 27)]).unwrap();
    assert_eq!(sorted(&set.merge(false)), vec![iv(1, 10), iv(10, 20), iv(25, 30)]);
    assert_eq!(sorted(&set.merge(true)), vec![iv(1, 20), iv(25, 30)]);
}

#[test]
fn merge_covers_the_same_points() {
    with_set_and_generator(|_, mut gen| {
        let intervals: Vec<_> = std::iter::repeat_with(|| gen.next_with_range(20))
            .take(200)
            .collect();
        let set = Set::build(intervals.clone()).unwrap();
        for abutting in [false, true] {
            let merged = set.merge(abutting);
            merged.check_invariants();
            let ranges: Vec<_> = merged.iter().cloned().collect();
            for pair in ranges.windows(2) {
                assert!(!pair[0].overlaps(&pair[1]));
                if abutting {
                    assert!(!pair[0].is_abutting(&pair[1]));
                }
            }
            for point in 0..gen.limit {
                assert_eq!(
                    covers(ranges.iter(), point),
                    covers(intervals.iter(), point)
                );
            }
        }
    });
}

#[test]
fn complement_is_ok() {
    let set = Set::build([iv(100, 1000)]).unwrap();
    let gaps = set.complement(Some(0), Some(1048)).unwrap();
    assert_eq!(sorted(&gaps), vec![iv(0, 100), iv(1000, 1048)]);
    assert!(set.complement(None, None).unwrap().is_empty());
    assert_eq!(set.complement(Some(200), None).err(), Some(Error::Bounds));
    assert_eq!(set.complement(None, Some(999)).err(), Some(Error::Bounds));
    assert!(Set::new().complement(Some(0), Some(10)).unwrap().is_empty());
}

#[test]
fn complement_covers_the_missing_points() {
    with_set_and_generator(|_, mut gen| {
        let intervals: Vec<_> = std::iter::repeat_with(|| gen.next_with_range(20))
            .take(100)
            .collect();
        let set = Set::build(intervals.clone()).unwrap();
        let gaps = set.complement(Some(-1), Some(gen.limit + 1)).unwrap();
        gaps.check_invariants();
        for point in -1..=gen.limit {
            assert_ne!(covers(gaps.iter(), point), covers(intervals.iter(), point));
        }
    });
}

#[test]
fn intersection_matches_brute_force() {
    with_set_and_generator(|_, mut gen| {
        let left: Vec<_> = std::iter::repeat_with(|| gen.next_unique()).take(150).collect();
        let right: Vec<_> = std::iter::repeat_with(|| gen.next_unique()).take(150).collect();
        let a = Set::build(left.clone()).unwrap();
        let b = Set::build(right.clone()).unwrap();

        let result = a.intersection(&b, true).unwrap();
        result.check_invariants();
        let got: HashSet<_> = result.iter().cloned().collect();
        let expect: HashSet<_> = left
            .iter()
            .flat_map(|x| {
                right.iter().filter_map(move |y| {
                    x.intersect(y).map(|interval| Segment {
                        interval,
                        left: Some(x.clone()),
                        right: Some(y.clone()),
                    })
                })
            })
            .collect();
        assert_eq!(got, expect);

        let merged = a.intersection(&b, false).unwrap();
        assert!(merged.iter().all(|s| s.right.is_none() && s.left.is_some()));
        for point in 0..gen.limit {
            let in_both = covers(left.iter(), point) && covers(right.iter(), point);
            assert_eq!(covers(merged.iter().map(|s| &s.interval), point), in_both);
        }
    });
}

#[test]
fn union_matches_brute_force() {
    with_set_and_generator(|_, mut gen| {
        let left: Vec<_> = std::iter::repeat_with(|| gen.next_with_range(30))
            .take(100)
            .collect();
        let right: Vec<_> = std::iter::repeat_with(|| gen.next_with_range(30))
            .take(100)
            .collect();
        let a = Set::build(left).unwrap();
        let b = Set::build(right).unwrap();
        let xs: Vec<_> = a.iter().cloned().collect();
        let ys: Vec<_> = b.iter().cloned().collect();

        for abutting in [false, true] {
            let result = a.union(&b, abutting, true).unwrap();
            result.check_invariants();
            let got: HashSet<_> = result.iter().cloned().collect();

            let mut expect = HashSet::new();
            for x in &xs {
                for y in &ys {
                    if x.touches(y, abutting) {
                        expect.insert(Segment {
                            interval: x.hull(y),
                            left: Some(x.clone()),
                            right: Some(y.clone()),
                        });
                    }
                }
            }
            for x in xs.iter().filter(|x| !ys.iter().any(|y| x.touches(y, abutting))) {
                expect.insert(Segment {
                    interval: x.clone(),
                    left: Some(x.clone()),
                    right: None,
                });
            }
            for y in ys.iter().filter(|y| !xs.iter().any(|x| x.touches(y, abutting))) {
                expect.insert(Segment {
                    interval: y.clone(),
                    left: None,
                    right: Some(y.clone()),
                });
            }
            assert_eq!(got, expect);

            for point in 0..gen.limit {
                assert_eq!(
                    covers(result.iter().map(|s| &s.interval), point),
                    covers(xs.iter().chain(ys.iter()), point)
                );
            }
        }
    });
}

#[test]
fn union_without_pairwise_merges_other() {
    let a = Set::build([iv(0, 10), iv(30, 40)]).unwrap();
    let b = Set::build([iv(5, 15), iv(12, 20), iv(50, 60)]).unwrap();
    let result = a.union(&b, false, false).unwrap();
    let mut got: Vec<_> = result.iter().cloned().collect();
    got.sort_unstable_by(|x, y| natural_order(&x.interval, &y.interval));
    assert_eq!(
        got,
        vec![
            Segment {
                interval: iv(0, 20),
                left: Some(iv(0, 10)),
                right: None,
            },
            Segment {
                interval: iv(30, 40),
                left: Some(iv(30, 40)),
                right: None,
            },
            Segment {
                interval: iv(50, 60),
                left: None,
                right: None,
            },
        ]
    );
}

#[test]
fn union_rejects_foreign_namespace() {
    let a = Set::build([iv(0, 10)]).unwrap();
    let b = Set::build([Interval::new("chr2", 0, 10)]).unwrap();
    assert_eq!(a.union(&b, false, true).err(), Some(Error::MixedNamespace));
    assert!(a.intersection(&b, true).unwrap().is_empty());
    assert!(a.is_disjoint(&b));
}

#[test]
fn record_set_algebra_matches_hash_sets() {
    with_set_and_generator(|_, mut gen| {
        let shared: Vec<_> = std::iter::repeat_with(|| gen.next_unique()).take(50).collect();
        let only_a: Vec<_> = std::iter::repeat_with(|| gen.next_unique()).take(50).collect();
        let only_b: Vec<_> = std::iter::repeat_with(|| gen.next_unique()).take(50).collect();
        let a = Set::build(shared.iter().chain(&only_a).cloned()).unwrap();
        let b = Set::build(shared.iter().chain(&only_b).cloned()).unwrap();

        let diff = a.difference_set(&b).unwrap();
        diff.check_invariants();
        assert_eq!(sorted(&diff), sorted(&only_a));

        let both = a.intersection_set(&b).unwrap();
        both.check_invariants();
        assert_eq!(sorted(&both), sorted(&shared));

        let either = a.union_set(&b).unwrap();
        either.check_invariants();
        assert_eq!(either.len(), 150);

        let sym = a.symmetric_difference_set(&b).unwrap();
        sym.check_invariants();
        assert_eq!(sorted(&sym), sorted(only_a.iter().chain(&only_b)));

        assert!(both.is_subset(&a));
        assert!(either.is_superset(&b));
        assert!(!a.is_subset(&b));
        assert!(diff.is_disjoint_set(&b));
        assert!(!a.is_disjoint_set(&b));
        assert!(a.intersects(&b));

        let mut c = a.clone();
        c.difference_update_set(&b).unwrap();
        assert_eq!(sorted(&c), sorted(&only_a));
        c.union_update_set(&b).unwrap();
        assert_eq!(c.len(), 150);
        c.intersection_update_set(&a).unwrap();
        assert_eq!(sorted(&c), sorted(&a));
        c.symmetric_difference_update_set(&a).unwrap();
        assert!(c.is_empty());
    });
}

type Span = (i32, i32);

fn span_interval(&(beg, end): &Span) -> Iv {
    iv(beg, end)
}

#[test]
fn algebra_accepts_raw_payloads() {
    let a = Set::build([iv(0, 10), iv(20, 30)]).unwrap();
    let raw: Vec<Span> = vec![(5, 25), (40, 45)];
    let b = IntervalSet::build_with(raw.clone(), span_interval).unwrap();

    let direct: HashSet<_> = a.intersection(&b, true).unwrap().iter().cloned().collect();
    let coerced = a.intersection_with(raw.clone(), span_interval, true).unwrap();
    coerced.check_invariants();
    assert_eq!(coerced.iter().cloned().collect::<HashSet<_>>(), direct);
    assert_eq!(
        sorted(coerced.iter().map(|s| &s.interval)),
        vec![iv(5, 10), iv(20, 25)]
    );
    assert!(coerced.iter().all(|s| s.right == Some((5, 25))));

    let direct: HashSet<_> = a.union(&b, false, true).unwrap().iter().cloned().collect();
    let coerced = a.union_with(raw, span_interval, false, true).unwrap();
    coerced.check_invariants();
    assert_eq!(coerced.iter().cloned().collect::<HashSet<_>>(), direct);

    assert_eq!(
        a.intersection_with([iv(0, 5), Interval::new("chr2", 0, 5)], Iv::clone, true)
            .err(),
        Some(Error::MixedNamespace)
    );
    assert_eq!(
        a.union_with([Interval::new("chr2", 0, 5)], Iv::clone, false, true)
            .err(),
        Some(Error::MixedNamespace)
    );

    let more = [iv(20, 30), iv(50, 60)];
    assert_eq!(
        sorted(&a.union_set_from(more.clone()).unwrap()),
        vec![iv(0, 10), iv(20, 30), iv(50, 60)]
    );
    assert_eq!(sorted(&a.intersection_set_from(more.clone()).unwrap()), vec![iv(20, 30)]);
    assert_eq!(sorted(&a.difference_set_from(more.clone()).unwrap()), vec![iv(0, 10)]);
    assert_eq!(
        sorted(&a.symmetric_difference_set_from(more).unwrap()),
        vec![iv(0, 10), iv(50, 60)]
    );

    let mut tagged = tagged_set();
    tagged.insert((iv(0, 10), 1)).unwrap();
    let grown = tagged.union_set_from([(iv(2, 4), 2)]).unwrap();
    grown.check_invariants();
    assert!(grown.contains(&(iv(2, 4), 2)));
    assert_eq!(grown.overlapping(&iv(3, 4)).count(), 2);
}

#[test]
fn set_level_hull_predicates() {
    let outer = Set::build([iv(0, 10), iv(40, 50)]).unwrap();
    let inner = Set::build([iv(20, 30)]).unwrap();
    let crossing = Set::build([iv(5, 8), iv(30, 45)]).unwrap();
    let empty = Set::new();

    assert!(inner.is_subinterval(&outer, true, false));
    assert!(!inner.is_subinterval(&outer, true, true));
    assert!(crossing.is_subinterval(&outer, true, true));
    assert!(outer.is_superinterval(&crossing, true, true));
    assert!(!outer.is_superinterval(&inner, false, true));
    assert!(outer.is_subinterval(&outer, false, true));
    assert!(!outer.is_subinterval(&outer, true, false));
    assert!(!empty.is_subinterval(&outer, false, false));
    assert!(!outer.is_subinterval(&empty, false, false));

    let right = Set::build([iv(50, 55), iv(60, 70)]).unwrap();
    assert!(outer.is_abutting(&right));
    assert!(right.is_abutting(&outer));
    assert!(!outer.is_abutting(&inner));
    assert!(!outer.is_abutting(&empty));

    assert_eq!(outer.hull_with(&right), Some(iv(0, 70)));
    assert_eq!(outer.hull_with(&inner), Some(iv(0, 50)));
    assert_eq!(outer.hull_with(&empty), Some(iv(0, 50)));
    assert_eq!(empty.hull_with(&outer), None);

    let foreign = Set::build([Interval::new("chr2", 0, 100)]).unwrap();
    assert_eq!(outer.hull_with(&foreign), Some(iv(0, 50)));
    assert!(!foreign.is_subinterval(&outer, false, false));
    assert!(!foreign.is_abutting(&outer));
}

#[test]
fn update_variants_replace_the_set() {
    let mut set = Set::build([iv(0, 10), iv(5, 20), iv(30, 40)]).unwrap();
    set.merge_update(false);
    assert_eq!(sorted(&set), vec![iv(0, 20), iv(30, 40)]);

    set.complement_update(None, Some(50)).unwrap();
    assert_eq!(sorted(&set), vec![iv(20, 30), iv(40, 50)]);
    assert_eq!(set.complement_update(Some(25), None), Err(Error::Bounds));
    assert_eq!(sorted(&set), vec![iv(20, 30), iv(40, 50)]);

    let other = Set::build([iv(25, 45)]).unwrap();
    set.intersection_update(&other, true).unwrap();
    assert_eq!(sorted(&set), vec![iv(25, 30), iv(40, 45)]);

    set.union_update(&other, false, true).unwrap();
    assert_eq!(sorted(&set), vec![iv(25, 45)]);
}

#[test]
fn geometric_difference_is_unsupported() {
    let a = Set::build([iv(0, 10)]).unwrap();
    let b = Set::build([iv(5, 15)]).unwrap();
    assert_eq!(a.difference(&b).err(), Some(Error::Unsupported("difference")));
    assert_eq!(
        a.symmetric_difference(&b).err(),
        Some(Error::Unsupported("symmetric_difference"))
    );
    assert_eq!(a.overlap_length(&b).err(), Some(Error::Unsupported("overlap_length")));
    assert_eq!(a.overlap_fraction(&b).err(), Some(Error::Unsupported("overlap_fraction")));
    assert_eq!(a.subintervals(&b).err(), Some(Error::Unsupported("subintervals")));
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Gene {
    name: &'static str,
    chrom: &'static str,
    start: i32,
    stop: i32,
}

fn gene_interval(g: &Gene) -> Iv {
    Interval::new(g.chrom, g.start, g.stop)
}

#[test]
fn projected_payloads_are_queried_and_removed() {
    let genes = [
        Gene { name: "a", chrom: CHR, start: 0, stop: 100 },
        Gene { name: "b", chrom: CHR, start: 10, stop: 20 },
        Gene { name: "c", chrom: CHR, start: 10, stop: 20 },
        Gene { name: "d", chrom: CHR, start: 200, stop: 300 },
    ];
    let mut set = IntervalSet::build_with(genes.clone(), gene_interval).unwrap();
    set.check_invariants();
    assert_eq!(set.len(), 4);

    let names: Vec<_> = set.overlapping(&iv(15, 16)).map(|g| g.name).collect();
    assert_eq!(names, vec!["a", "b", "c"]);

    let lookups = [(15, 16), (250, 260)];
    let mut hits: Vec<_> = set
        .overlaps_by(&lookups, |&(b, e)| iv(b, e))
        .into_iter()
        .map(|g| g.name)
        .collect();
    hits.sort_unstable();
    assert_eq!(hits, vec!["a", "b", "c", "d"]);

    assert_eq!(set.remove(&genes[1]), Ok(genes[1].clone()));
    assert!(!set.contains(&genes[1]));
    assert!(set.contains(&genes[2]));

    let moved = Gene { name: "e", chrom: CHR, start: 0, stop: 0 };
    set.insort_with(moved.clone(), |_| iv(150, 160)).unwrap();
    assert!(!set.contains(&moved));
    assert_eq!(set.remove_with(&moved, |_| iv(150, 160)), Ok(moved));
    set.check_invariants();
    assert_eq!(set.len(), 3);
}

#[test]
fn clone_is_independent() {
    let mut set = Set::build([iv(0, 10), iv(2, 5), iv(20, 30)]).unwrap();
    let copy = set.clone();
    set.remove(&iv(0, 10)).unwrap();
    set.insort(iv(40, 50)).unwrap();
    assert_eq!(sorted(&copy), vec![iv(0, 10), iv(2, 5), iv(20, 30)]);
    copy.check_invariants();
    set.check_invariants();
}

#[test]
fn interval_set_clear_is_ok() {
    let mut set = Set::build([iv(1, 3), iv(2, 4), iv(6, 7), iv(2, 3)]).unwrap();
    assert_eq!(set.len(), 4);
    set.clear();
    assert_eq!(set.len(), 0);
    assert!(set.is_empty());
    assert_eq!(set.arena.live(), 0);
    set.insort(iv(5, 6)).unwrap();
    assert_eq!(set.len(), 1);
}

#[test]
fn wide_index_type_is_supported() {
    let mut set: IntervalSet<Iv, &'static str, i32, usize> =
        IntervalSet::build_from([iv(0, 10), iv(1, 2)], intervalset::identity()).unwrap();
    set.insort(iv(3, 4)).unwrap();
    set.check_invariants();
    assert_eq!(set.len(), 3);
}

#[cfg(feature = "serde")]
#[test]
fn test_serde_interval_set() {
    use serde_json::{json, Value};

    type OwnedSet = IntervalSet<Interval<String, i32>, String, i32>;
    let owned = |beg, end| Interval::new("chr1".to_owned(), beg, end);
    let set = OwnedSet::build([owned(1, 5), owned(3, 7), owned(2, 4)]).unwrap();

    // Serialize the interval set to JSON
    let serialized = serde_json::to_string(&set).unwrap();
    let expected = json!([
        { "namespace": "chr1", "beg": 1, "end": 5 },
        { "namespace": "chr1", "beg": 2, "end": 4 },
        { "namespace": "chr1", "beg": 3, "end": 7 }
    ]);
    let actual: Value = serde_json::from_str(&serialized).unwrap();
    assert_eq!(expected, actual);

    // Deserialize the interval set from JSON
    let deserialized: OwnedSet = serde_json::from_str(&serialized).unwrap();
    assert_eq!(deserialized.len(), set.len());
    assert!(deserialized.iter().eq(set.iter()));

    let mixed = r#"[{"namespace":"chr1","beg":1,"end":5},{"namespace":"chr2","beg":1,"end":5}]"#;
    assert!(serde_json::from_str::<OwnedSet>(mixed).is_err());
}
