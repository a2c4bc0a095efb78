use nclist_set::{Interval, IntervalSet};

trait Point<T> {
    fn new_point(ns: &'static str, x: T) -> Interval<&'static str, T>;
}

impl Point<u32> for Interval<&'static str, u32> {
    fn new_point(ns: &'static str, x: u32) -> Self {
        Interval::new(ns, x, x + 1)
    }
}

fn main() {
    let mut set = IntervalSet::new();
    set.insort(Interval::new("chr1", 3, 7)).unwrap();
    set.insort(Interval::new("chr1", 2, 6)).unwrap();

    let tmp_point = Interval::new_point("chr1", 5);
    assert_eq!(tmp_point, Interval::new("chr1", 5, 6));

    set.insort(tmp_point.clone()).unwrap();
    assert!(set.contains(&tmp_point));
    assert_eq!(set.overlapping(&Interval::new_point("chr1", 5)).count(), 3);
    assert!(!set.is_overlapping(&Interval::new_point("chr1", 7)));

    let points: Vec<_> = [0, 2, 4, 6, 8]
        .into_iter()
        .map(|x| Interval::new_point("chr1", x))
        .collect();
    for (point, hit) in set.overlap_pairs(&points) {
        println!("{point} hits {hit}");
    }
}
