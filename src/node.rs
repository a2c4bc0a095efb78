use std::cmp::Ordering;

use crate::arena::SlotId;
use crate::index::IndexType;
use crate::interval::Interval;

/// Node of the nested containment list
#[derive(Debug, Clone)]
pub(crate) struct Node<P, N, T, Ix> {
    /// Interval projected from the payload
    pub interval: Interval<N, T>,
    /// Caller's value
    pub payload: P,
    /// Slot of the list holding the intervals nested in this one
    pub sublist: Option<SlotId<Ix>>,
}

// Convenient getter/setter methods
impl<P, N, T, Ix> Node<P, N, T, Ix>
where
    Ix: IndexType,
{
    pub fn new(interval: Interval<N, T>, payload: P) -> Self {
        Node {
            interval,
            payload,
            sublist: None,
        }
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn sublist(&self) -> Option<SlotId<Ix>> {
        self.sublist
    }

    pub fn take_sublist(&mut self) -> Option<SlotId<Ix>> {
        self.sublist.take()
    }

    pub fn set_sublist(sublist: SlotId<Ix>) -> impl FnOnce(&mut Node<P, N, T, Ix>) {
        move |node: &mut Node<P, N, T, Ix>| {
            let _ignore = node.sublist.replace(sublist);
        }
    }
}

impl<P, N, T, Ix> Node<P, N, T, Ix>
where
    P: Eq,
    N: Eq,
    T: Ord,
{
    /// Same payload stored at the same bounds.
    pub fn is_record(&self, interval: &Interval<N, T>, payload: &P) -> bool {
        self.interval == *interval && self.payload == *payload
    }
}

/// Empty intervals last, then `beg` ascending, then `end` ascending.
pub(crate) fn natural_order<N, T>(a: &Interval<N, T>, b: &Interval<N, T>) -> Ordering
where
    N: Eq,
    T: Ord,
{
    a.is_empty()
        .cmp(&b.is_empty())
        .then_with(|| a.beg.cmp(&b.beg))
        .then_with(|| a.end.cmp(&b.end))
}

/// Empty intervals last, then `beg` ascending, then `end` descending, so containers
/// precede what they contain.
pub(crate) fn longest_first<N, T>(a: &Interval<N, T>, b: &Interval<N, T>) -> Ordering
where
    N: Eq,
    T: Ord,
{
    a.is_empty()
        .cmp(&b.is_empty())
        .then_with(|| a.beg.cmp(&b.beg))
        .then_with(|| b.end.cmp(&a.end))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn longest_first_puts_containers_first_and_empties_last() {
        let mut intervals = vec![
            Interval::new((), 5, 5),
            Interval::new((), 1, 4),
            Interval::new((), 1, 9),
            Interval::new((), 0, 2),
        ];
        intervals.sort_by(longest_first);
        assert_eq!(
            intervals,
            vec![
                Interval::new((), 0, 2),
                Interval::new((), 1, 9),
                Interval::new((), 1, 4),
                Interval::new((), 5, 5),
            ]
        );
        intervals.sort_by(natural_order);
        assert_eq!(intervals[1], Interval::new((), 1, 4));
        assert_eq!(intervals[3], Interval::new((), 5, 5));
    }

    #[test]
    fn sublist_setter_replaces_slot() {
        let mut node: Node<u8, (), i32, u32> = Node::new(Interval::new((), 0, 1), 7);
        assert_eq!(node.sublist(), None);
        Node::set_sublist(SlotId::new(3))(&mut node);
        assert_eq!(node.take_sublist(), Some(SlotId::new(3)));
        assert_eq!(node.sublist(), None);
        assert!(node.is_record(&Interval::new((), 0, 1), &7));
        assert!(!node.is_record(&Interval::new((), 0, 2), &7));
    }
}
