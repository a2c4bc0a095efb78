//! The `Interval` stored in `IntervalSet` and represents the range [beg, end) on a namespace.
//!
//! Intervals order by namespace first and then by `(beg, end)`. Within one namespace, for
//! intervals of type `Interval<&str, u32>`:
//! - chr1:[1,4) < chr1:[2,5), because 1<2
//! - chr1:[1,4) < chr1:[1,5), because 4<5
//!
//! Only left-closed, right-open intervals are supported. An interval whose `beg` is not
//! below its `end` is empty: it overlaps nothing and is never stored in a set.

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::ops::Sub;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Namespace tag of an interval, e.g. a chromosome name.
pub trait Namespace: Clone + Eq + Hash + 'static {}

impl<N: Clone + Eq + Hash + 'static> Namespace for N {}

/// Coordinate type of an interval.
pub trait Coordinate: Clone + Ord + Hash + 'static {}

impl<T: Clone + Ord + Hash + 'static> Coordinate for T {}

/// The interval stored in `IntervalSet`, represents [beg, end) on `namespace`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interval<N, T> {
    /// Namespace, intervals on different namespaces never relate
    pub namespace: N,
    /// Begin, inclusive
    pub beg: T,
    /// End, exclusive
    pub end: T,
}

impl<N: Eq, T: Ord> Interval<N, T> {
    /// Create a new `Interval`. Empty intervals are allowed.
    #[inline]
    pub fn new(namespace: N, beg: T, end: T) -> Self {
        Self {
            namespace,
            beg,
            end,
        }
    }

    /// Returns `true` if the interval covers nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.beg >= self.end
    }

    #[inline]
    pub fn same_namespace(&self, other: &Self) -> bool {
        self.namespace == other.namespace
    }

    /// Checks if self overlaps with other interval.
    ///
    /// # Example
    /// ```rust
    /// use nclist_set::Interval;
    ///
    /// let a = Interval::new("chr1", 1, 5);
    /// assert!(a.overlaps(&Interval::new("chr1", 4, 9)));
    /// assert!(!a.overlaps(&Interval::new("chr1", 5, 9)));
    /// assert!(!a.overlaps(&Interval::new("chr2", 4, 9)));
    /// ```
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.same_namespace(other) && other.beg < self.end && self.beg < other.end
    }

    /// Checks if self lies within other, bounds included.
    #[inline]
    pub fn is_subinterval(&self, other: &Self) -> bool {
        self.same_namespace(other)
            && other.beg <= self.beg
            && self.beg < self.end
            && self.end <= other.end
    }

    #[inline]
    pub fn is_superinterval(&self, other: &Self) -> bool {
        other.is_subinterval(self)
    }

    /// Checks if self lies within other and the bounds differ.
    #[inline]
    pub fn is_proper_subinterval(&self, other: &Self) -> bool {
        self.is_subinterval(other) && !self.same_bounds(other)
    }

    #[inline]
    pub fn is_proper_superinterval(&self, other: &Self) -> bool {
        other.is_proper_subinterval(self)
    }

    /// Checks if one interval ends exactly where the other begins.
    #[inline]
    pub fn is_abutting(&self, other: &Self) -> bool {
        self.same_namespace(other)
            && !self.is_empty()
            && !other.is_empty()
            && (self.end == other.beg || other.end == self.beg)
    }

    #[inline]
    pub(crate) fn same_bounds(&self, other: &Self) -> bool {
        self.beg == other.beg && self.end == other.end
    }

    /// Overlapping, or abutting when `abutting` is set.
    #[inline]
    pub(crate) fn touches(&self, other: &Self, abutting: bool) -> bool {
        self.overlaps(other) || (abutting && self.is_abutting(other))
    }
}

impl<N: Clone + Eq, T: Clone + Ord> Interval<N, T> {
    /// The smallest interval covering both self and other.
    #[inline]
    #[must_use]
    pub fn hull(&self, other: &Self) -> Self {
        Interval::new(
            self.namespace.clone(),
            self.beg.clone().min(other.beg.clone()),
            self.end.clone().max(other.end.clone()),
        )
    }

    /// The interval covered by both self and other, if they overlap.
    #[inline]
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        self.overlaps(other).then(|| {
            Interval::new(
                self.namespace.clone(),
                self.beg.clone().max(other.beg.clone()),
                self.end.clone().min(other.end.clone()),
            )
        })
    }
}

impl<N, T> Interval<N, T>
where
    N: Eq,
    T: Clone + Ord + Sub<Output = T>,
{
    /// Length of the shared range, `None` when the intervals do not overlap.
    ///
    /// # Example
    /// ```rust
    /// use nclist_set::Interval;
    ///
    /// let a = Interval::new((), 0, 10);
    /// assert_eq!(a.overlap_length(&Interval::new((), 5, 20)), Some(5));
    /// assert_eq!(a.overlap_length(&Interval::new((), 10, 20)), None);
    /// ```
    #[inline]
    pub fn overlap_length(&self, other: &Self) -> Option<T> {
        self.overlaps(other).then(|| {
            let beg = self.beg.clone().max(other.beg.clone());
            let end = self.end.clone().min(other.end.clone());
            end - beg
        })
    }

    /// Distance between the facing ends of two disjoint intervals, `None` when they
    /// overlap or live on different namespaces.
    #[inline]
    pub fn gap(&self, other: &Self) -> Option<T> {
        if !self.same_namespace(other) || self.overlaps(other) {
            return None;
        }
        if self.end <= other.beg {
            Some(other.beg.clone() - self.end.clone())
        } else {
            Some(self.beg.clone() - other.end.clone())
        }
    }

    pub(crate) fn proximity(&self, other: &Self) -> Option<Proximity<T>> {
        if !self.same_namespace(other) {
            return None;
        }
        match self.overlap_length(other) {
            Some(len) => Some(Proximity::Overlap(len)),
            None => self.gap(other).map(Proximity::Gap),
        }
    }
}

impl<N: fmt::Display, T: fmt::Display> fmt::Display for Interval<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.namespace, self.beg, self.end)
    }
}

/// How close a candidate is to a query. Smaller is closer: any overlap beats any gap, a
/// longer overlap beats a shorter one and a shorter gap beats a longer one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Proximity<T> {
    Overlap(T),
    Gap(T),
}

impl<T: Ord> PartialOrd for Proximity<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> Ord for Proximity<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Proximity::Overlap(a), Proximity::Overlap(b)) => b.cmp(a),
            (Proximity::Overlap(_), Proximity::Gap(_)) => Ordering::Less,
            (Proximity::Gap(_), Proximity::Overlap(_)) => Ordering::Greater,
            (Proximity::Gap(a), Proximity::Gap(b)) => a.cmp(b),
        }
    }
}
