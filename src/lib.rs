//! `nclist_set` is an interval set based on the nested containment list.
//!
//! Records are kept in a sorted list of top-level intervals; every record owns a sorted
//! sublist of the intervals it strictly contains. Because no list holds an interval
//! containing one of its siblings, both the begins and the ends of a list are sorted, and
//! an overlap query is a binary search per visited list followed by a linear scan.
//! Building from n intervals takes O(n log n); a query costs O(log n + k) for k hits.
//!
//! Sublists live in an arena of slots addressed by integer handles, so the set holds no
//! internal references and stays `Send` and `Unpin`. Records are any payload type paired
//! with a projection function extracting its `Interval`.
//!
//! # Example
//!
//! ```rust
//! use nclist_set::{Interval, IntervalSet};
//!
//! let mut set = IntervalSet::build([
//!     Interval::new("chr1", 10, 100),
//!     Interval::new("chr1", 200, 500),
//!     Interval::new("chr1", 0, 150),
//! ])
//! .unwrap();
//! set.insort(Interval::new("chr1", 20, 30)).unwrap();
//! assert_eq!(set.overlapping(&Interval::new("chr1", 75, 120)).count(), 2);
//! assert_eq!(set.len(), 4);
//! ```
//!

mod algebra;
mod arena;
mod error;
mod index;
mod interval;
mod intervalset;
mod iter;
mod node;
mod sublist;

#[cfg(test)]
mod tests;

pub use algebra::Segment;
pub use arena::SlotId;
pub use error::{Error, Result};
pub use index::{DefaultIx, IndexType};
pub use interval::{Coordinate, Interval, Namespace};
pub use intervalset::{IntervalSet, Projection};
pub use iter::{Iter, OverlapPairs, Overlaps};
