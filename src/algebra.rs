//! Set algebra over `IntervalSet`s.
//!
//! Geometric operators (`merge`, `complement`, `intersection`, `union`) compute new
//! ranges; record operators (the `*_set` family) treat a set as a plain collection of
//! `(interval, payload)` records. Every operator returns a freshly built set and the
//! `*_update` variants replace `self` only once the result is complete.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::index::IndexType;
use crate::interval::{Coordinate, Interval, Namespace};
use crate::intervalset::{IntervalSet, Projection};
use crate::iter::Search;
use crate::node::{natural_order, Node};

/// A range produced by `intersection` or `union`, tagged with the payloads it came from.
///
/// A tag is `None` when that side did not contribute a record, or contributed a merged
/// range rather than a stored payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment<N, T, A, B> {
    pub interval: Interval<N, T>,
    /// Payload from the left operand
    pub left: Option<A>,
    /// Payload from the right operand
    pub right: Option<B>,
}

fn segment_projection<N, T, A, B>() -> Projection<Segment<N, T, A, B>, N, T>
where
    N: Namespace,
    T: Coordinate,
    A: 'static,
    B: 'static,
{
    Arc::new(|segment: &Segment<N, T, A, B>| segment.interval.clone())
}

impl<P, N, T, Ix> IntervalSet<P, N, T, Ix>
where
    P: Clone + Eq + Hash + 'static,
    N: Namespace,
    T: Coordinate,
    Ix: IndexType,
{
    /// Merge overlapping records into maximal ranges. With `abutting`, ranges that only
    /// touch are merged as well.
    ///
    /// # Example
    /// ```rust
    /// use nclist_set::{Interval, IntervalSet};
    ///
    /// let set = IntervalSet::build([Interval::new("chr1", 1, 50), Interval::new("chr1", 45, 80)])
    ///     .unwrap();
    /// let merged: Vec<_> = set.merge(false).iter().cloned().collect();
    /// assert_eq!(merged, [Interval::new("chr1", 1, 80)]);
    /// ```
    #[must_use]
    pub fn merge(&self, abutting: bool) -> IntervalSet<Interval<N, T>, N, T, Ix> {
        let mut merged: Vec<Interval<N, T>> = Vec::new();
        // top-level ranges cover everything nested in them and their ends never decrease
        for node in self.toplist.iter() {
            match merged.last_mut() {
                Some(last)
                    if node.interval.beg < last.end
                        || (abutting && node.interval.beg == last.end) =>
                {
                    last.end = node.interval.end.clone();
                }
                _ => merged.push(node.interval.clone()),
            }
        }
        debug!(input = self.len, output = merged.len(), "merged ranges");
        IntervalSet::from_disjoint(merged)
    }

    /// The ranges within `[lower, upper)` covered by no record. `lower` and `upper`
    /// default to the extent of the set.
    ///
    /// # Errors
    ///
    /// Returns `Error::Bounds` when `lower` lies after the first record begins or `upper`
    /// before the last record ends.
    ///
    /// # Example
    /// ```rust
    /// use nclist_set::{Interval, IntervalSet};
    ///
    /// let set = IntervalSet::build([Interval::new("chr1", 100, 1000)]).unwrap();
    /// let gaps: Vec<_> = set.complement(Some(0), Some(1048)).unwrap().iter().cloned().collect();
    /// assert_eq!(gaps, [Interval::new("chr1", 0, 100), Interval::new("chr1", 1000, 1048)]);
    /// ```
    pub fn complement(
        &self,
        lower: Option<T>,
        upper: Option<T>,
    ) -> Result<IntervalSet<Interval<N, T>, N, T, Ix>> {
        let (Some(first), Some(last)) = (self.toplist.first(), self.toplist.last()) else {
            return Ok(IntervalSet::from_disjoint(Vec::new()));
        };
        let namespace = &first.interval.namespace;
        let (beg, end) = (&first.interval.beg, &last.interval.end);
        let lower = lower.unwrap_or_else(|| beg.clone());
        let upper = upper.unwrap_or_else(|| end.clone());
        if &lower > beg || &upper < end {
            return Err(Error::Bounds);
        }

        let mut gaps = Vec::new();
        if &lower < beg {
            gaps.push(Interval::new(namespace.clone(), lower, beg.clone()));
        }
        for pair in self.toplist.as_slice().windows(2) {
            let (prev, next) = (&pair[0].interval, &pair[1].interval);
            if next.beg > prev.end {
                gaps.push(Interval::new(
                    namespace.clone(),
                    prev.end.clone(),
                    next.beg.clone(),
                ));
            }
        }
        if end < &upper {
            gaps.push(Interval::new(namespace.clone(), end.clone(), upper));
        }
        debug!(gaps = gaps.len(), "complemented ranges");
        Ok(IntervalSet::from_disjoint(gaps))
    }

    /// Every range where a record of self overlaps a record of other, tagged with both
    /// payloads. Without `pairwise`, other is merged first and its tags are `None`.
    ///
    /// # Errors
    ///
    /// Fails only if the result cannot be built, which the shared namespace rules out.
    pub fn intersection<Q, Jx>(
        &self,
        other: &IntervalSet<Q, N, T, Jx>,
        pairwise: bool,
    ) -> Result<IntervalSet<Segment<N, T, P, Q>, N, T, Ix>>
    where
        Q: Clone + Eq + Hash + 'static,
        Jx: IndexType,
    {
        let mut segments = Vec::new();
        if !self.is_empty() && !other.is_empty() {
            if pairwise {
                for node in other.nodes() {
                    self.intersect_into(&node.interval, Some(&node.payload), &mut segments);
                }
            } else {
                let merged = other.merge(false);
                for node in merged.toplist.iter() {
                    self.intersect_into(&node.interval, None, &mut segments);
                }
            }
        }
        debug!(segments = segments.len(), "intersected sets");
        IntervalSet::build_from(segments, segment_projection())
    }

    /// Same as `intersection`, other being built from `payloads` projected by `f`.
    ///
    /// # Errors
    ///
    /// Returns `Error::MixedNamespace` when `payloads` do not share one namespace.
    ///
    /// # Example
    /// ```rust
    /// use nclist_set::{Interval, IntervalSet};
    ///
    /// let set = IntervalSet::build([Interval::new("chr1", 0, 100)]).unwrap();
    /// let hits = set
    ///     .intersection_with([("exon", 90, 120)], |&(_, b, e)| Interval::new("chr1", b, e), true)
    ///     .unwrap();
    /// let segment = hits.iter().next().unwrap();
    /// assert_eq!(segment.interval, Interval::new("chr1", 90, 100));
    /// assert_eq!(segment.right, Some(("exon", 90, 120)));
    /// ```
    pub fn intersection_with<Q, I, F>(
        &self,
        payloads: I,
        f: F,
        pairwise: bool,
    ) -> Result<IntervalSet<Segment<N, T, P, Q>, N, T, Ix>>
    where
        Q: Clone + Eq + Hash + 'static,
        I: IntoIterator<Item = Q>,
        F: Fn(&Q) -> Interval<N, T> + Send + Sync + 'static,
    {
        let other = IntervalSet::<Q, N, T, Ix>::build_from(payloads, Arc::new(f))?;
        self.intersection(&other, pairwise)
    }

    fn intersect_into<Q>(
        &self,
        query: &Interval<N, T>,
        tag: Option<&Q>,
        segments: &mut Vec<Segment<N, T, P, Q>>,
    ) where
        Q: Clone,
    {
        for (_, _, _, hit) in Search::new(self, vec![query]) {
            if let Some(interval) = hit.interval.intersect(query) {
                segments.push(Segment {
                    interval,
                    left: Some(hit.payload.clone()),
                    right: tag.cloned(),
                });
            }
        }
    }

    /// Union of self and other. Each overlapping pair of records (touching pairs too with
    /// `abutting`) yields its hull tagged with both payloads; records that meet nothing
    /// pass through with one tag. Without `pairwise`, other is merged first.
    ///
    /// # Errors
    ///
    /// Returns `Error::MixedNamespace` when the operands live on different namespaces.
    pub fn union<Q, Jx>(
        &self,
        other: &IntervalSet<Q, N, T, Jx>,
        abutting: bool,
        pairwise: bool,
    ) -> Result<IntervalSet<Segment<N, T, P, Q>, N, T, Ix>>
    where
        Q: Clone + Eq + Hash + 'static,
        Jx: IndexType,
    {
        let mut left: Vec<_> = self
            .nodes()
            .map(|n| (n.interval.clone(), Some(n.payload.clone())))
            .collect();
        let mut right: Vec<_> = if pairwise {
            other
                .nodes()
                .map(|n| (n.interval.clone(), Some(n.payload.clone())))
                .collect()
        } else {
            other
                .merge(abutting)
                .toplist
                .iter()
                .map(|n| (n.interval.clone(), None))
                .collect()
        };
        left.sort_by(|a, b| natural_order(&a.0, &b.0));
        right.sort_by(|a, b| natural_order(&a.0, &b.0));

        let mut segments = Vec::new();
        let mut joined_left = vec![false; left.len()];
        let mut joined_right = vec![false; right.len()];
        // right records that may still meet the current left record or a later one
        let mut window: Vec<usize> = Vec::new();
        let mut next = 0;
        for (i, (a, a_tag)) in left.iter().enumerate() {
            while next < right.len()
                && (right[next].0.beg < a.end || (abutting && right[next].0.beg == a.end))
            {
                window.push(next);
                next += 1;
            }
            window.retain(|&j| right[j].0.end > a.beg || (abutting && right[j].0.end == a.beg));
            for &j in &window {
                let (b, b_tag) = &right[j];
                if a.touches(b, abutting) {
                    segments.push(Segment {
                        interval: a.hull(b),
                        left: a_tag.clone(),
                        right: b_tag.clone(),
                    });
                    joined_left[i] = true;
                    joined_right[j] = true;
                }
            }
        }
        let unjoined_left = left
            .into_iter()
            .zip(joined_left)
            .filter(|(_, joined)| !joined)
            .map(|((interval, tag), _)| Segment {
                interval,
                left: tag,
                right: None,
            });
        let unjoined_right = right
            .into_iter()
            .zip(joined_right)
            .filter(|(_, joined)| !joined)
            .map(|((interval, tag), _)| Segment {
                interval,
                left: None,
                right: tag,
            });
        segments.extend(unjoined_left);
        segments.extend(unjoined_right);
        debug!(segments = segments.len(), "united sets");
        IntervalSet::build_from(segments, segment_projection())
    }

    /// Same as `union`, other being built from `payloads` projected by `f`.
    ///
    /// # Errors
    ///
    /// Returns `Error::MixedNamespace` when `payloads` do not share one namespace, or
    /// live on another namespace than self.
    pub fn union_with<Q, I, F>(
        &self,
        payloads: I,
        f: F,
        abutting: bool,
        pairwise: bool,
    ) -> Result<IntervalSet<Segment<N, T, P, Q>, N, T, Ix>>
    where
        Q: Clone + Eq + Hash + 'static,
        I: IntoIterator<Item = Q>,
        F: Fn(&Q) -> Interval<N, T> + Send + Sync + 'static,
    {
        let other = IntervalSet::<Q, N, T, Ix>::build_from(payloads, Arc::new(f))?;
        self.union(&other, abutting, pairwise)
    }

    /// Geometric difference is not defined for interval sets.
    ///
    /// # Errors
    ///
    /// Always returns `Error::Unsupported`.
    pub fn difference<Q, Jx>(&self, _other: &IntervalSet<Q, N, T, Jx>) -> Result<Self>
    where
        Jx: IndexType,
    {
        Err(Error::Unsupported("difference"))
    }

    /// # Errors
    ///
    /// Always returns `Error::Unsupported`.
    pub fn symmetric_difference<Q, Jx>(&self, _other: &IntervalSet<Q, N, T, Jx>) -> Result<Self>
    where
        Jx: IndexType,
    {
        Err(Error::Unsupported("symmetric_difference"))
    }

    /// # Errors
    ///
    /// Always returns `Error::Unsupported`.
    pub fn overlap_length<Q, Jx>(&self, _other: &IntervalSet<Q, N, T, Jx>) -> Result<T>
    where
        Jx: IndexType,
    {
        Err(Error::Unsupported("overlap_length"))
    }

    /// # Errors
    ///
    /// Always returns `Error::Unsupported`.
    pub fn overlap_fraction<Q, Jx>(&self, _other: &IntervalSet<Q, N, T, Jx>) -> Result<f64>
    where
        Jx: IndexType,
    {
        Err(Error::Unsupported("overlap_fraction"))
    }

    /// # Errors
    ///
    /// Always returns `Error::Unsupported`.
    pub fn subintervals<Q, Jx>(&self, _other: &IntervalSet<Q, N, T, Jx>) -> Result<Self>
    where
        Jx: IndexType,
    {
        Err(Error::Unsupported("subintervals"))
    }

    fn records(&self) -> HashSet<(&Interval<N, T>, &P)> {
        self.nodes().map(|n| (&n.interval, &n.payload)).collect()
    }

    fn rebuild<'s, I>(&self, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'s Interval<N, T>, &'s P)>,
        P: 's,
    {
        let nodes = records
            .into_iter()
            .map(|(interval, payload)| Node::new(interval.clone(), payload.clone()))
            .collect();
        Self::from_nodes(nodes, Arc::clone(&self.projection))
    }

    /// Records of self missing from other.
    ///
    /// # Errors
    ///
    /// Fails only if the result cannot be built, which the shared namespace rules out.
    pub fn difference_set(&self, other: &Self) -> Result<Self> {
        let theirs = other.records();
        self.rebuild(self.records().into_iter().filter(|r| !theirs.contains(r)))
    }

    /// Records found in both self and other.
    ///
    /// # Errors
    ///
    /// Fails only if the result cannot be built, which the shared namespace rules out.
    pub fn intersection_set(&self, other: &Self) -> Result<Self> {
        let theirs = other.records();
        self.rebuild(self.records().into_iter().filter(|r| theirs.contains(r)))
    }

    /// Records found in exactly one of self and other.
    ///
    /// # Errors
    ///
    /// Returns `Error::MixedNamespace` when the sets live on different namespaces.
    pub fn symmetric_difference_set(&self, other: &Self) -> Result<Self> {
        let ours = self.records();
        let theirs = other.records();
        self.rebuild(ours.symmetric_difference(&theirs).copied())
    }

    /// Records found in either self or other.
    ///
    /// # Errors
    ///
    /// Returns `Error::MixedNamespace` when the sets live on different namespaces.
    pub fn union_set(&self, other: &Self) -> Result<Self> {
        let ours = self.records();
        let theirs = other.records();
        self.rebuild(ours.union(&theirs).copied())
    }

    /// Set of `payloads` sharing the projection of self.
    fn coerce<I>(&self, payloads: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
    {
        Self::build_from(payloads, Arc::clone(&self.projection))
    }

    /// `difference_set` against payloads projected like self's.
    ///
    /// # Errors
    ///
    /// Returns `Error::MixedNamespace` when `payloads` do not share one namespace.
    pub fn difference_set_from<I>(&self, payloads: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
    {
        self.difference_set(&self.coerce(payloads)?)
    }

    /// `intersection_set` against payloads projected like self's.
    ///
    /// # Errors
    ///
    /// Returns `Error::MixedNamespace` when `payloads` do not share one namespace.
    pub fn intersection_set_from<I>(&self, payloads: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
    {
        self.intersection_set(&self.coerce(payloads)?)
    }

    /// `symmetric_difference_set` against payloads projected like self's.
    ///
    /// # Errors
    ///
    /// Returns `Error::MixedNamespace` when `payloads` do not share one namespace with
    /// each other or with self.
    pub fn symmetric_difference_set_from<I>(&self, payloads: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
    {
        self.symmetric_difference_set(&self.coerce(payloads)?)
    }

    /// `union_set` against payloads projected like self's.
    ///
    /// # Errors
    ///
    /// Returns `Error::MixedNamespace` when `payloads` do not share one namespace with
    /// each other or with self.
    pub fn union_set_from<I>(&self, payloads: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
    {
        self.union_set(&self.coerce(payloads)?)
    }

    pub fn is_disjoint_set(&self, other: &Self) -> bool {
        self.records().is_disjoint(&other.records())
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.records().is_subset(&other.records())
    }

    pub fn is_superset(&self, other: &Self) -> bool {
        self.records().is_superset(&other.records())
    }

    /// Keep only the records of self missing from other.
    ///
    /// # Errors
    ///
    /// Same as `difference_set`; self is left untouched on error.
    pub fn difference_update_set(&mut self, other: &Self) -> Result<()> {
        *self = self.difference_set(other)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Same as `intersection_set`; self is left untouched on error.
    pub fn intersection_update_set(&mut self, other: &Self) -> Result<()> {
        *self = self.intersection_set(other)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Same as `symmetric_difference_set`; self is left untouched on error.
    pub fn symmetric_difference_update_set(&mut self, other: &Self) -> Result<()> {
        *self = self.symmetric_difference_set(other)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Same as `union_set`; self is left untouched on error.
    pub fn union_update_set(&mut self, other: &Self) -> Result<()> {
        *self = self.union_set(other)?;
        Ok(())
    }
}

impl<N, T, Ix> IntervalSet<Interval<N, T>, N, T, Ix>
where
    N: Namespace,
    T: Coordinate,
    Ix: IndexType,
{
    /// Replace self with `merge(abutting)`.
    pub fn merge_update(&mut self, abutting: bool) {
        *self = self.merge(abutting);
    }

    /// Replace self with `complement(lower, upper)`.
    ///
    /// # Errors
    ///
    /// Same as `complement`; self is left untouched on error.
    pub fn complement_update(&mut self, lower: Option<T>, upper: Option<T>) -> Result<()> {
        *self = self.complement(lower, upper)?;
        Ok(())
    }

    /// Replace self with the ranges of `intersection(other, pairwise)`.
    ///
    /// # Errors
    ///
    /// Same as `intersection`; self is left untouched on error.
    pub fn intersection_update<Q, Jx>(
        &mut self,
        other: &IntervalSet<Q, N, T, Jx>,
        pairwise: bool,
    ) -> Result<()>
    where
        Q: Clone + Eq + Hash + 'static,
        Jx: IndexType,
    {
        let segments = self.intersection(other, pairwise)?;
        *self = self.with_segments(&segments)?;
        Ok(())
    }

    /// Replace self with the ranges of `union(other, abutting, pairwise)`.
    ///
    /// # Errors
    ///
    /// Same as `union`; self is left untouched on error.
    pub fn union_update<Q, Jx>(
        &mut self,
        other: &IntervalSet<Q, N, T, Jx>,
        abutting: bool,
        pairwise: bool,
    ) -> Result<()>
    where
        Q: Clone + Eq + Hash + 'static,
        Jx: IndexType,
    {
        let segments = self.union(other, abutting, pairwise)?;
        *self = self.with_segments(&segments)?;
        Ok(())
    }

    /// Bare-interval set of the ranges in `segments`, keeping the projection of self.
    fn with_segments<A, B>(
        &self,
        segments: &IntervalSet<Segment<N, T, A, B>, N, T, Ix>,
    ) -> Result<Self> {
        let intervals: Vec<_> = segments.iter().map(|s| s.interval.clone()).collect();
        Self::build_from(intervals, Arc::clone(&self.projection))
    }
}
