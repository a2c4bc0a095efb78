use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::ops::Sub;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::arena::{Arena, SlotId};
use crate::error::{Error, Result};
use crate::index::{DefaultIx, IndexType};
use crate::interval::{Coordinate, Interval, Namespace};
use crate::iter::{Iter, Nodes, OverlapPairs, Overlaps, Search};
use crate::node::{longest_first, natural_order, Node};
use crate::sublist::Sublist;

/// Function extracting the interval of a payload.
pub type Projection<P, N, T> = Arc<dyn Fn(&P) -> Interval<N, T> + Send + Sync>;

/// A list of the set: `None` is the toplist, `Some(slot)` a sublist in the arena.
pub(crate) type ListId<Ix> = Option<SlotId<Ix>>;

/// A set of payloads indexed by their intervals, stored as a nested containment list.
///
/// Top-level records live in the toplist; each record owns the (arena-allocated) list of
/// the records it strictly contains. All records share one namespace.
pub struct IntervalSet<P, N, T, Ix = DefaultIx> {
    /// Records not contained in any other record
    pub(crate) toplist: Sublist<P, N, T, Ix>,
    /// Storage of every nested list
    pub(crate) arena: Arena<P, N, T, Ix>,
    /// Number of records in the set
    pub(crate) len: usize,
    /// Interval extraction for payloads passed to mutation methods
    pub(crate) projection: Projection<P, N, T>,
}

impl<P, N, T, Ix> IntervalSet<P, N, T, Ix>
where
    Ix: IndexType,
{
    /// Get an iterator over the payloads of the set. A record is visited before the
    /// records it contains, and each list level is visited in `(beg, end)` order.
    #[inline]
    #[must_use]
    pub fn iter(&self) -> Iter<'_, P, N, T, Ix> {
        Iter::new(self)
    }

    /// Get an iterator over the top-level payloads, in `(beg, end)` order.
    #[inline]
    pub fn header(&self) -> impl Iterator<Item = &P> + '_ {
        self.toplist.iter().map(Node::payload)
    }

    /// Remove all records from the set
    #[inline]
    pub fn clear(&mut self) {
        self.toplist.clear();
        self.arena.clear();
        self.len = 0;
    }

    /// Return the number of records in the set.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Return `true` if the set contains no records.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The projection used by `insert`, `insort` and `remove`.
    #[inline]
    pub fn projection(&self) -> &Projection<P, N, T> {
        &self.projection
    }

    pub(crate) fn nodes(&self) -> Nodes<'_, P, N, T, Ix> {
        Nodes::new(self)
    }

    pub(crate) fn list(&self, list: ListId<Ix>) -> &Sublist<P, N, T, Ix> {
        match list {
            None => &self.toplist,
            Some(slot) => self.arena.get(slot),
        }
    }

    pub(crate) fn list_mut(&mut self, list: ListId<Ix>) -> &mut Sublist<P, N, T, Ix> {
        match list {
            None => &mut self.toplist,
            Some(slot) => self.arena.get_mut(slot),
        }
    }
}

impl<N, T> IntervalSet<Interval<N, T>, N, T>
where
    N: Namespace,
    T: Coordinate,
{
    /// Create an empty `IntervalSet` of bare intervals.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::from_projection(identity())
    }

    /// Build a set of bare intervals in O(n log n).
    ///
    /// Empty intervals are dropped and repeated intervals are stored once.
    ///
    /// # Errors
    ///
    /// Returns `Error::MixedNamespace` when the intervals do not share one namespace.
    ///
    /// # Example
    /// ```rust
    /// use nclist_set::{Interval, IntervalSet};
    ///
    /// let set = IntervalSet::build([
    ///     Interval::new("chr1", 10, 100),
    ///     Interval::new("chr1", 200, 500),
    ///     Interval::new("chr1", 0, 150),
    ///     Interval::new("chr1", 0, 150),
    /// ])
    /// .unwrap();
    /// assert_eq!(set.len(), 3);
    /// ```
    #[inline]
    pub fn build<I>(intervals: I) -> Result<Self>
    where
        I: IntoIterator<Item = Interval<N, T>>,
    {
        Self::build_from(intervals, identity())
    }
}

impl<P, N, T> IntervalSet<P, N, T>
where
    P: Eq + Hash,
    N: Namespace,
    T: Coordinate,
{
    /// Create an empty `IntervalSet` whose payloads are projected to intervals by `f`.
    ///
    /// # Example
    /// ```rust
    /// use nclist_set::{Interval, IntervalSet};
    ///
    /// #[derive(PartialEq, Eq, Hash)]
    /// struct Exon {
    ///     chrom: &'static str,
    ///     start: u32,
    ///     stop: u32,
    /// }
    ///
    /// let mut set = IntervalSet::with_projection(|e: &Exon| Interval::new(e.chrom, e.start, e.stop));
    /// set.insort(Exon { chrom: "chrX", start: 5, stop: 9 }).unwrap();
    /// assert_eq!(set.overlapping(&Interval::new("chrX", 8, 20)).count(), 1);
    /// ```
    #[inline]
    #[must_use]
    pub fn with_projection<F>(f: F) -> Self
    where
        F: Fn(&P) -> Interval<N, T> + Send + Sync + 'static,
    {
        Self::from_projection(Arc::new(f))
    }

    /// Build a set from payloads projected by `f` in O(n log n).
    ///
    /// Payloads with empty intervals are dropped; a payload repeated at identical bounds
    /// is stored once.
    ///
    /// # Errors
    ///
    /// Returns `Error::MixedNamespace` when the intervals do not share one namespace.
    #[inline]
    pub fn build_with<I, F>(payloads: I, f: F) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        F: Fn(&P) -> Interval<N, T> + Send + Sync + 'static,
    {
        Self::build_from(payloads, Arc::new(f))
    }
}

impl<N, T, Ix> IntervalSet<Interval<N, T>, N, T, Ix>
where
    N: Namespace,
    T: Coordinate,
    Ix: IndexType,
{
    /// Put intervals already sorted and pairwise disjoint straight onto the toplist.
    pub(crate) fn from_disjoint(intervals: Vec<Interval<N, T>>) -> Self {
        let mut set = Self::from_projection(identity());
        set.len = intervals.len();
        set.toplist = Sublist::from_nodes(
            intervals
                .into_iter()
                .map(|interval| Node::new(interval.clone(), interval))
                .collect(),
        );
        set
    }
}

impl<N, T> Default for IntervalSet<Interval<N, T>, N, T>
where
    N: Namespace,
    T: Coordinate,
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Projection of sets whose payloads are the intervals themselves.
pub(crate) fn identity<N, T>() -> Projection<Interval<N, T>, N, T>
where
    N: Namespace,
    T: Coordinate,
{
    Arc::new(Interval::<N, T>::clone)
}

impl<P, N, T, Ix> IntervalSet<P, N, T, Ix>
where
    P: Eq + Hash,
    N: Namespace,
    T: Coordinate,
    Ix: IndexType,
{
    /// Create an empty `IntervalSet` sharing `projection`, for any slot index type.
    #[inline]
    #[must_use]
    pub fn from_projection(projection: Projection<P, N, T>) -> Self {
        IntervalSet {
            toplist: Sublist::default(),
            arena: Arena::default(),
            len: 0,
            projection,
        }
    }

    /// Build a set from payloads with a shared projection, for any slot index type.
    ///
    /// # Errors
    ///
    /// Returns `Error::MixedNamespace` when the intervals do not share one namespace.
    #[inline]
    pub fn build_from<I>(payloads: I, projection: Projection<P, N, T>) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
    {
        let nodes = payloads
            .into_iter()
            .map(|payload| Node::new(projection(&payload), payload))
            .collect();
        Self::from_nodes(nodes, projection)
    }

    /// Namespace shared by every record, `None` if the set is empty.
    #[inline]
    pub fn namespace(&self) -> Option<&N> {
        self.toplist.first().map(|n| &n.interval.namespace)
    }

    /// Smallest begin over all records.
    #[inline]
    pub fn beg(&self) -> Option<&T> {
        self.toplist.first().map(|n| &n.interval.beg)
    }

    /// Largest end over all records.
    #[inline]
    pub fn end(&self) -> Option<&T> {
        self.toplist.last().map(|n| &n.interval.end)
    }

    /// The interval spanning every record.
    #[inline]
    pub fn hull(&self) -> Option<Interval<N, T>> {
        let first = self.toplist.first()?;
        let last = self.toplist.last()?;
        Some(first.interval.hull(&last.interval))
    }

    /// Return `true` if `payload` is stored in the set.
    #[inline]
    pub fn contains(&self, payload: &P) -> bool {
        let interval = (self.projection)(payload);
        self.find_record(&interval, payload).is_some()
    }

    /// Insert a payload, keeping every interval nested under the records containing it.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateKey` when the payload is already stored at the same
    /// bounds, `Error::MixedNamespace` when its namespace differs from the set's and
    /// `Error::EmptyInterval` when its interval is empty. The set is unchanged on error.
    ///
    /// # Panics
    ///
    /// This method panics when the arena is at the maximum number of slots for its index
    #[inline]
    pub fn insert(&mut self, payload: P) -> Result<()> {
        let interval = (self.projection)(&payload);
        self.insert_node(Node::new(interval, payload))
    }

    /// Same as `insert`, projecting the payload with `f` instead of the set's projection.
    #[inline]
    pub fn insert_with<F>(&mut self, payload: P, f: F) -> Result<()>
    where
        F: FnOnce(&P) -> Interval<N, T>,
    {
        let interval = f(&payload);
        self.insert_node(Node::new(interval, payload))
    }

    /// Insert a payload, doing nothing if it is already stored.
    ///
    /// # Errors
    ///
    /// Returns `Error::MixedNamespace` or `Error::EmptyInterval` like `insert`.
    ///
    /// # Example
    /// ```rust
    /// use nclist_set::{Interval, IntervalSet};
    ///
    /// let mut set = IntervalSet::new();
    /// set.insort(Interval::new("chr1", 1, 5)).unwrap();
    /// set.insort(Interval::new("chr1", 1, 5)).unwrap();
    /// set.insort(Interval::new("chr1", 2, 3)).unwrap();
    /// assert_eq!(set.len(), 2);
    /// ```
    #[inline]
    pub fn insort(&mut self, payload: P) -> Result<()> {
        match self.insert(payload) {
            Err(Error::DuplicateKey) => Ok(()),
            res => res,
        }
    }

    /// Same as `insort`, projecting the payload with `f`.
    #[inline]
    pub fn insort_with<F>(&mut self, payload: P, f: F) -> Result<()>
    where
        F: FnOnce(&P) -> Interval<N, T>,
    {
        match self.insert_with(payload, f) {
            Err(Error::DuplicateKey) => Ok(()),
            res => res,
        }
    }

    /// `insort` every payload, stopping at the first error.
    #[inline]
    pub fn update<I>(&mut self, payloads: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
    {
        payloads.into_iter().try_for_each(|p| self.insort(p))
    }

    /// Remove a payload from the set and return it. Records it contained are re-nested
    /// in the list it leaves.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when the payload is not stored.
    ///
    /// # Example
    /// ```rust
    /// use nclist_set::{Error, Interval, IntervalSet};
    ///
    /// let mut set = IntervalSet::build([
    ///     Interval::new((), 0, 100),
    ///     Interval::new((), 10, 20),
    /// ])
    /// .unwrap();
    /// assert_eq!(set.remove(&Interval::new((), 0, 100)), Ok(Interval::new((), 0, 100)));
    /// assert_eq!(set.remove(&Interval::new((), 0, 100)), Err(Error::NotFound));
    /// assert_eq!(set.len(), 1);
    /// ```
    #[inline]
    pub fn remove(&mut self, payload: &P) -> Result<P> {
        let interval = (self.projection)(payload);
        self.remove_record(&interval, payload)
    }

    /// Same as `remove`, projecting the payload with `f`.
    #[inline]
    pub fn remove_with<F>(&mut self, payload: &P, f: F) -> Result<P>
    where
        F: FnOnce(&P) -> Interval<N, T>,
    {
        let interval = f(payload);
        self.remove_record(&interval, payload)
    }

    /// Remove a payload if it is stored.
    #[inline]
    pub fn discard(&mut self, payload: &P) -> Option<P> {
        self.remove(payload).ok()
    }

    /// Remove and return the leftmost top-level record.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when the set is empty.
    #[inline]
    pub fn pop(&mut self) -> Result<P> {
        if self.toplist.is_empty() {
            return Err(Error::NotFound);
        }
        Ok(self.remove_at(None, 0).payload)
    }

    /// Get an iterator over the payloads overlapping any of `queries`, each reported once.
    ///
    /// Queries contained in a longer query add nothing and are skipped.
    ///
    /// # Example
    /// ```rust
    /// use nclist_set::{Interval, IntervalSet};
    ///
    /// let set = IntervalSet::build([
    ///     Interval::new("chr1", 10, 100),
    ///     Interval::new("chr1", 200, 500),
    ///     Interval::new("chr1", 0, 150),
    /// ])
    /// .unwrap();
    /// let hits: Vec<_> = set.overlaps([&Interval::new("chr1", 75, 120)]).collect();
    /// assert_eq!(
    ///     hits,
    ///     [&Interval::new("chr1", 0, 150), &Interval::new("chr1", 10, 100)]
    /// );
    /// ```
    #[inline]
    pub fn overlaps<'a, 'q, I>(&'a self, queries: I) -> Overlaps<'a, 'q, P, N, T, Ix>
    where
        I: IntoIterator<Item = &'q Interval<N, T>>,
    {
        let mut queries: Vec<_> = queries.into_iter().filter(|q| !q.is_empty()).collect();
        queries.sort_by(|a, b| longest_first(a, b));
        queries.dedup_by(|later, kept| later.is_subinterval(*kept));
        Overlaps::new(Search::new(self, queries))
    }

    /// Get an iterator over the payloads overlapping `query`.
    #[inline]
    pub fn overlapping<'a, 'q>(
        &'a self,
        query: &'q Interval<N, T>,
    ) -> Overlaps<'a, 'q, P, N, T, Ix> {
        self.overlaps([query])
    }

    /// Collect the payloads overlapping any of `queries`, projecting each query with `f`.
    #[inline]
    pub fn overlaps_by<Q, F>(&self, queries: &[Q], f: F) -> Vec<&P>
    where
        F: Fn(&Q) -> Interval<N, T>,
    {
        let intervals: Vec<_> = queries.iter().map(f).collect();
        self.overlaps(&intervals).collect()
    }

    /// Get an iterator over every `(query, payload)` pair that overlaps, queries taken in
    /// `(beg, end)` order.
    #[inline]
    pub fn overlap_pairs<'a, 'q, I>(&'a self, queries: I) -> OverlapPairs<'a, 'q, P, N, T, Ix>
    where
        I: IntoIterator<Item = &'q Interval<N, T>>,
    {
        let mut queries: Vec<_> = queries.into_iter().filter(|q| !q.is_empty()).collect();
        queries.sort_by(|a, b| natural_order(a, b));
        OverlapPairs::new(Search::new(self, queries))
    }

    /// Check if any record overlaps `query`.
    #[inline]
    pub fn is_overlapping(&self, query: &Interval<N, T>) -> bool {
        // a nested hit implies a hit on its top-level ancestor
        self.toplist.find_overlap_index_beg(query).is_some()
    }

    /// Check if any record of self overlaps any record of other.
    #[inline]
    pub fn intersects<Q, Jx>(&self, other: &IntervalSet<Q, N, T, Jx>) -> bool
    where
        Jx: IndexType,
    {
        other
            .toplist
            .iter()
            .any(|n| self.is_overlapping(&n.interval))
    }

    #[inline]
    pub fn is_disjoint<Q, Jx>(&self, other: &IntervalSet<Q, N, T, Jx>) -> bool
    where
        Jx: IndexType,
    {
        !self.intersects(other)
    }

    /// Check if the hull of self lies within the hull of other. With `proper` the hulls
    /// must differ; with `strict` some record of self must also overlap a record of other.
    ///
    /// # Example
    /// ```rust
    /// use nclist_set::{Interval, IntervalSet};
    ///
    /// let outer = IntervalSet::build([Interval::new("chr1", 0, 10), Interval::new("chr1", 40, 50)])
    ///     .unwrap();
    /// let inner = IntervalSet::build([Interval::new("chr1", 20, 30)]).unwrap();
    /// assert!(inner.is_subinterval(&outer, true, false));
    /// assert!(!inner.is_subinterval(&outer, true, true));
    /// ```
    pub fn is_subinterval<Q, Jx>(
        &self,
        other: &IntervalSet<Q, N, T, Jx>,
        proper: bool,
        strict: bool,
    ) -> bool
    where
        Q: Eq + Hash,
        Jx: IndexType,
    {
        let (Some(ours), Some(theirs)) = (self.hull(), other.hull()) else {
            return false;
        };
        let within = if proper {
            ours.is_proper_subinterval(&theirs)
        } else {
            ours.is_subinterval(&theirs)
        };
        within && (!strict || self.intersects(other))
    }

    /// Check if the hull of self covers the hull of other, see `is_subinterval`.
    #[inline]
    pub fn is_superinterval<Q, Jx>(
        &self,
        other: &IntervalSet<Q, N, T, Jx>,
        proper: bool,
        strict: bool,
    ) -> bool
    where
        Q: Eq + Hash,
        Jx: IndexType,
    {
        other.is_subinterval(self, proper, strict)
    }

    /// Check if the hulls of self and other touch end to begin.
    #[inline]
    pub fn is_abutting<Q, Jx>(&self, other: &IntervalSet<Q, N, T, Jx>) -> bool
    where
        Q: Eq + Hash,
        Jx: IndexType,
    {
        match (self.hull(), other.hull()) {
            (Some(ours), Some(theirs)) => ours.is_abutting(&theirs),
            _ => false,
        }
    }

    /// The interval spanning every record of self and other. Falls back to the hull of
    /// self when other is empty or on another namespace.
    #[inline]
    pub fn hull_with<Q, Jx>(&self, other: &IntervalSet<Q, N, T, Jx>) -> Option<Interval<N, T>>
    where
        Q: Eq + Hash,
        Jx: IndexType,
    {
        match (self.hull(), other.hull()) {
            (Some(ours), Some(theirs)) if ours.same_namespace(&theirs) => Some(ours.hull(&theirs)),
            (ours, _) => ours,
        }
    }

    /// Toplist range `[lower, upper)` spanning every top-level record that overlaps one
    /// of `queries`.
    #[inline]
    pub fn header_overlap_bounds<'q, I>(&self, queries: I) -> Option<(usize, usize)>
    where
        I: IntoIterator<Item = &'q Interval<N, T>>,
        N: 'q,
        T: 'q,
    {
        self.toplist.find_overlap_index_bounds(queries)
    }

    /// Build the set from projected nodes.
    ///
    /// Nodes are sorted longest-first, so a container always precedes what it contains and
    /// a single pass along the chain of open containers places every node under the last
    /// record strictly containing it.
    pub(crate) fn from_nodes(
        mut nodes: Vec<Node<P, N, T, Ix>>,
        projection: Projection<P, N, T>,
    ) -> Result<Self> {
        let input = nodes.len();
        nodes.sort_by(|a, b| longest_first(&a.interval, &b.interval));
        nodes.truncate(nodes.partition_point(|n| !n.interval.is_empty()));
        let empties = input - nodes.len();

        if let Some(first) = nodes.first() {
            if nodes
                .iter()
                .any(|n| !n.interval.same_namespace(&first.interval))
            {
                return Err(Error::MixedNamespace);
            }
        }

        let placements = plan_nesting(&nodes);
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        let mut tops = Vec::new();
        let mut len = 0;
        for (i, placement) in placements.iter().enumerate() {
            match placement {
                Placement::Top => tops.push(i),
                Placement::Child(parent) => children[*parent].push(i),
                Placement::Duplicate => continue,
            }
            len += 1;
        }

        // children always follow their parent, so walking backwards finishes every
        // sublist before its owner takes it
        let mut arena = Arena::default();
        let mut built: Vec<_> = nodes.into_iter().map(Some).collect();
        for i in (0..built.len()).rev() {
            if children[i].is_empty() {
                continue;
            }
            let kids: Vec<_> = children[i]
                .iter()
                .filter_map(|&c| built[c].take())
                .collect();
            let slot = arena.alloc_with(kids);
            if let Some(node) = built[i].as_mut() {
                Node::set_sublist(slot)(node);
            }
        }
        let toplist = Sublist::from_nodes(tops.iter().filter_map(|&t| built[t].take()).collect());

        debug!(
            input,
            empties,
            duplicates = input - empties - len,
            len,
            sublists = arena.live(),
            "built nested containment list"
        );
        Ok(IntervalSet {
            toplist,
            arena,
            len,
            projection,
        })
    }

    /// Locate the node holding `payload` at `interval`.
    pub(crate) fn find_record(
        &self,
        interval: &Interval<N, T>,
        payload: &P,
    ) -> Option<(ListId<Ix>, usize)> {
        let mut pending: Vec<ListId<Ix>> = vec![None];
        while let Some(list_id) = pending.pop() {
            let list = self.list(list_id);
            if let Some(index) = list.find_index(interval, payload) {
                return Some((list_id, index));
            }
            let Some(start) = list.find_overlap_index_beg(interval) else {
                continue;
            };
            // nothing starting after the record can hold it
            for node in list.as_slice()[start..]
                .iter()
                .take_while(|n| n.interval.beg <= interval.beg)
            {
                if let Some(slot) = node.sublist() {
                    if node.interval.is_proper_superinterval(interval) {
                        pending.push(Some(slot));
                    }
                }
            }
        }
        None
    }

    fn insert_node(&mut self, node: Node<P, N, T, Ix>) -> Result<()> {
        if node.interval.is_empty() {
            return Err(Error::EmptyInterval);
        }
        if self
            .toplist
            .first()
            .is_some_and(|first| !first.interval.same_namespace(&node.interval))
        {
            return Err(Error::MixedNamespace);
        }
        if self.find_record(&node.interval, &node.payload).is_some() {
            return Err(Error::DuplicateKey);
        }
        let start = self.toplist.find_index_beg(&node.interval);
        self.place(node, None, start);
        self.len += 1;
        trace!(len = self.len, "inserted record");
        Ok(())
    }

    /// Place `node` into `list`, scanning from `start` (or from the first entry ending
    /// after its begin). Entries the node strictly contains are moved into its sublist.
    fn place(&mut self, node: Node<P, N, T, Ix>, list: ListId<Ix>, start: Option<usize>) {
        let mut queue = VecDeque::from([(node, list, start)]);
        while let Some((mut node, mut list, start)) = queue.pop_front() {
            let mut index = start
                .or_else(|| self.list(list).find_index_beg(&node.interval))
                .unwrap_or(0);
            loop {
                let target = self.list(list);
                if index >= target.len() {
                    self.list_mut(list).push(node);
                    break;
                }
                let entry = &target[index].interval;
                if entry.is_proper_subinterval(&node.interval) {
                    let slot = match node.sublist() {
                        Some(slot) => slot,
                        None => {
                            let slot = self.arena.alloc();
                            Node::set_sublist(slot)(&mut node);
                            slot
                        }
                    };
                    let child = self.list_mut(list).remove(index);
                    queue.push_back((child, Some(slot), None));
                } else if entry.same_bounds(&node.interval)
                    || node.interval.is_proper_subinterval(entry)
                {
                    // the last of a tie run owns the shared sublist
                    while index + 1 < target.len() && target[index + 1].interval.same_bounds(entry)
                    {
                        index += 1;
                    }
                    if target[index].interval.same_bounds(&node.interval) {
                        let inherited = self.list_mut(list)[index].take_sublist();
                        match (node.sublist(), inherited) {
                            (_, None) => {}
                            (None, Some(slot)) => Node::set_sublist(slot)(&mut node),
                            (Some(own), Some(slot)) => {
                                // children still queued for the released slot follow it
                                for pending in queue.iter_mut().filter(|p| p.1 == Some(slot)) {
                                    pending.1 = Some(own);
                                    pending.2 = None;
                                }
                                for child in self.arena.release(slot).into_nodes() {
                                    queue.push_back((child, Some(own), None));
                                }
                            }
                        }
                        self.list_mut(list).insert(index + 1, node);
                        break;
                    }
                    let slot = self.ensure_sublist(list, index);
                    index = self
                        .arena
                        .get(slot)
                        .find_index_beg(&node.interval)
                        .unwrap_or(0);
                    list = Some(slot);
                } else if entry.end >= node.interval.end {
                    self.list_mut(list).insert(index, node);
                    break;
                } else {
                    index += 1;
                }
            }
        }
    }

    fn ensure_sublist(&mut self, list: ListId<Ix>, index: usize) -> SlotId<Ix> {
        if let Some(slot) = self.list(list)[index].sublist() {
            return slot;
        }
        let slot = self.arena.alloc();
        Node::set_sublist(slot)(&mut self.list_mut(list)[index]);
        slot
    }

    fn remove_record(&mut self, interval: &Interval<N, T>, payload: &P) -> Result<P> {
        let (list, index) = self
            .find_record(interval, payload)
            .ok_or(Error::NotFound)?;
        let node = self.remove_at(list, index);
        trace!(len = self.len, "removed record");
        Ok(node.payload)
    }

    /// Detach the node at `index` of `list`, re-nesting its children left to right.
    fn remove_at(&mut self, list: ListId<Ix>, index: usize) -> Node<P, N, T, Ix> {
        let mut node = self.list_mut(list).remove(index);
        if let Some(slot) = node.take_sublist() {
            for child in self.arena.release(slot).into_nodes() {
                self.place(child, list, None);
            }
        }
        self.len -= 1;
        node
    }
}

impl<P, N, T, Ix> IntervalSet<P, N, T, Ix>
where
    P: Eq + Hash,
    N: Namespace,
    T: Coordinate + Sub<Output = T>,
    Ix: IndexType,
{
    /// The top-level payload closest to `query`: the longest overlap wins, otherwise the
    /// smallest gap, ties going left.
    #[inline]
    pub fn nearest(&self, query: &Interval<N, T>) -> Option<&P> {
        self.toplist
            .find_index_nearest(query)
            .map(|i| self.toplist[i].payload())
    }

    /// Like `nearest`, but only a top-level payload overlapping `query` qualifies.
    #[inline]
    pub fn nearest_overlap(&self, query: &Interval<N, T>) -> Option<&P> {
        self.toplist
            .find_overlap_index_nearest(query)
            .map(|i| self.toplist[i].payload())
    }
}

/// Where the build pass puts a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Top,
    Child(usize),
    Duplicate,
}

/// Assign each node of a longest-first sorted slice to its parent.
///
/// `open` is the chain from the current top-level node down to the last placed node.
/// A node's parent is the deepest open node strictly containing it; identical bounds are
/// adjacent after sorting, so duplicates are caught within a run of equal bounds.
fn plan_nesting<P, N, T, Ix>(nodes: &[Node<P, N, T, Ix>]) -> Vec<Placement>
where
    P: Eq + Hash,
    N: Eq,
    T: Ord,
{
    let mut placements = Vec::with_capacity(nodes.len());
    let mut open: Vec<usize> = Vec::new();
    let mut run: HashSet<&P> = HashSet::new();
    for (i, node) in nodes.iter().enumerate() {
        if i == 0 || !nodes[i - 1].interval.same_bounds(&node.interval) {
            run.clear();
        }
        if !run.insert(&node.payload) {
            placements.push(Placement::Duplicate);
            continue;
        }
        while let Some(&top) = open.last() {
            if node.interval.is_proper_subinterval(&nodes[top].interval) {
                break;
            }
            let _ignore = open.pop();
        }
        placements.push(match open.last() {
            Some(&parent) => Placement::Child(parent),
            None => Placement::Top,
        });
        open.push(i);
    }
    placements
}

impl<P, N, T, Ix> Clone for IntervalSet<P, N, T, Ix>
where
    P: Clone,
    N: Clone,
    T: Clone,
    Ix: IndexType,
{
    /// Deep copy with an independent arena.
    fn clone(&self) -> Self {
        IntervalSet {
            toplist: self.toplist.clone(),
            arena: self.arena.clone(),
            len: self.len,
            projection: Arc::clone(&self.projection),
        }
    }
}

impl<P, N, T, Ix> fmt::Debug for IntervalSet<P, N, T, Ix>
where
    P: fmt::Debug,
    N: fmt::Debug,
    T: fmt::Debug,
    Ix: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntervalSet")
            .field("toplist", &self.toplist)
            .field("arena", &self.arena)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl<'a, P, N, T, Ix> IntoIterator for &'a IntervalSet<P, N, T, Ix>
where
    Ix: IndexType,
{
    type Item = &'a P;
    type IntoIter = Iter<'a, P, N, T, Ix>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use serde::de::{Deserialize, Deserializer, Error as _};
    use serde::ser::{Serialize, Serializer};

    use super::{identity, IntervalSet};
    use crate::index::IndexType;
    use crate::interval::{Coordinate, Interval, Namespace};

    /// Serialized as the sequence of payloads in iteration order.
    impl<P, N, T, Ix> Serialize for IntervalSet<P, N, T, Ix>
    where
        P: Serialize,
        Ix: IndexType,
    {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_seq(self.iter())
        }
    }

    impl<'de, N, T, Ix> Deserialize<'de> for IntervalSet<Interval<N, T>, N, T, Ix>
    where
        N: Namespace + Deserialize<'de>,
        T: Coordinate + Deserialize<'de>,
        Ix: IndexType,
    {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let intervals = Vec::<Interval<N, T>>::deserialize(deserializer)?;
            IntervalSet::build_from(intervals, identity()).map_err(D::Error::custom)
        }
    }
}
