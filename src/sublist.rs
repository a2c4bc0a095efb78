//! A single level of the nested containment list.
//!
//! Every list is sorted by `(beg, end)`, holds one namespace, and no entry contains a
//! sibling, so the ends are non-decreasing as well. Both properties let every search below
//! run as a binary search over either bound. Searches return `None` when the list is empty
//! or the query lives on another namespace.

use std::ops::{Index, IndexMut, Sub};
use std::slice;

use crate::interval::Interval;
use crate::node::{natural_order, Node};

/// Ordered sequence of sibling nodes
#[derive(Debug, Clone)]
pub(crate) struct Sublist<P, N, T, Ix> {
    nodes: Vec<Node<P, N, T, Ix>>,
}

impl<P, N, T, Ix> Default for Sublist<P, N, T, Ix> {
    fn default() -> Self {
        Sublist { nodes: Vec::new() }
    }
}

impl<P, N, T, Ix> Sublist<P, N, T, Ix> {
    pub fn from_nodes(nodes: Vec<Node<P, N, T, Ix>>) -> Self {
        Sublist { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first(&self) -> Option<&Node<P, N, T, Ix>> {
        self.nodes.first()
    }

    pub fn last(&self) -> Option<&Node<P, N, T, Ix>> {
        self.nodes.last()
    }

    pub fn as_slice(&self) -> &[Node<P, N, T, Ix>] {
        &self.nodes
    }

    pub fn iter(&self) -> slice::Iter<'_, Node<P, N, T, Ix>> {
        self.nodes.iter()
    }

    pub fn push(&mut self, node: Node<P, N, T, Ix>) {
        self.nodes.push(node);
    }

    pub fn insert(&mut self, index: usize, node: Node<P, N, T, Ix>) {
        self.nodes.insert(index, node);
    }

    pub fn remove(&mut self, index: usize) -> Node<P, N, T, Ix> {
        self.nodes.remove(index)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn into_nodes(self) -> Vec<Node<P, N, T, Ix>> {
        self.nodes
    }
}

impl<P, N, T, Ix> Index<usize> for Sublist<P, N, T, Ix> {
    type Output = Node<P, N, T, Ix>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.nodes[index]
    }
}

impl<P, N, T, Ix> IndexMut<usize> for Sublist<P, N, T, Ix> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.nodes[index]
    }
}

impl<P, N, T, Ix> Sublist<P, N, T, Ix>
where
    N: Eq,
    T: Ord,
{
    fn accepts(&self, query: &Interval<N, T>) -> bool {
        self.nodes
            .first()
            .is_some_and(|n| n.interval.same_namespace(query))
    }

    /// First index whose end exceeds `query.beg`.
    pub fn find_index_beg(&self, query: &Interval<N, T>) -> Option<usize> {
        self.accepts(query)
            .then(|| self.nodes.partition_point(|n| n.interval.end <= query.beg))
    }

    /// First index whose beg is not less than `query.end`, the list length when every
    /// entry begins before it.
    pub fn find_index_end(&self, query: &Interval<N, T>) -> Option<usize> {
        self.accepts(query)
            .then(|| self.nodes.partition_point(|n| n.interval.beg < query.end))
    }

    /// Index of the entry holding `payload` at the bounds of `query`.
    pub fn find_index(&self, query: &Interval<N, T>, payload: &P) -> Option<usize>
    where
        P: Eq,
    {
        if !self.accepts(query) {
            return None;
        }
        let lower = self
            .nodes
            .partition_point(|n| natural_order(&n.interval, query).is_lt());
        self.nodes[lower..]
            .iter()
            .take_while(|n| n.interval.same_bounds(query))
            .position(|n| n.is_record(query, payload))
            .map(|offset| lower + offset)
    }

    /// First entry overlapping `query`.
    pub fn find_overlap_index_beg(&self, query: &Interval<N, T>) -> Option<usize> {
        let index = self.find_index_beg(query)?;
        (index < self.len() && self.nodes[index].interval.overlaps(query)).then_some(index)
    }

    /// One past the last entry overlapping `query`.
    pub fn find_overlap_index_end(&self, query: &Interval<N, T>) -> Option<usize> {
        let index = self.find_index_end(query)?;
        (index > 0 && self.nodes[index - 1].interval.overlaps(query)).then_some(index)
    }

    /// Range `[lower, upper)` spanning every entry that overlaps one of `queries`.
    pub fn find_overlap_index_bounds<'q, I>(&self, queries: I) -> Option<(usize, usize)>
    where
        I: IntoIterator<Item = &'q Interval<N, T>>,
        N: 'q,
        T: 'q,
    {
        queries
            .into_iter()
            .filter_map(|q| {
                let lower = self.find_overlap_index_beg(q)?;
                let upper = self.find_overlap_index_end(q)?;
                Some((lower, upper))
            })
            .reduce(|(l0, u0), (l1, u1)| (l0.min(l1), u0.max(u1)))
    }
}

impl<P, N, T, Ix> Sublist<P, N, T, Ix>
where
    N: Eq,
    T: Clone + Ord + Sub<Output = T>,
{
    /// Entry closest to `query`, ties going to the left neighbour.
    pub fn find_index_nearest(&self, query: &Interval<N, T>) -> Option<usize> {
        if !self.accepts(query) {
            return None;
        }
        let lower = self
            .nodes
            .partition_point(|n| natural_order(&n.interval, query).is_lt());
        if lower == 0 {
            return Some(0);
        }
        if lower == self.len() {
            return Some(lower - 1);
        }
        let left = query.proximity(&self.nodes[lower - 1].interval);
        let right = query.proximity(&self.nodes[lower].interval);
        match (left, right) {
            (Some(l), Some(r)) if r < l => Some(lower),
            _ => Some(lower - 1),
        }
    }

    /// Nearest entry, only when it overlaps `query`.
    pub fn find_overlap_index_nearest(&self, query: &Interval<N, T>) -> Option<usize> {
        let index = self.find_index_nearest(query)?;
        self.nodes[index]
            .interval
            .overlaps(query)
            .then_some(index)
    }
}
