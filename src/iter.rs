use std::collections::HashSet;
use std::slice;
use std::vec;

use crate::index::IndexType;
use crate::interval::Interval;
use crate::intervalset::{IntervalSet, ListId};
use crate::node::Node;

/// Depth-first walk over the nodes of a set, a container before its contents.
#[derive(Debug)]
pub(crate) struct Nodes<'a, P, N, T, Ix> {
    /// Reference to the set
    set_ref: &'a IntervalSet<P, N, T, Ix>,
    /// One frame per list being walked
    stack: Vec<slice::Iter<'a, Node<P, N, T, Ix>>>,
}

impl<'a, P, N, T, Ix> Nodes<'a, P, N, T, Ix>
where
    Ix: IndexType,
{
    pub fn new(set_ref: &'a IntervalSet<P, N, T, Ix>) -> Self {
        Nodes {
            set_ref,
            stack: vec![set_ref.toplist.iter()],
        }
    }
}

impl<'a, P, N, T, Ix> Iterator for Nodes<'a, P, N, T, Ix>
where
    Ix: IndexType,
{
    type Item = &'a Node<P, N, T, Ix>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let set_ref = self.set_ref;
        loop {
            let frame = self.stack.last_mut()?;
            match frame.next() {
                Some(node) => {
                    if let Some(slot) = node.sublist() {
                        self.stack.push(set_ref.arena.get(slot).iter());
                    }
                    return Some(node);
                }
                None => {
                    let _ignore = self.stack.pop();
                }
            }
        }
    }
}

/// An iterator over the payloads of an `IntervalSet`.
#[derive(Debug)]
pub struct Iter<'a, P, N, T, Ix> {
    inner: Nodes<'a, P, N, T, Ix>,
}

impl<'a, P, N, T, Ix> Iter<'a, P, N, T, Ix>
where
    Ix: IndexType,
{
    pub(crate) fn new(set_ref: &'a IntervalSet<P, N, T, Ix>) -> Self {
        Iter {
            inner: Nodes::new(set_ref),
        }
    }
}

impl<'a, P, N, T, Ix> Iterator for Iter<'a, P, N, T, Ix>
where
    Ix: IndexType,
{
    type Item = &'a P;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Node::payload)
    }
}

/// Position of a list being scanned for one query.
#[derive(Debug)]
struct Frame<'a, P, N, T, Ix> {
    list: ListId<Ix>,
    nodes: &'a [Node<P, N, T, Ix>],
    index: usize,
}

/// Overlap search over a sequence of queries.
///
/// For each query the toplist is entered at its first overlapping entry and scanned while
/// entries begin before the query ends; every hit pushes a frame for its own sublist,
/// entered the same way. Yields the query, the location and the node of each hit.
#[derive(Debug)]
pub(crate) struct Search<'a, 'q, P, N, T, Ix> {
    /// Reference to the set
    set_ref: &'a IntervalSet<P, N, T, Ix>,
    /// Queries not started yet
    queries: vec::IntoIter<&'q Interval<N, T>>,
    /// Query being searched
    query: Option<&'q Interval<N, T>>,
    /// Stack for the search
    stack: Vec<Frame<'a, P, N, T, Ix>>,
}

impl<'a, 'q, P, N, T, Ix> Search<'a, 'q, P, N, T, Ix>
where
    N: Eq,
    T: Ord,
    Ix: IndexType,
{
    pub fn new(set_ref: &'a IntervalSet<P, N, T, Ix>, queries: Vec<&'q Interval<N, T>>) -> Self {
        let mut search = Search {
            set_ref,
            queries: queries.into_iter(),
            query: None,
            stack: Vec::new(),
        };
        search.advance();
        search
    }

    /// Move on to the next query.
    fn advance(&mut self) {
        self.query = self.queries.next();
        if let Some(query) = self.query {
            let set_ref = self.set_ref;
            let toplist = &set_ref.toplist;
            if let Some(index) = toplist.find_overlap_index_beg(query) {
                self.stack.push(Frame {
                    list: None,
                    nodes: toplist.as_slice(),
                    index,
                });
            }
        }
    }
}

impl<'a, 'q, P, N, T, Ix> Iterator for Search<'a, 'q, P, N, T, Ix>
where
    N: Eq,
    T: Ord,
    Ix: IndexType,
{
    type Item = (&'q Interval<N, T>, ListId<Ix>, usize, &'a Node<P, N, T, Ix>);

    fn next(&mut self) -> Option<Self::Item> {
        let set_ref = self.set_ref;
        loop {
            let query = self.query?;
            let Some(frame) = self.stack.last_mut() else {
                self.advance();
                continue;
            };
            let nodes = frame.nodes;
            let (list, index) = (frame.list, frame.index);
            if index >= nodes.len() || nodes[index].interval.beg >= query.end {
                let _ignore = self.stack.pop();
                continue;
            }
            frame.index += 1;
            let node = &nodes[index];
            if !node.interval.overlaps(query) {
                continue;
            }
            if let Some(slot) = node.sublist() {
                let sublist = set_ref.arena.get(slot);
                if let Some(start) = sublist.find_overlap_index_beg(query) {
                    self.stack.push(Frame {
                        list: Some(slot),
                        nodes: sublist.as_slice(),
                        index: start,
                    });
                }
            }
            return Some((query, list, index, node));
        }
    }
}

/// An iterator over the payloads overlapping a set of queries, each reported once.
#[derive(Debug)]
pub struct Overlaps<'a, 'q, P, N, T, Ix> {
    search: Search<'a, 'q, P, N, T, Ix>,
    /// Locations already reported
    seen: HashSet<(ListId<Ix>, usize)>,
}

impl<'a, 'q, P, N, T, Ix> Overlaps<'a, 'q, P, N, T, Ix>
where
    Ix: IndexType,
{
    pub(crate) fn new(search: Search<'a, 'q, P, N, T, Ix>) -> Self {
        Overlaps {
            search,
            seen: HashSet::new(),
        }
    }
}

impl<'a, 'q, P, N, T, Ix> Iterator for Overlaps<'a, 'q, P, N, T, Ix>
where
    N: Eq,
    T: Ord,
    Ix: IndexType,
{
    type Item = &'a P;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (_, list, index, node) = self.search.next()?;
            if self.seen.insert((list, index)) {
                return Some(&node.payload);
            }
        }
    }
}

/// An iterator over every overlapping `(query, payload)` pair.
#[derive(Debug)]
pub struct OverlapPairs<'a, 'q, P, N, T, Ix> {
    search: Search<'a, 'q, P, N, T, Ix>,
}

impl<'a, 'q, P, N, T, Ix> OverlapPairs<'a, 'q, P, N, T, Ix> {
    pub(crate) fn new(search: Search<'a, 'q, P, N, T, Ix>) -> Self {
        OverlapPairs { search }
    }
}

impl<'a, 'q, P, N, T, Ix> Iterator for OverlapPairs<'a, 'q, P, N, T, Ix>
where
    N: Eq,
    T: Ord,
    Ix: IndexType,
{
    type Item = (&'q Interval<N, T>, &'a P);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.search
            .next()
            .map(|(query, _, _, node)| (query, &node.payload))
    }
}
