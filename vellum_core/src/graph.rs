// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dependency graph construction for a validation pass.
//!
//! [`build`] expands the dirty set into every figure whose derived state is
//! stale, following three relations:
//!
//! 1. **Subtree**: a figure marked with any
//!    [`PROPAGATING`](DirtyMask::PROPAGATING) bit pulls in its whole subtree
//!    in pre-order, unless it is a
//!    [traversal boundary](crate::figure::Figure::is_traversal_boundary), in
//!    which case only the figure itself is added.
//! 2. **Child layout**: every vertex whose parent
//!    [performs child layout](crate::figure::Figure::performs_child_layout)
//!    adds the parent, with an edge `child → parent`. Repeating this for the
//!    parent walks the chain upward while the marker holds.
//! 3. **Layout observers**: every vertex adds its layout observers, with an
//!    edge `vertex → observer`.
//!
//! Relations 2 and 3 are followed breadth-first until no new vertex appears.
//! Vertices are deduplicated by slot, so a figure reachable along several
//! paths appears once. Only figures in the drawing become vertices: a layout
//! observer that was detached keeps its relation but is not followed.
//!
//! An edge `f → o` means `f` must be recomputed before `o`. The graph is built
//! fresh for every pass and dropped afterwards.

use alloc::collections::VecDeque;
use alloc::vec;
use alloc::vec::Vec;

use crate::dirty::{DirtyMask, DirtySet};
use crate::figure::{Figure, FigureId, FigureStore, INVALID};

/// A directed graph over figure slots.
///
/// Vertices keep their insertion order; [`topo::sort`](crate::topo::sort)
/// uses it to break ties.
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    /// Vertex slots in insertion order.
    vertices: Vec<u32>,
    /// Slot → vertex position, [`INVALID`] when absent.
    position: Vec<u32>,
    /// Outgoing edges per vertex position.
    successors: Vec<Vec<u32>>,
    edge_count: usize,
}

impl DependencyGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `slot` as a vertex. Returns `true` if it was not present.
    pub fn add_vertex(&mut self, slot: u32) -> bool {
        let i = slot as usize;
        if i >= self.position.len() {
            self.position.resize(i + 1, INVALID);
        }
        if self.position[i] != INVALID {
            return false;
        }
        self.position[i] = self.vertex_position(self.vertices.len());
        self.vertices.push(slot);
        self.successors.push(Vec::new());
        true
    }

    /// Adds the edge `from → to`, adding missing vertices first.
    ///
    /// Returns `true` if the edge was not present.
    pub fn add_edge(&mut self, from: u32, to: u32) -> bool {
        self.add_vertex(from);
        self.add_vertex(to);
        let from_pos = self.position[from as usize] as usize;
        let out = &mut self.successors[from_pos];
        if out.contains(&to) {
            return false;
        }
        out.push(to);
        self.edge_count += 1;
        true
    }

    /// Returns whether `slot` is a vertex.
    #[must_use]
    pub fn contains(&self, slot: u32) -> bool {
        self.position
            .get(slot as usize)
            .is_some_and(|&pos| pos != INVALID)
    }

    /// Returns the vertex slots in insertion order.
    #[must_use]
    pub fn vertices(&self) -> &[u32] {
        &self.vertices
    }

    /// Returns the slots `slot` has edges to.
    #[must_use]
    pub fn successors(&self, slot: u32) -> &[u32] {
        match self.position.get(slot as usize) {
            Some(&pos) if pos != INVALID => &self.successors[pos as usize],
            _ => &[],
        }
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Returns whether the graph has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Returns the number of incoming edges per vertex, in vertex order.
    pub(crate) fn in_degrees(&self) -> Vec<u32> {
        let mut degrees = vec![0_u32; self.vertices.len()];
        for out in &self.successors {
            for &to in out {
                degrees[self.position[to as usize] as usize] += 1;
            }
        }
        degrees
    }

    /// Returns the vertex position of `slot`.
    ///
    /// Only valid for slots that are vertices.
    pub(crate) fn position_of(&self, slot: u32) -> usize {
        self.position[slot as usize] as usize
    }

    fn vertex_position(&self, len: usize) -> u32 {
        u32::try_from(len).unwrap_or_else(|_| panic!("dependency graph exceeds {INVALID} vertices"))
    }
}

/// Builds the dependency graph for the entries of `dirty` in the drawing
/// rooted at `root`.
///
/// Only entries whose mask intersects [`DirtyMask::PROPAGATING`] seed the
/// graph; style-only entries are recomputed by the validator without graph
/// membership. Figures whose topmost ancestor is not `root` are skipped.
#[must_use]
pub fn build<F: Figure>(
    store: &FigureStore<F>,
    dirty: &DirtySet,
    root: FigureId,
) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    let mut queue = VecDeque::new();
    let in_drawing = |slot: u32| store.top(store.id_at(slot)) == root;

    for (slot, mask) in dirty.iter() {
        if !mask.intersects(DirtyMask::PROPAGATING) || !in_drawing(slot) {
            continue;
        }
        if store.figure_at(slot).is_traversal_boundary() {
            if graph.add_vertex(slot) {
                queue.push_back(slot);
            }
            continue;
        }
        for id in store.preorder(store.id_at(slot)) {
            if graph.add_vertex(id.idx) {
                queue.push_back(id.idx);
            }
        }
    }

    while let Some(slot) = queue.pop_front() {
        let parent = store.parent[slot as usize];
        if parent != INVALID && store.figure_at(parent).performs_child_layout() {
            let new = !graph.contains(parent);
            graph.add_edge(slot, parent);
            if new {
                queue.push_back(parent);
            }
        }
        for observer in store.observers_at(slot) {
            if !in_drawing(observer) {
                continue;
            }
            let new = !graph.contains(observer);
            graph.add_edge(slot, observer);
            if new {
                queue.push_back(observer);
            }
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestFigure;

    fn slots(ids: &[FigureId]) -> Vec<u32> {
        ids.iter().map(|id| id.idx).collect()
    }

    #[test]
    fn add_vertex_and_edge_dedup() {
        let mut graph = DependencyGraph::new();
        assert!(graph.add_vertex(4));
        assert!(!graph.add_vertex(4));
        assert!(graph.add_edge(4, 1));
        assert!(!graph.add_edge(4, 1));
        assert_eq!(graph.vertices(), &[4, 1]);
        assert_eq!(graph.successors(4), &[1]);
        assert_eq!(graph.successors(1), &[] as &[u32]);
        assert_eq!(graph.successors(99), &[] as &[u32]);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.in_degrees(), vec![0, 1]);
        assert!(graph.contains(1));
        assert!(!graph.contains(2));
    }

    #[test]
    fn style_only_entries_stay_out_of_the_graph() {
        let mut store = FigureStore::new();
        let a = store.create(TestFigure::new("a"));
        let mut dirty = DirtySet::new();
        dirty.mark(a.idx, DirtyMask::STYLE);

        let graph = build(&store, &dirty, a);
        assert!(graph.is_empty());
    }

    #[test]
    fn layout_mark_pulls_in_subtree() {
        let mut store = FigureStore::new();
        let a = store.create(TestFigure::new("a"));
        let b = store.create(TestFigure::new("b"));
        let c = store.create(TestFigure::new("c"));
        store.link(a, b, 0);
        store.link(b, c, 0);

        let mut dirty = DirtySet::new();
        dirty.mark(a.idx, DirtyMask::LAYOUT);
        let graph = build(&store, &dirty, a);

        assert_eq!(graph.vertices(), slots(&[a, b, c]).as_slice());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn boundary_stops_subtree_expansion() {
        let mut store = FigureStore::new();
        let layer = store.create(TestFigure::new("layer").as_boundary());
        let child = store.create(TestFigure::new("child"));
        store.link(layer, child, 0);

        let mut dirty = DirtySet::new();
        dirty.mark(layer.idx, DirtyMask::LAYOUT);
        let graph = build(&store, &dirty, layer);

        assert_eq!(graph.vertices(), &[layer.idx]);
    }

    #[test]
    fn child_layout_chain_adds_ancestors_with_edges() {
        let mut store = FigureStore::new();
        let root = store.create(TestFigure::new("root"));
        let group = store.create(TestFigure::new("group").with_child_layout());
        let inner = store.create(TestFigure::new("inner").with_child_layout());
        let leaf = store.create(TestFigure::new("leaf"));
        store.link(root, group, 0);
        store.link(group, inner, 0);
        store.link(inner, leaf, 0);

        let mut dirty = DirtySet::new();
        dirty.mark(leaf.idx, DirtyMask::LAYOUT);
        let graph = build(&store, &dirty, root);

        // `root` does not perform child layout, so the walk stops below it.
        assert_eq!(graph.vertices(), slots(&[leaf, inner, group]).as_slice());
        assert_eq!(graph.successors(leaf.idx), &[inner.idx]);
        assert_eq!(graph.successors(inner.idx), &[group.idx]);
        assert!(!graph.contains(root.idx));
    }

    #[test]
    fn observers_are_followed_transitively() {
        let mut store = FigureStore::new();
        let root = store.create(TestFigure::new("root"));
        let a = store.create(TestFigure::new("a"));
        let b = store.create(TestFigure::new("b"));
        let c = store.create(TestFigure::new("c"));
        for (i, id) in [a, b, c].into_iter().enumerate() {
            store.link(root, id, i);
        }
        assert_eq!(store.add_layout_subject(b, a), Ok(true));
        assert_eq!(store.add_layout_subject(c, b), Ok(true));

        let mut dirty = DirtySet::new();
        dirty.mark(a.idx, DirtyMask::LAYOUT_OBSERVERS);
        let graph = build(&store, &dirty, root);

        assert_eq!(graph.vertices(), slots(&[a, b, c]).as_slice());
        assert_eq!(graph.successors(a.idx), &[b.idx]);
        assert_eq!(graph.successors(b.idx), &[c.idx]);
    }

    #[test]
    fn diamond_keeps_one_vertex_per_figure() {
        let mut store = FigureStore::new();
        let root = store.create(TestFigure::new("root"));
        let a = store.create(TestFigure::new("a"));
        let b = store.create(TestFigure::new("b"));
        let c = store.create(TestFigure::new("c"));
        let d = store.create(TestFigure::new("d"));
        for (i, id) in [a, b, c, d].into_iter().enumerate() {
            store.link(root, id, i);
        }
        for (observer, subject) in [(b, a), (c, a), (d, b), (d, c)] {
            assert_eq!(store.add_layout_subject(observer, subject), Ok(true));
        }

        let mut dirty = DirtySet::new();
        dirty.mark(a.idx, DirtyMask::LAYOUT);
        dirty.mark(d.idx, DirtyMask::LAYOUT);
        let graph = build(&store, &dirty, root);

        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn observers_outside_the_drawing_are_skipped() {
        let mut store = FigureStore::new();
        let root = store.create(TestFigure::new("root"));
        let a = store.create(TestFigure::new("a"));
        let inside = store.create(TestFigure::new("inside"));
        let loose = store.create(TestFigure::new("loose"));
        store.link(root, a, 0);
        store.link(root, inside, 1);
        assert_eq!(store.add_layout_subject(inside, a), Ok(true));
        assert_eq!(store.add_layout_subject(loose, a), Ok(true));

        let mut dirty = DirtySet::new();
        dirty.mark(a.idx, DirtyMask::LAYOUT);
        let graph = build(&store, &dirty, root);

        assert_eq!(graph.vertices(), slots(&[a, inside]).as_slice());
        assert!(!graph.contains(loose.idx));
        assert_eq!(graph.edge_count(), 1);
    }
}
