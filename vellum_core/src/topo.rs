// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Topological ordering of a [`DependencyGraph`].

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::graph::DependencyGraph;

/// A sort that could not place every vertex because of a cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stalled {
    /// Slots that were placed, in order.
    pub order: Vec<u32>,
    /// Slots left on or behind a cycle, in vertex insertion order.
    pub remaining: Vec<u32>,
}

impl Stalled {
    /// Returns the placed slots followed by the remaining ones.
    ///
    /// Every vertex appears exactly once; edges among the remaining slots are
    /// not honored.
    #[must_use]
    pub fn into_appended(self) -> Vec<u32> {
        let mut order = self.order;
        order.extend(self.remaining);
        order
    }
}

/// Orders the slots of `graph` so that for every edge `f → o`, `f` comes
/// before `o`.
///
/// Uses Kahn's algorithm. Among vertices that become ready together, the one
/// added to the graph first comes first.
///
/// # Errors
///
/// Returns [`Stalled`] if the graph contains a cycle.
pub fn sort(graph: &DependencyGraph) -> Result<Vec<u32>, Stalled> {
    let vertices = graph.vertices();
    let mut in_degree = graph.in_degrees();
    let mut ready: VecDeque<u32> = vertices
        .iter()
        .zip(&in_degree)
        .filter(|&(_, &d)| d == 0)
        .map(|(&slot, _)| slot)
        .collect();

    let mut order = Vec::with_capacity(vertices.len());
    while let Some(slot) = ready.pop_front() {
        order.push(slot);
        for &next in graph.successors(slot) {
            let d = &mut in_degree[graph.position_of(next)];
            *d -= 1;
            if *d == 0 {
                ready.push_back(next);
            }
        }
    }

    if order.len() == vertices.len() {
        return Ok(order);
    }
    let remaining = vertices
        .iter()
        .zip(&in_degree)
        .filter(|&(_, &d)| d > 0)
        .map(|(&slot, _)| slot)
        .collect();
    Err(Stalled { order, remaining })
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn graph(vertices: &[u32], edges: &[(u32, u32)]) -> DependencyGraph {
        let mut g = DependencyGraph::new();
        for &v in vertices {
            g.add_vertex(v);
        }
        for &(from, to) in edges {
            g.add_edge(from, to);
        }
        g
    }

    fn position(order: &[u32], slot: u32) -> usize {
        order.iter().position(|&s| s == slot).unwrap()
    }

    #[test]
    fn empty_graph_sorts_to_nothing() {
        assert_eq!(sort(&DependencyGraph::new()), Ok(vec![]));
    }

    #[test]
    fn independent_vertices_keep_insertion_order() {
        let g = graph(&[5, 2, 9], &[]);
        assert_eq!(sort(&g), Ok(vec![5, 2, 9]));
    }

    #[test]
    fn chain_is_ordered() {
        // Inserted in reverse so insertion order alone would be wrong.
        let g = graph(&[3, 2, 1], &[(1, 2), (2, 3)]);
        assert_eq!(sort(&g), Ok(vec![1, 2, 3]));
    }

    #[test]
    fn every_edge_is_honored() {
        let edges = [(0, 4), (1, 4), (4, 2), (3, 2), (2, 5), (0, 5)];
        let g = graph(&[5, 4, 3, 2, 1, 0], &edges);
        let order = sort(&g).unwrap();
        assert_eq!(order.len(), 6);
        for (from, to) in edges {
            assert!(position(&order, from) < position(&order, to));
        }
    }

    #[test]
    fn diamond_places_each_vertex_once() {
        let g = graph(&[0, 1, 2, 3], &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        assert_eq!(sort(&g), Ok(vec![0, 1, 2, 3]));
    }

    #[test]
    fn cycle_stalls_and_reports_remaining() {
        // 0 -> 1 -> 2 -> 1, and 2 -> 3.
        let g = graph(&[0, 1, 2, 3], &[(0, 1), (1, 2), (2, 1), (2, 3)]);
        let stalled = sort(&g).unwrap_err();
        assert_eq!(stalled.order, vec![0]);
        assert_eq!(stalled.remaining, vec![1, 2, 3]);
        assert_eq!(stalled.into_appended(), vec![0, 1, 2, 3]);
    }
}
