// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays figure storage with allocation, topology, and layout
//! relation management.

use alloc::vec::Vec;

use understory_dirty::{Channel, CycleHandling, DirtyGraph};

use super::id::{FigureId, INVALID};
use super::traverse::{Ancestors, Children, Preorder};

/// The only channel of the layout relation graph.
const LAYOUT_RELATION: Channel = Channel::new(0);

/// Struct-of-arrays storage for all figures of a drawing.
///
/// Figures are addressed by [`FigureId`] handles. Internally, each figure
/// occupies a slot in parallel arrays. Destroyed figures are recycled via a
/// free list, and generation counters prevent stale handle access.
///
/// The store is read-only from the outside; all mutation goes through
/// [`DrawingModel`](crate::model::DrawingModel) so that every change is
/// observed.
#[derive(Debug)]
pub struct FigureStore<F> {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Figures --
    pub(crate) figures: Vec<Option<F>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Layout relation: observer depends on subject --
    pub(crate) relations: DirtyGraph<u32>,
    pub(crate) cycle_handling: CycleHandling,
}

impl<F> Default for FigureStore<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> FigureStore<F> {
    /// Creates an empty store that rejects layout relation cycles.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cycle_handling(CycleHandling::Error)
    }

    /// Creates an empty store with the given layout relation cycle policy.
    #[must_use]
    pub fn with_cycle_handling(cycle_handling: CycleHandling) -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            figures: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            relations: DirtyGraph::new(),
            cycle_handling,
        }
    }

    /// Returns the number of live figures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    /// Returns whether the store holds no live figures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of allocated slots, live or free.
    #[must_use]
    pub fn slot_count(&self) -> u32 {
        self.len
    }

    // -- Allocation API --

    /// Allocates a detached figure and returns its handle.
    pub(crate) fn create(&mut self, figure: F) -> FigureId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot; its generation was bumped on destroy.
            self.parent[idx as usize] = INVALID;
            self.first_child[idx as usize] = INVALID;
            self.next_sibling[idx as usize] = INVALID;
            self.prev_sibling[idx as usize] = INVALID;
            self.figures[idx as usize] = Some(figure);
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.figures.push(Some(figure));
            self.generation.push(0);
            idx
        };
        self.id_at(idx)
    }

    /// Frees a detached, childless figure and returns it.
    ///
    /// Drops every layout relation the figure takes part in.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, or if the figure has a parent or
    /// children.
    pub(crate) fn destroy(&mut self, id: FigureId) -> F {
        self.check(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy figure with children"
        );
        assert!(
            self.parent[idx as usize] == INVALID,
            "cannot destroy a figure that still has a parent"
        );

        self.relations.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] = self.generation[idx as usize].wrapping_add(1);
        self.free_list.push(idx);

        let Some(figure) = self.figures[idx as usize].take() else {
            unreachable!("checked slot {idx} holds a figure");
        };
        figure
    }

    /// Returns whether the given handle refers to a live figure.
    #[must_use]
    pub fn is_alive(&self, id: FigureId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.figures[id.idx as usize].is_some()
    }

    // -- Topology API --

    /// Links `child` into `parent`'s child list at `index`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent, if
    /// `child` is `parent` or one of its ancestors, or if `index` exceeds the
    /// child count.
    pub(crate) fn link(&mut self, parent: FigureId, child: FigureId, index: usize) {
        self.check(parent);
        self.check(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        assert!(
            !self.is_ancestor_slot(c, p),
            "cannot attach a figure below itself"
        );
        let count = self.child_count(parent);
        assert!(
            index <= count,
            "child index {index} out of range (child count {count})"
        );

        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if index == count {
            if self.first_child[p as usize] == INVALID {
                self.first_child[p as usize] = c;
            } else {
                // Walk to last child.
                let mut last = self.first_child[p as usize];
                while self.next_sibling[last as usize] != INVALID {
                    last = self.next_sibling[last as usize];
                }
                self.next_sibling[last as usize] = c;
                self.prev_sibling[c as usize] = last;
            }
        } else {
            let mut sibling = self.first_child[p as usize];
            for _ in 0..index {
                sibling = self.next_sibling[sibling as usize];
            }
            let prev = self.prev_sibling[sibling as usize];
            self.next_sibling[c as usize] = sibling;
            self.prev_sibling[c as usize] = prev;
            if prev != INVALID {
                self.next_sibling[prev as usize] = c;
            } else {
                // `sibling` was the first child.
                self.first_child[p as usize] = c;
            }
            self.prev_sibling[sibling as usize] = c;
        }
    }

    /// Removes `child` from its parent's child list.
    ///
    /// Returns the former parent and the index the child had in it.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the figure has no parent.
    pub(crate) fn unlink(&mut self, child: FigureId) -> (FigureId, usize) {
        let Some(index) = self.index_of(child) else {
            panic!("figure has no parent");
        };
        let idx = child.idx;
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;

        (self.id_at(p), index)
    }

    /// Returns the parent of a figure, if any.
    #[must_use]
    pub fn parent(&self, id: FigureId) -> Option<FigureId> {
        self.check(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.id_at(p))
    }

    /// Returns an iterator over the direct children of a figure.
    #[must_use]
    pub fn children(&self, id: FigureId) -> Children<'_, F> {
        self.check(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the number of direct children of a figure.
    #[must_use]
    pub fn child_count(&self, id: FigureId) -> usize {
        self.children(id).count()
    }

    /// Returns the position of a figure among its parent's children.
    #[must_use]
    pub fn index_of(&self, id: FigureId) -> Option<usize> {
        self.check(id);
        let mut index = 0;
        let mut prev = self.prev_sibling[id.idx as usize];
        while prev != INVALID {
            index += 1;
            prev = self.prev_sibling[prev as usize];
        }
        (self.parent[id.idx as usize] != INVALID).then_some(index)
    }

    /// Returns a depth-first pre-order iterator over the subtree at `id`.
    #[must_use]
    pub fn preorder(&self, id: FigureId) -> Preorder<'_, F> {
        self.check(id);
        Preorder::new(self, id.idx)
    }

    /// Returns an iterator from `id` up to the top of its tree.
    #[must_use]
    pub fn ancestors(&self, id: FigureId) -> Ancestors<'_, F> {
        self.check(id);
        Ancestors::new(self, id.idx)
    }

    /// Returns the topmost ancestor of `id` (`id` itself when detached).
    #[must_use]
    pub fn top(&self, id: FigureId) -> FigureId {
        self.ancestors(id).last().unwrap_or(id)
    }

    // -- Figure access --

    /// Returns the figure behind a handle.
    #[must_use]
    pub fn figure(&self, id: FigureId) -> &F {
        self.check(id);
        self.figure_at(id.idx)
    }

    pub(crate) fn figure_mut(&mut self, id: FigureId) -> &mut F {
        self.check(id);
        self.figure_at_mut(id.idx)
    }

    // -- Layout relation API --

    /// Records that `observer`'s layout depends on `subject`.
    ///
    /// Returns `Ok(true)` if the relation was added, `Ok(false)` if it already
    /// existed or the cycle policy ignored it, and `Err(())` if it would close
    /// a cycle under [`CycleHandling::Error`].
    pub(crate) fn add_layout_subject(
        &mut self,
        observer: FigureId,
        subject: FigureId,
    ) -> Result<bool, ()> {
        self.check(observer);
        self.check(subject);
        self.relations
            .add_dependency(observer.idx, subject.idx, LAYOUT_RELATION, self.cycle_handling)
            .map_err(|_| ())
    }

    /// Drops the relation recorded by [`add_layout_subject`](Self::add_layout_subject).
    pub(crate) fn remove_layout_subject(&mut self, observer: FigureId, subject: FigureId) -> bool {
        self.check(observer);
        self.check(subject);
        self.relations
            .remove_dependency(observer.idx, subject.idx, LAYOUT_RELATION)
    }

    /// Returns the figures whose layout `id` depends on.
    pub fn layout_subjects(&self, id: FigureId) -> impl Iterator<Item = FigureId> + '_ {
        self.check(id);
        self.subjects_at(id.idx).map(|idx| self.id_at(idx))
    }

    /// Returns the figures whose layout depends on `id`.
    pub fn layout_observers(&self, id: FigureId) -> impl Iterator<Item = FigureId> + '_ {
        self.check(id);
        self.observers_at(id.idx).map(|idx| self.id_at(idx))
    }

    // -- Raw-index accessors --
    //
    // These accept raw slot indices (as stored in the dirty set and the
    // dependency graph) and skip generation validation.

    pub(crate) fn id_at(&self, idx: u32) -> FigureId {
        FigureId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    pub(crate) fn figure_at(&self, idx: u32) -> &F {
        let Some(figure) = self.figures[idx as usize].as_ref() else {
            panic!("slot {idx} holds no figure");
        };
        figure
    }

    pub(crate) fn figure_at_mut(&mut self, idx: u32) -> &mut F {
        let Some(figure) = self.figures[idx as usize].as_mut() else {
            panic!("slot {idx} holds no figure");
        };
        figure
    }

    pub(crate) fn observers_at(&self, idx: u32) -> impl Iterator<Item = u32> + '_ {
        self.relations.dependents(idx, LAYOUT_RELATION)
    }

    pub(crate) fn subjects_at(&self, idx: u32) -> impl Iterator<Item = u32> + '_ {
        self.relations.dependencies(idx, LAYOUT_RELATION)
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn check(&self, id: FigureId) {
        assert!(
            self.is_alive(id),
            "stale FigureId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Returns whether `ancestor` is `idx` or one of its ancestors.
    fn is_ancestor_slot(&self, ancestor: u32, idx: u32) -> bool {
        let mut node = idx;
        while node != INVALID {
            if node == ancestor {
                return true;
            }
            node = self.parent[node as usize];
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::testing::TestFigure;

    fn store_with(n: usize) -> (FigureStore<TestFigure>, Vec<FigureId>) {
        let mut store = FigureStore::new();
        let ids = (0..n).map(|_| store.create(TestFigure::new("f"))).collect();
        (store, ids)
    }

    #[test]
    fn create_and_destroy() {
        let (mut store, ids) = store_with(1);
        assert!(store.is_alive(ids[0]));
        assert_eq!(store.len(), 1);
        let _ = store.destroy(ids[0]);
        assert!(!store.is_alive(ids[0]));
        assert!(store.is_empty());
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = FigureStore::new();
        let id1 = store.create(TestFigure::new("a"));
        let _ = store.destroy(id1);
        let id2 = store.create(TestFigure::new("b"));
        // id2 reuses the same slot but has a different generation.
        assert!(!store.is_alive(id1));
        assert!(store.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
        assert_eq!(store.figure(id2).name, "b");
    }

    #[test]
    fn link_appends_and_inserts() {
        let (mut store, ids) = store_with(4);
        let [parent, a, b, c] = [ids[0], ids[1], ids[2], ids[3]];

        store.link(parent, a, 0);
        store.link(parent, c, 1);
        store.link(parent, b, 1);

        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![a, b, c]);
        assert_eq!(store.parent(b), Some(parent));
        assert_eq!(store.index_of(a), Some(0));
        assert_eq!(store.index_of(c), Some(2));
        assert_eq!(store.index_of(parent), None);
        assert_eq!(store.child_count(parent), 3);
    }

    #[test]
    fn link_at_front() {
        let (mut store, ids) = store_with(3);
        store.link(ids[0], ids[1], 0);
        store.link(ids[0], ids[2], 0);
        let kids: Vec<_> = store.children(ids[0]).collect();
        assert_eq!(kids, vec![ids[2], ids[1]]);
    }

    #[test]
    fn unlink_reports_parent_and_index() {
        let (mut store, ids) = store_with(4);
        for &child in &ids[1..] {
            let at = store.child_count(ids[0]);
            store.link(ids[0], child, at);
        }

        assert_eq!(store.unlink(ids[2]), (ids[0], 1));
        assert_eq!(store.parent(ids[2]), None);
        let kids: Vec<_> = store.children(ids[0]).collect();
        assert_eq!(kids, vec![ids[1], ids[3]]);

        assert_eq!(store.unlink(ids[1]), (ids[0], 0));
        assert_eq!(store.unlink(ids[3]), (ids[0], 0));
        assert!(store.children(ids[0]).next().is_none());
    }

    #[test]
    fn preorder_is_depth_first() {
        let (mut store, ids) = store_with(5);
        let [a, b, c, d, e] = [ids[0], ids[1], ids[2], ids[3], ids[4]];

        // Tree: a -> [b -> [d], c -> [e]]
        store.link(a, b, 0);
        store.link(a, c, 1);
        store.link(b, d, 0);
        store.link(c, e, 0);

        let order: Vec<_> = store.preorder(a).collect();
        assert_eq!(order, vec![a, b, d, c, e]);

        // A subtree traversal stays inside the subtree.
        let order: Vec<_> = store.preorder(b).collect();
        assert_eq!(order, vec![b, d]);

        // Traversals restart from scratch.
        assert_eq!(store.preorder(a).count(), 5);
        assert_eq!(store.preorder(a).count(), 5);
    }

    #[test]
    fn ancestors_start_with_self() {
        let (mut store, ids) = store_with(3);
        store.link(ids[0], ids[1], 0);
        store.link(ids[1], ids[2], 0);

        let chain: Vec<_> = store.ancestors(ids[2]).collect();
        assert_eq!(chain, vec![ids[2], ids[1], ids[0]]);
        assert_eq!(store.top(ids[2]), ids[0]);
        assert_eq!(store.top(ids[0]), ids[0]);
    }

    #[test]
    fn layout_relation_queries() {
        let (mut store, ids) = store_with(3);
        assert_eq!(store.add_layout_subject(ids[1], ids[0]), Ok(true));
        assert_eq!(store.add_layout_subject(ids[2], ids[0]), Ok(true));
        assert_eq!(store.add_layout_subject(ids[2], ids[0]), Ok(false));

        let observers: Vec<_> = store.layout_observers(ids[0]).collect();
        assert_eq!(observers, vec![ids[1], ids[2]]);
        let subjects: Vec<_> = store.layout_subjects(ids[2]).collect();
        assert_eq!(subjects, vec![ids[0]]);

        assert!(store.remove_layout_subject(ids[1], ids[0]));
        assert!(!store.remove_layout_subject(ids[1], ids[0]));
        assert_eq!(store.layout_observers(ids[0]).count(), 1);
    }

    #[test]
    fn layout_relation_rejects_cycles() {
        let (mut store, ids) = store_with(3);
        assert_eq!(store.add_layout_subject(ids[1], ids[0]), Ok(true));
        assert_eq!(store.add_layout_subject(ids[2], ids[1]), Ok(true));
        assert_eq!(store.add_layout_subject(ids[0], ids[2]), Err(()));
        assert_eq!(store.layout_subjects(ids[0]).count(), 0);
    }

    #[test]
    fn destroy_drops_layout_relations() {
        let (mut store, ids) = store_with(2);
        assert_eq!(store.add_layout_subject(ids[1], ids[0]), Ok(true));
        let _ = store.destroy(ids[0]);
        assert_eq!(store.layout_subjects(ids[1]).count(), 0);

        // The recycled slot starts without relations.
        let fresh = store.create(TestFigure::new("fresh"));
        assert_eq!(fresh.idx, ids[0].idx);
        assert_eq!(store.layout_observers(fresh).count(), 0);
    }

    #[test]
    #[should_panic(expected = "cannot destroy figure with children")]
    fn destroy_with_children_panics() {
        let (mut store, ids) = store_with(2);
        store.link(ids[0], ids[1], 0);
        let _ = store.destroy(ids[0]);
    }

    #[test]
    #[should_panic(expected = "child already has a parent")]
    fn double_link_panics() {
        let (mut store, ids) = store_with(3);
        store.link(ids[0], ids[2], 0);
        store.link(ids[1], ids[2], 0);
    }

    #[test]
    #[should_panic(expected = "cannot attach a figure below itself")]
    fn link_below_descendant_panics() {
        let (mut store, ids) = store_with(2);
        store.link(ids[0], ids[1], 0);
        store.link(ids[1], ids[0], 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn link_past_end_panics() {
        let (mut store, ids) = store_with(2);
        store.link(ids[0], ids[1], 1);
    }

    #[test]
    #[should_panic(expected = "stale FigureId")]
    fn destroyed_handle_panics_on_parent() {
        let (mut store, ids) = store_with(1);
        let _ = store.destroy(ids[0]);
        let _ = store.parent(ids[0]);
    }

    #[test]
    #[should_panic(expected = "stale FigureId")]
    fn destroyed_handle_panics_on_figure() {
        let (mut store, ids) = store_with(1);
        let _ = store.destroy(ids[0]);
        let _ = store.figure(ids[0]);
    }
}
