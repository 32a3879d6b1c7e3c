// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.
//!
//! All iterators are lazy and borrow the store; each call to the
//! corresponding [`FigureStore`] method starts a fresh traversal.

use super::id::{FigureId, INVALID};
use super::store::FigureStore;

/// An iterator over the direct children of a figure.
///
/// Created by [`FigureStore::children`].
#[derive(Debug)]
pub struct Children<'a, F> {
    store: &'a FigureStore<F>,
    current: u32,
}

impl<'a, F> Children<'a, F> {
    pub(crate) fn new(store: &'a FigureStore<F>, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl<F> Iterator for Children<'_, F> {
    type Item = FigureId;

    fn next(&mut self) -> Option<FigureId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.next_sibling[idx as usize];
        Some(self.store.id_at(idx))
    }
}

/// A depth-first pre-order iterator over a subtree, starting at its root.
///
/// Created by [`FigureStore::preorder`].
#[derive(Debug)]
pub struct Preorder<'a, F> {
    store: &'a FigureStore<F>,
    root: u32,
    next: u32,
}

impl<'a, F> Preorder<'a, F> {
    pub(crate) fn new(store: &'a FigureStore<F>, root: u32) -> Self {
        Self {
            store,
            root,
            next: root,
        }
    }

    /// Returns the slot visited after `idx`, or [`INVALID`] at the end.
    fn successor(&self, idx: u32) -> u32 {
        let first = self.store.first_child[idx as usize];
        if first != INVALID {
            return first;
        }
        let mut node = idx;
        while node != self.root {
            let sibling = self.store.next_sibling[node as usize];
            if sibling != INVALID {
                return sibling;
            }
            node = self.store.parent[node as usize];
        }
        INVALID
    }
}

impl<F> Iterator for Preorder<'_, F> {
    type Item = FigureId;

    fn next(&mut self) -> Option<FigureId> {
        if self.next == INVALID {
            return None;
        }
        let idx = self.next;
        self.next = self.successor(idx);
        Some(self.store.id_at(idx))
    }
}

/// An iterator from a figure up to the top of its tree, starting with the
/// figure itself.
///
/// Created by [`FigureStore::ancestors`].
#[derive(Debug)]
pub struct Ancestors<'a, F> {
    store: &'a FigureStore<F>,
    current: u32,
}

impl<'a, F> Ancestors<'a, F> {
    pub(crate) fn new(store: &'a FigureStore<F>, start: u32) -> Self {
        Self {
            store,
            current: start,
        }
    }
}

impl<F> Iterator for Ancestors<'_, F> {
    type Item = FigureId;

    fn next(&mut self) -> Option<FigureId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.parent[idx as usize];
        Some(self.store.id_at(idx))
    }
}
