// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Figure tree data model.
//!
//! A *figure* is a node in a drawing. The engine knows figures only through
//! the [`Figure`] trait: a handful of capability predicates, property access,
//! and recomputation hooks. Everything a figure computes (bounds, computed
//! style, rendered nodes) stays inside the figure.
//!
//! Each figure in a [`FigureStore`] has:
//!
//! - An identity ([`FigureId`]), a generational handle that becomes stale when
//!   the figure is destroyed.
//! - Topology: parent, first-child, and sibling links forming an ordered tree.
//! - Layout relations: a directed "observer depends on subject" relation that
//!   crosses the tree. A connector that follows two shapes observes both.
//!
//! Figures are stored in struct-of-arrays layout with index-based handles.
//! Mutation goes through [`DrawingModel`](crate::model::DrawingModel), which
//! turns every change into an event and a dirty mark.

mod id;
mod store;
mod traverse;

use core::fmt;

pub use id::{FigureId, INVALID};
pub use store::FigureStore;
pub use traverse::{Ancestors, Children, Preorder};

use crate::dirty::DirtyMask;

/// A property key that knows which derived state its values feed.
pub trait PropertyKey: Clone + Eq + fmt::Debug {
    /// Bits to mark when a value for this key changes.
    ///
    /// An empty mask makes the change observable to listeners without
    /// scheduling any recomputation.
    fn dirty_mask(&self) -> DirtyMask;
}

/// The capabilities the validation engine consumes from a figure.
///
/// All hooks default to no-ops. Hooks receive only the figure itself: the
/// tree is read-only for the duration of a pass.
pub trait Figure {
    /// Property key type.
    type Key: PropertyKey;
    /// Property value type.
    type Value: Clone + PartialEq + fmt::Debug;
    /// Context handed to the recompute hooks by `validate`.
    type Context: ?Sized;

    /// Returns the value stored for `key`.
    fn get(&self, key: &Self::Key) -> Option<&Self::Value>;

    /// Stores `value` for `key`, returning the previous value.
    fn set(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value>;

    /// Removes the value for `key`, returning it.
    fn remove(&mut self, key: &Self::Key) -> Option<Self::Value>;

    /// Whether this figure lays out its children.
    ///
    /// Layout changes of a child propagate to such a parent, and the child is
    /// recomputed first.
    fn performs_child_layout(&self) -> bool {
        false
    }

    /// Whether subtree expansion stops at this figure (e.g. a layer).
    fn is_traversal_boundary(&self) -> bool {
        false
    }

    /// Called when the set of figures this one observes changed.
    ///
    /// Relation hooks run at the start of a pass, before the dependency
    /// graph is built, so they may change what
    /// [`performs_child_layout`](Self::performs_child_layout) and
    /// [`is_traversal_boundary`](Self::is_traversal_boundary) report.
    fn on_layout_subjects_changed(&mut self) {}

    /// Called when the set of figures observing this one changed.
    fn on_layout_observers_changed(&mut self) {}

    /// Recomputes style.
    fn on_style_recompute(&mut self, ctx: &mut Self::Context) {
        _ = ctx;
    }

    /// Recomputes layout. Runs after style.
    fn on_layout_recompute(&mut self, ctx: &mut Self::Context) {
        _ = ctx;
    }

    /// Recomputes transforms. Runs after layout.
    fn on_transform_recompute(&mut self, ctx: &mut Self::Context) {
        _ = ctx;
    }

    /// Called after a property value changed through the model.
    fn on_property_changed(
        &mut self,
        key: &Self::Key,
        old: Option<&Self::Value>,
        new: Option<&Self::Value>,
    ) {
        _ = (key, old, new);
    }

    /// Called when the figure becomes part of the drawing rooted at `root`.
    fn on_added_to_tree(&mut self, root: FigureId) {
        _ = root;
    }

    /// Called when the figure leaves the drawing rooted at `root`.
    fn on_removed_from_tree(&mut self, root: FigureId) {
        _ = root;
    }
}
