// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change notifications.
//!
//! A [`DrawingModel`](crate::model::DrawingModel) publishes three streams:
//!
//! - [`FigureEvent`]: a property value or a derived aspect (layout,
//!   transform, style) of one figure changed.
//! - [`TreeEvent`]: the structure of the tree changed, or a figure was
//!   recomputed by a validation pass.
//! - [`InvalidationEvent`]: the model went from valid to invalid. Fired once
//!   per transition, not once per dirty mark.
//!
//! Listeners are closures registered on an [`EventChannel`]. They run
//! synchronously, in registration order, after the model has updated its own
//! bookkeeping for the event.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::figure::FigureId;

/// What a [`FigureEvent`] reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FigureEventKind {
    /// A property value was set or removed.
    PropertyValueChanged,
    /// The figure's layout is stale.
    LayoutChanged,
    /// The figure's transform is stale.
    TransformChanged,
    /// The figure's style is stale.
    StyleChanged,
}

/// A change to one figure.
#[derive(Clone, Debug, PartialEq)]
pub struct FigureEvent<K, V> {
    /// What changed.
    pub kind: FigureEventKind,
    /// The figure that changed.
    pub figure: FigureId,
    /// The property key, for [`FigureEventKind::PropertyValueChanged`].
    pub key: Option<K>,
    /// The value before the change.
    pub old_value: Option<V>,
    /// The value after the change.
    pub new_value: Option<V>,
    /// Whether the key had no value before the change.
    pub was_added: bool,
    /// Whether the key has no value after the change.
    pub was_removed: bool,
}

impl<K, V> FigureEvent<K, V> {
    /// A property value change. `old` or `new` is `None` when the key had or
    /// has no value.
    #[must_use]
    pub fn property(figure: FigureId, key: K, old: Option<V>, new: Option<V>) -> Self {
        Self {
            kind: FigureEventKind::PropertyValueChanged,
            figure,
            was_added: old.is_none(),
            was_removed: new.is_none(),
            key: Some(key),
            old_value: old,
            new_value: new,
        }
    }

    /// A derived-state notice without a property.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is [`FigureEventKind::PropertyValueChanged`].
    #[must_use]
    pub fn notice(kind: FigureEventKind, figure: FigureId) -> Self {
        assert!(
            kind != FigureEventKind::PropertyValueChanged,
            "property changes need a key"
        );
        Self {
            kind,
            figure,
            key: None,
            old_value: None,
            new_value: None,
            was_added: false,
            was_removed: false,
        }
    }
}

/// What a [`TreeEvent`] reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TreeEventKind {
    /// `node` was inserted into `parent` at `index`.
    NodeAddedToParent,
    /// `node` was taken out of `parent`, where it was at `index`.
    NodeRemovedFromParent,
    /// `node` became part of the drawing rooted at `root`.
    NodeAddedToTree,
    /// `node` left the drawing rooted at `root`.
    NodeRemovedFromTree,
    /// Something about `node` changed that affects its transform.
    NodeChanged,
    /// A validation pass recomputed `node`.
    NodeInvalidated,
    /// The drawing root changed to `root` (`None` when cleared).
    RootChanged,
    /// Figures below `node` changed in a way the tree does not track.
    SubtreeNodesChanged,
}

/// A change to the structure of the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeEvent {
    /// What happened.
    pub kind: TreeEventKind,
    /// The figure the event is about, if any.
    pub node: Option<FigureId>,
    /// The parent involved, for parent events.
    pub parent: Option<FigureId>,
    /// The drawing root at the time of the event.
    pub root: Option<FigureId>,
    /// The child index, for parent events.
    pub index: Option<usize>,
}

impl TreeEvent {
    fn about(kind: TreeEventKind, node: FigureId) -> Self {
        Self {
            kind,
            node: Some(node),
            parent: None,
            root: None,
            index: None,
        }
    }

    /// `node` was inserted into `parent` at `index`.
    #[must_use]
    pub fn added_to_parent(node: FigureId, parent: FigureId, index: usize) -> Self {
        Self {
            parent: Some(parent),
            index: Some(index),
            ..Self::about(TreeEventKind::NodeAddedToParent, node)
        }
    }

    /// `node` was taken out of `parent` at `index`.
    #[must_use]
    pub fn removed_from_parent(node: FigureId, parent: FigureId, index: usize) -> Self {
        Self {
            parent: Some(parent),
            index: Some(index),
            ..Self::about(TreeEventKind::NodeRemovedFromParent, node)
        }
    }

    /// `node` joined the drawing rooted at `root`.
    #[must_use]
    pub fn added_to_tree(node: FigureId, root: FigureId) -> Self {
        Self {
            root: Some(root),
            ..Self::about(TreeEventKind::NodeAddedToTree, node)
        }
    }

    /// `node` left the drawing rooted at `root`.
    #[must_use]
    pub fn removed_from_tree(node: FigureId, root: FigureId) -> Self {
        Self {
            root: Some(root),
            ..Self::about(TreeEventKind::NodeRemovedFromTree, node)
        }
    }

    /// A transform-affecting change to `node`.
    #[must_use]
    pub fn node_changed(node: FigureId) -> Self {
        Self::about(TreeEventKind::NodeChanged, node)
    }

    /// `node` was recomputed by a validation pass.
    #[must_use]
    pub fn node_invalidated(node: FigureId) -> Self {
        Self::about(TreeEventKind::NodeInvalidated, node)
    }

    /// Figures below `node` changed.
    #[must_use]
    pub fn subtree_nodes_changed(node: FigureId) -> Self {
        Self::about(TreeEventKind::SubtreeNodesChanged, node)
    }

    /// The drawing root is now `root`.
    #[must_use]
    pub fn root_changed(root: Option<FigureId>) -> Self {
        Self {
            kind: TreeEventKind::RootChanged,
            node: root,
            parent: None,
            root,
            index: None,
        }
    }
}

/// The model went from valid to invalid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidationEvent {
    /// The figure whose dirty mark caused the transition.
    pub figure: FigureId,
}

/// Identifies a listener registered on an [`EventChannel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// A boxed listener for events of type `E`.
pub type Listener<E> = Box<dyn FnMut(&E)>;

/// Synchronous fan-out of events to registered listeners.
pub struct EventChannel<E> {
    listeners: Vec<(ListenerId, Listener<E>)>,
    next_id: u64,
}

impl<E> fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl<E> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventChannel<E> {
    /// Creates a channel without listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// Registers `listener`, returning a handle for [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe(&mut self, listener: impl FnMut(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let Some(pos) = self.listeners.iter().position(|(l, _)| *l == id) else {
            return false;
        };
        self.listeners.remove(pos);
        true
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Calls every listener with `event`, in registration order.
    pub fn fire(&mut self, event: &E) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}
