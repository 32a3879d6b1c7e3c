// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawing model: a figure tree plus the bookkeeping that keeps its
//! derived state consistent.
//!
//! Every mutation goes through [`DrawingModel`]. Each one produces an event;
//! the model handles the event first (merging a [`DirtyMask`] into the dirty
//! set, calling figure hooks) and then fans it out to external listeners.
//! Many mutations between two calls to
//! [`validate`](DrawingModel::validate) coalesce into one pass because dirty
//! marks merge rather than queue.
//!
//! Only figures that belong to the drawing (the subtree under
//! [`root`](DrawingModel::root)) are tracked. Detached figures can be
//! edited freely; they are picked up when attached.
//!
//! ```text
//!   mutation ──► event ──► model handler ──► dirty set ──► validate()
//!                  │                          │
//!                  └──► listeners             └──► invalidation notice
//!                                                  (Valid → Invalid only)
//! ```

mod validate;

use alloc::vec::Vec;

use understory_dirty::CycleHandling;

use crate::dirty::{DirtyMask, DirtySet};
use crate::error::ModelError;
use crate::event::{
    EventChannel, FigureEvent, FigureEventKind, InvalidationEvent, ListenerId, TreeEvent,
    TreeEventKind,
};
use crate::figure::{Figure, FigureId, FigureStore, PropertyKey};

pub use validate::ValidationChanges;

/// Where a [`DrawingModel`] stands with respect to its derived state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValidationState {
    /// All derived state is current.
    Valid,
    /// Some figures are dirty; no pass is running.
    Invalid,
    /// A validation pass is running. Model event handlers are suspended.
    Validating,
}

/// What a validation pass does when the dependency graph has a cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PassCyclePolicy {
    /// Fail with [`ModelError::LayoutCycle`] before running any hook. The
    /// dirty set is left intact.
    #[default]
    Reject,
    /// Recompute the figures on the cycle after all others, in discovery
    /// order, each once.
    AppendRemaining,
}

/// Configuration of a [`DrawingModel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelConfig {
    /// How registering a cyclic layout relation is handled.
    pub observer_cycles: CycleHandling,
    /// How a cycle found during validation is handled.
    pub pass_cycles: PassCyclePolicy,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            observer_cycles: CycleHandling::Error,
            pass_cycles: PassCyclePolicy::Reject,
        }
    }
}

/// A figure tree with change events and incremental validation.
#[derive(Debug)]
pub struct DrawingModel<F: Figure> {
    store: FigureStore<F>,
    dirty: DirtySet,
    state: ValidationState,
    root: Option<FigureId>,
    config: ModelConfig,
    pass_count: u64,
    figure_events: EventChannel<FigureEvent<F::Key, F::Value>>,
    tree_events: EventChannel<TreeEvent>,
    invalidation_events: EventChannel<InvalidationEvent>,
}

impl<F: Figure> Default for DrawingModel<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Figure> DrawingModel<F> {
    /// Creates an empty, valid model with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ModelConfig::default())
    }

    /// Creates an empty, valid model.
    #[must_use]
    pub fn with_config(config: ModelConfig) -> Self {
        Self {
            store: FigureStore::with_cycle_handling(config.observer_cycles),
            dirty: DirtySet::new(),
            state: ValidationState::Valid,
            root: None,
            config,
            pass_count: 0,
            figure_events: EventChannel::new(),
            tree_events: EventChannel::new(),
            invalidation_events: EventChannel::new(),
        }
    }

    // -- Queries --

    /// Returns the figure store.
    #[must_use]
    pub fn store(&self) -> &FigureStore<F> {
        &self.store
    }

    /// Returns the figure behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    #[must_use]
    pub fn figure(&self, id: FigureId) -> &F {
        self.store.figure(id)
    }

    /// Returns the configuration the model was created with.
    #[must_use]
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Returns the validation state.
    #[must_use]
    pub fn state(&self) -> ValidationState {
        self.state
    }

    /// Returns whether all derived state is current.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.state == ValidationState::Valid
    }

    /// Returns the accumulated dirty bits of `id`.
    #[must_use]
    pub fn dirty_mask(&self, id: FigureId) -> DirtyMask {
        self.store.check(id);
        self.dirty.get(id.idx)
    }

    /// Returns the number of dirty figures.
    #[must_use]
    pub fn dirty_len(&self) -> usize {
        self.dirty.len()
    }

    /// Returns the number of completed validation passes.
    #[must_use]
    pub fn pass_count(&self) -> u64 {
        self.pass_count
    }

    /// Returns the drawing root.
    #[must_use]
    pub fn root(&self) -> Option<FigureId> {
        self.root
    }

    /// Returns whether `id` is the root or one of its descendants.
    #[must_use]
    pub fn is_in_drawing(&self, id: FigureId) -> bool {
        self.drawing_root_of(id).is_some()
    }

    // -- Subscriptions --

    /// Registers a listener for figure events.
    pub fn subscribe_figure_events(
        &mut self,
        listener: impl FnMut(&FigureEvent<F::Key, F::Value>) + 'static,
    ) -> ListenerId {
        self.figure_events.subscribe(listener)
    }

    /// Removes a figure event listener. Returns `false` if it was not
    /// registered.
    pub fn unsubscribe_figure_events(&mut self, id: ListenerId) -> bool {
        self.figure_events.unsubscribe(id)
    }

    /// Registers a listener for tree events.
    pub fn subscribe_tree_events(&mut self, listener: impl FnMut(&TreeEvent) + 'static) -> ListenerId {
        self.tree_events.subscribe(listener)
    }

    /// Removes a tree event listener. Returns `false` if it was not
    /// registered.
    pub fn unsubscribe_tree_events(&mut self, id: ListenerId) -> bool {
        self.tree_events.unsubscribe(id)
    }

    /// Registers a listener for the valid → invalid transition.
    pub fn subscribe_invalidated(
        &mut self,
        listener: impl FnMut(&InvalidationEvent) + 'static,
    ) -> ListenerId {
        self.invalidation_events.subscribe(listener)
    }

    /// Removes an invalidation listener. Returns `false` if it was not
    /// registered.
    pub fn unsubscribe_invalidated(&mut self, id: ListenerId) -> bool {
        self.invalidation_events.unsubscribe(id)
    }

    // -- Figure lifecycle --

    /// Adds a detached figure to the model.
    pub fn create_figure(&mut self, figure: F) -> FigureId {
        self.store.create(figure)
    }

    /// Removes a childless figure from the model and returns it.
    ///
    /// The figure is first detached from its parent. Its layout relations are
    /// dropped, and the figures on the other side of them are marked dirty.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale, is the drawing root, or has children.
    pub fn destroy_figure(&mut self, id: FigureId) -> F {
        self.store.check(id);
        assert!(self.root != Some(id), "cannot destroy the drawing root");
        assert!(
            self.store.children(id).next().is_none(),
            "cannot destroy figure with children"
        );
        self.detach(id);

        let observers: Vec<_> = self.store.layout_observers(id).collect();
        let subjects: Vec<_> = self.store.layout_subjects(id).collect();
        for observer in observers {
            self.mark_dirty(observer, DirtyMask::LAYOUT_SUBJECT);
        }
        for subject in subjects {
            self.mark_dirty(subject, DirtyMask::LAYOUT_OBSERVERS);
        }

        self.dirty.remove(id.idx);
        self.store.destroy(id)
    }

    // -- Tree mutation --

    /// Makes `root` the root of the drawing.
    ///
    /// Fires [`NodeRemovedFromTree`](TreeEventKind::NodeRemovedFromTree) for
    /// the old drawing, [`RootChanged`](TreeEventKind::RootChanged), then
    /// [`NodeAddedToTree`](TreeEventKind::NodeAddedToTree) for the new one,
    /// each in pre-order. The model is valid afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NullRoot`] if `root` is `None` while the drawing
    /// has a root.
    ///
    /// # Panics
    ///
    /// Panics if `root` is stale or has a parent.
    pub fn set_root(&mut self, root: Option<FigureId>) -> Result<(), ModelError> {
        if self.root.is_some() && root.is_none() {
            return Err(ModelError::NullRoot);
        }
        if self.root == root {
            return Ok(());
        }
        if let Some(new) = root {
            assert!(
                self.store.parent(new).is_none(),
                "the drawing root must not have a parent"
            );
        }

        if let Some(old) = self.root {
            let nodes: Vec<_> = self.store.preorder(old).collect();
            for node in nodes {
                self.fire_tree(TreeEvent::removed_from_tree(node, old));
            }
        }
        self.root = root;
        self.fire_tree(TreeEvent::root_changed(root));
        if let Some(new) = root {
            let nodes: Vec<_> = self.store.preorder(new).collect();
            for node in nodes {
                self.fire_tree(TreeEvent::added_to_tree(node, new));
            }
        }
        Ok(())
    }

    /// Inserts `child` into `parent` at `index`, detaching it from its
    /// current parent first.
    ///
    /// `index` counts positions after the detach, so moving a figure within
    /// the same parent addresses the list without it.
    ///
    /// # Panics
    ///
    /// Panics if a handle is stale, if `child` is the drawing root, if
    /// `parent` is `child` or one of its descendants, or if `index` exceeds
    /// the child count.
    pub fn insert_child_at(&mut self, parent: FigureId, child: FigureId, index: usize) {
        self.check_attach(parent, child);
        self.detach(child);
        self.attach(parent, child, index);
    }

    /// Appends `child` to the children of `parent`, detaching it from its
    /// current parent first.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as
    /// [`insert_child_at`](Self::insert_child_at).
    pub fn add_child(&mut self, parent: FigureId, child: FigureId) {
        self.check_attach(parent, child);
        self.detach(child);
        let index = self.store.child_count(parent);
        self.attach(parent, child, index);
    }

    /// Detaches `child` from its parent. Returns the former parent, or `None`
    /// if it had none.
    pub fn remove_from_parent(&mut self, child: FigureId) -> Option<FigureId> {
        self.detach(child).map(|(parent, _)| parent)
    }

    // -- Properties --

    /// Sets a property and returns the previous value.
    ///
    /// Fires [`PropertyValueChanged`](FigureEventKind::PropertyValueChanged)
    /// unless the new value equals the current one.
    pub fn set(&mut self, id: FigureId, key: F::Key, value: F::Value) -> Option<F::Value> {
        let figure = self.store.figure_mut(id);
        if figure.get(&key) == Some(&value) {
            return Some(value);
        }
        let old = figure.set(key.clone(), value.clone());
        self.fire_figure(FigureEvent::property(id, key, old.clone(), Some(value)));
        old
    }

    /// Removes a property and returns it.
    ///
    /// Fires [`PropertyValueChanged`](FigureEventKind::PropertyValueChanged)
    /// if a value was present.
    pub fn remove(&mut self, id: FigureId, key: F::Key) -> Option<F::Value> {
        let old = self.store.figure_mut(id).remove(&key)?;
        self.fire_figure(FigureEvent::property(id, key, Some(old.clone()), None));
        Some(old)
    }

    // -- Layout relations --

    /// Records that the layout of `observer` depends on `subject`.
    ///
    /// Returns `Ok(false)` if the relation already existed or the configured
    /// [`CycleHandling`] dropped it.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ObserverCycle`] if the relation would close a
    /// cycle and cycles are configured as errors.
    pub fn add_layout_subject(
        &mut self,
        observer: FigureId,
        subject: FigureId,
    ) -> Result<bool, ModelError> {
        let added = self
            .store
            .add_layout_subject(observer, subject)
            .map_err(|()| ModelError::ObserverCycle { observer, subject })?;
        if added {
            self.mark_relation_changed(observer, subject);
        }
        Ok(added)
    }

    /// Drops the relation recorded by
    /// [`add_layout_subject`](Self::add_layout_subject). Returns `false` if
    /// it did not exist.
    pub fn remove_layout_subject(&mut self, observer: FigureId, subject: FigureId) -> bool {
        let removed = self.store.remove_layout_subject(observer, subject);
        if removed {
            self.mark_relation_changed(observer, subject);
        }
        removed
    }

    // -- Explicit notifications --

    /// Reports that the layout of `id` is stale.
    pub fn fire_layout_invalidated(&mut self, id: FigureId) {
        self.fire_notice(FigureEventKind::LayoutChanged, id);
    }

    /// Reports that the style of `id` is stale.
    pub fn fire_style_invalidated(&mut self, id: FigureId) {
        self.fire_notice(FigureEventKind::StyleChanged, id);
    }

    /// Reports that the transform of `id` is stale.
    pub fn fire_transform_invalidated(&mut self, id: FigureId) {
        self.fire_notice(FigureEventKind::TransformChanged, id);
    }

    /// Reports a change to `id` that affects its transform and rendering.
    pub fn fire_node_changed(&mut self, id: FigureId) {
        self.store.check(id);
        self.fire_tree(TreeEvent::node_changed(id));
    }

    /// Reports that figures below `id` changed. Listeners only.
    pub fn fire_subtree_nodes_changed(&mut self, id: FigureId) {
        self.store.check(id);
        self.fire_tree(TreeEvent::subtree_nodes_changed(id));
    }

    // -- Internals --

    fn fire_notice(&mut self, kind: FigureEventKind, id: FigureId) {
        self.store.check(id);
        self.fire_figure(FigureEvent::notice(kind, id));
    }

    fn fire_figure(&mut self, event: FigureEvent<F::Key, F::Value>) {
        self.handle_figure_event(&event);
        self.figure_events.fire(&event);
    }

    fn fire_tree(&mut self, event: TreeEvent) {
        self.handle_tree_event(&event);
        self.tree_events.fire(&event);
    }

    fn handle_figure_event(&mut self, event: &FigureEvent<F::Key, F::Value>) {
        if self.state == ValidationState::Validating {
            return;
        }
        let mask = match event.kind {
            FigureEventKind::PropertyValueChanged => {
                let Some(key) = &event.key else {
                    unreachable!("property events carry a key");
                };
                self.store.figure_mut(event.figure).on_property_changed(
                    key,
                    event.old_value.as_ref(),
                    event.new_value.as_ref(),
                );
                key.dirty_mask()
            }
            FigureEventKind::LayoutChanged => DirtyMask::LAYOUT,
            FigureEventKind::TransformChanged => DirtyMask::TRANSFORM,
            FigureEventKind::StyleChanged => DirtyMask::STYLE,
        };
        self.mark_dirty(event.figure, mask);
    }

    fn handle_tree_event(&mut self, event: &TreeEvent) {
        if self.state == ValidationState::Validating {
            return;
        }
        match (event.kind, event.node) {
            (TreeEventKind::NodeAddedToParent, Some(child)) => {
                self.mark_dirty(child, DirtyMask::LAYOUT.add(DirtyMask::STYLE));
            }
            (TreeEventKind::NodeRemovedFromParent, Some(_)) => {
                if let Some(parent) = event.parent {
                    self.mark_dirty(parent, DirtyMask::LAYOUT.add(DirtyMask::NODE));
                }
            }
            (TreeEventKind::NodeChanged, Some(node)) => {
                self.mark_dirty(node, DirtyMask::TRANSFORM.add(DirtyMask::NODE));
            }
            (TreeEventKind::NodeAddedToTree, Some(node)) => {
                if let Some(root) = event.root {
                    self.store.figure_mut(node).on_added_to_tree(root);
                }
            }
            (TreeEventKind::NodeRemovedFromTree, Some(node)) => {
                if let Some(root) = event.root {
                    self.store.figure_mut(node).on_removed_from_tree(root);
                }
                self.dirty.remove(node.idx);
            }
            (TreeEventKind::RootChanged, _) => {
                self.dirty.clear();
                self.state = ValidationState::Valid;
            }
            (TreeEventKind::SubtreeNodesChanged | TreeEventKind::NodeInvalidated, _) => {}
            (_, None) => unreachable!("{:?} events name a node", event.kind),
        }
    }

    /// Merges `mask` into the dirty bits of `id`.
    ///
    /// Figures outside the drawing are not tracked. The first mark after the
    /// model was valid fires the invalidation notice.
    fn mark_dirty(&mut self, id: FigureId, mask: DirtyMask) {
        if mask.is_empty() || !self.is_in_drawing(id) {
            return;
        }
        self.dirty.mark(id.idx, mask);
        if self.state == ValidationState::Valid {
            self.state = ValidationState::Invalid;
            self.invalidation_events
                .fire(&InvalidationEvent { figure: id });
        }
    }

    fn mark_relation_changed(&mut self, observer: FigureId, subject: FigureId) {
        self.mark_dirty(observer, DirtyMask::LAYOUT_SUBJECT);
        self.mark_dirty(subject, DirtyMask::LAYOUT_OBSERVERS);
    }

    /// Returns the drawing root if `id` belongs to the drawing.
    fn drawing_root_of(&self, id: FigureId) -> Option<FigureId> {
        let root = self.root?;
        (self.store.top(id) == root).then_some(root)
    }

    fn check_attach(&self, parent: FigureId, child: FigureId) {
        self.store.check(parent);
        self.store.check(child);
        assert!(
            self.root != Some(child),
            "the drawing root cannot become a child"
        );
        assert!(
            !self.store.ancestors(parent).any(|a| a == child),
            "cannot attach a figure below itself"
        );
    }

    /// Links a detached `child` and fires the attach events.
    fn attach(&mut self, parent: FigureId, child: FigureId, index: usize) {
        self.store.link(parent, child, index);
        self.fire_tree(TreeEvent::added_to_parent(child, parent, index));
        if let Some(root) = self.drawing_root_of(child) {
            let nodes: Vec<_> = self.store.preorder(child).collect();
            for node in nodes {
                self.fire_tree(TreeEvent::added_to_tree(node, root));
            }
        }
    }

    /// Unlinks `child` if it has a parent, firing the detach events.
    fn detach(&mut self, child: FigureId) -> Option<(FigureId, usize)> {
        self.store.parent(child)?;
        if let Some(root) = self.drawing_root_of(child) {
            let nodes: Vec<_> = self.store.preorder(child).collect();
            for node in nodes {
                self.fire_tree(TreeEvent::removed_from_tree(node, root));
            }
        }
        let (parent, index) = self.store.unlink(child);
        self.fire_tree(TreeEvent::removed_from_parent(child, parent, index));
        Some((parent, index))
    }
}
