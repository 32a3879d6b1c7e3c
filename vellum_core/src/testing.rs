// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A figure that records every hook call, shared by the unit tests.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::dirty::DirtyMask;
use crate::figure::{Figure, FigureId, PropertyKey};

/// Shared hook log: `(figure name, hook name)` in call order.
pub(crate) type HookLog = Rc<RefCell<Vec<(&'static str, &'static str)>>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Key {
    /// Feeds style only.
    Fill,
    /// Feeds layout.
    Width,
    /// Feeds nothing derived.
    Label,
}

impl PropertyKey for Key {
    fn dirty_mask(&self) -> DirtyMask {
        match self {
            Self::Fill => DirtyMask::STYLE,
            Self::Width => DirtyMask::LAYOUT,
            Self::Label => DirtyMask::EMPTY,
        }
    }
}

#[derive(Debug)]
pub(crate) struct TestFigure {
    pub(crate) name: &'static str,
    pub(crate) log: HookLog,
    pub(crate) props: BTreeMap<Key, i32>,
    pub(crate) child_layout: bool,
    /// Starts laying out its children once something observes it.
    pub(crate) child_layout_when_observed: bool,
    pub(crate) boundary: bool,
}

impl TestFigure {
    pub(crate) fn new(name: &'static str) -> Self {
        Self::logged(name, &HookLog::default())
    }

    pub(crate) fn logged(name: &'static str, log: &HookLog) -> Self {
        Self {
            name,
            log: log.clone(),
            props: BTreeMap::new(),
            child_layout: false,
            child_layout_when_observed: false,
            boundary: false,
        }
    }

    pub(crate) fn with_child_layout(mut self) -> Self {
        self.child_layout = true;
        self
    }

    pub(crate) fn with_child_layout_when_observed(mut self) -> Self {
        self.child_layout_when_observed = true;
        self
    }

    pub(crate) fn as_boundary(mut self) -> Self {
        self.boundary = true;
        self
    }

    fn record(&self, hook: &'static str) {
        self.log.borrow_mut().push((self.name, hook));
    }
}

/// Counts `(figure, hook)` entries in `log`.
pub(crate) fn count(log: &HookLog, name: &str, hook: &str) -> usize {
    log.borrow()
        .iter()
        .filter(|(n, h)| *n == name && *h == hook)
        .count()
}

/// Returns figure names in the order `hook` ran for them.
pub(crate) fn order_of(log: &HookLog, hook: &str) -> Vec<&'static str> {
    log.borrow()
        .iter()
        .filter(|(_, h)| *h == hook)
        .map(|(n, _)| *n)
        .collect()
}

impl Figure for TestFigure {
    type Key = Key;
    type Value = i32;
    type Context = u32;

    fn get(&self, key: &Key) -> Option<&i32> {
        self.props.get(key)
    }

    fn set(&mut self, key: Key, value: i32) -> Option<i32> {
        self.props.insert(key, value)
    }

    fn remove(&mut self, key: &Key) -> Option<i32> {
        self.props.remove(key)
    }

    fn performs_child_layout(&self) -> bool {
        self.child_layout
    }

    fn is_traversal_boundary(&self) -> bool {
        self.boundary
    }

    fn on_layout_subjects_changed(&mut self) {
        self.record("subjects");
    }

    fn on_layout_observers_changed(&mut self) {
        self.child_layout |= self.child_layout_when_observed;
        self.record("observers");
    }

    fn on_style_recompute(&mut self, ctx: &mut u32) {
        *ctx += 1;
        self.record("style");
    }

    fn on_layout_recompute(&mut self, _ctx: &mut u32) {
        self.record("layout");
    }

    fn on_transform_recompute(&mut self, _ctx: &mut u32) {
        self.record("transform");
    }

    fn on_property_changed(&mut self, _key: &Key, _old: Option<&i32>, _new: Option<&i32>) {
        self.record("property");
    }

    fn on_added_to_tree(&mut self, _root: FigureId) {
        self.record("added");
    }

    fn on_removed_from_tree(&mut self, _root: FigureId) {
        self.record("removed");
    }
}
