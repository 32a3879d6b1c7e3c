// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental validation engine for vector-drawing figure trees.
//!
//! `vellum_core` keeps the derived state of a drawing (style, layout,
//! transform, rendered node) consistent after arbitrary, batched mutations to
//! its figure tree. It is `no_std` compatible (with `alloc`) and stores
//! figures in a struct-of-arrays arena addressed by generational handles.
//!
//! # Architecture
//!
//! Mutations never recompute anything directly. They fire events, the
//! model's own handlers turn those events into dirty marks, and an external
//! driver (typically once per display refresh) calls `validate`:
//!
//! ```text
//!   DrawingModel::set / insert_child_at / fire_*_invalidated
//!       │
//!       ▼
//!   FigureEvent / TreeEvent ──► handler ──► DirtySet (OR-merged masks)
//!       │                                      │
//!       ▼                                      ▼
//!   external listeners               InvalidationEvent (once per Valid → Invalid)
//!
//!   DrawingModel::validate()
//!       │
//!       ▼
//!   relation hooks ──► graph::build ──► topo::sort
//!                                          │
//!                                          ▼
//!                      Figure hooks (style → layout → transform)
//!                                          │
//!                                          ▼
//!                              TreeEvent::node_invalidated per figure
//! ```
//!
//! **[`figure`]**: The [`Figure`](figure::Figure) capability trait, the
//! [`FigureStore`](figure::FigureStore) arena, tree traversal, and the
//! layout observer relation.
//!
//! **[`dirty`]**: [`DirtyMask`](dirty::DirtyMask) bits and the
//! [`DirtySet`](dirty::DirtySet) that accumulates them between passes.
//!
//! **[`graph`]**: Expands the dirty set into the dependency graph of figures
//! that must be recomputed.
//!
//! **[`topo`]**: Kahn linearization of that graph.
//!
//! **[`model`]**: [`DrawingModel`](model::DrawingModel): the mutation API,
//! event handlers, and the validation state machine.
//!
//! **[`event`]**: Event records and the listener fan-out channel.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! validation-pass instrumentation, with zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-figure
//!   recompute events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod dirty;
pub mod error;
pub mod event;
pub mod figure;
pub mod graph;
pub mod model;
pub mod topo;
pub mod trace;

#[cfg(test)]
pub(crate) mod testing;
