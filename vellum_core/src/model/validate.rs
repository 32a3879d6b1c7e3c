// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The validation pass.

use alloc::vec::Vec;

use super::{DrawingModel, PassCyclePolicy, ValidationState};
use crate::dirty::DirtyMask;
use crate::error::ModelError;
use crate::event::TreeEvent;
use crate::figure::{Figure, FigureId};
use crate::trace::{
    self, CycleEvent, GraphBuiltEvent, PassBeginEvent, PassEndEvent, PhaseKind, Tracer,
};
use crate::{graph, topo};

/// What a call to [`validate`](DrawingModel::validate) did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationChanges {
    /// Index of the pass, or `None` if the model was already valid.
    pub pass_index: Option<u64>,
    /// Figures recomputed, in the order their hooks ran.
    pub recomputed: Vec<FigureId>,
    /// Vertices in the dependency graph.
    pub graph_vertices: usize,
    /// Edges in the dependency graph.
    pub graph_edges: usize,
}

impl ValidationChanges {
    /// Returns whether nothing was recomputed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recomputed.is_empty()
    }
}

impl<F: Figure> DrawingModel<F> {
    /// Brings all derived state up to date.
    ///
    /// Does nothing if the model is valid. Otherwise runs one pass:
    ///
    /// 1. Call the layout relation hooks of figures whose relations changed.
    /// 2. Build the dependency graph over the dirty set and sort it. The
    ///    graph sees any predicate changes the relation hooks made.
    /// 3. For every figure in the graph, in dependency order, then every
    ///    remaining dirty figure: recompute style, layout, and transform, and
    ///    fire [`NodeInvalidated`](crate::event::TreeEventKind::NodeInvalidated).
    /// 4. Clear the dirty set.
    ///
    /// Each figure is recomputed once per pass. Model event handlers are
    /// suspended for the duration.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::LayoutCycle`] if the graph has a cycle and the
    /// model is configured with [`PassCyclePolicy::Reject`]. Only the relation
    /// hooks have run; no figure was recomputed and the model stays invalid,
    /// so the next call runs the relation hooks again.
    pub fn validate(&mut self, ctx: &mut F::Context) -> Result<ValidationChanges, ModelError> {
        self.validate_traced(ctx, &mut Tracer::none())
    }

    /// Like [`validate`](Self::validate), reporting pass phases to `tracer`.
    ///
    /// # Errors
    ///
    /// See [`validate`](Self::validate).
    pub fn validate_traced(
        &mut self,
        ctx: &mut F::Context,
        tracer: &mut Tracer<'_>,
    ) -> Result<ValidationChanges, ModelError> {
        if self.state != ValidationState::Invalid {
            return Ok(ValidationChanges::default());
        }
        // Dirt is only recorded under a root, and `RootChanged` clears it.
        let Some(root) = self.root else {
            self.dirty.clear();
            self.state = ValidationState::Valid;
            return Ok(ValidationChanges::default());
        };
        let pass_index = self.pass_count;
        tracer.pass_begin(&PassBeginEvent {
            pass_index,
            dirty_figures: trace::count(self.dirty.len()),
        });

        self.state = ValidationState::Validating;

        let phase = tracer.begin(pass_index, PhaseKind::Notify);
        for (slot, mask) in self.dirty.iter() {
            if !mask.intersects(DirtyMask::RELATION) {
                continue;
            }
            let figure = self.store.figure_at_mut(slot);
            if mask.contains(DirtyMask::LAYOUT_SUBJECT) {
                figure.on_layout_subjects_changed();
            }
            if mask.contains(DirtyMask::LAYOUT_OBSERVERS) {
                figure.on_layout_observers_changed();
            }
        }
        tracer.end(pass_index, phase);

        let phase = tracer.begin(pass_index, PhaseKind::BuildGraph);
        let graph = graph::build(&self.store, &self.dirty, root);
        tracer.end(pass_index, phase);
        tracer.graph_built(&GraphBuiltEvent {
            pass_index,
            vertices: trace::count(graph.vertex_count()),
            edges: trace::count(graph.edge_count()),
        });

        let phase = tracer.begin(pass_index, PhaseKind::Sort);
        let sorted = topo::sort(&graph);
        tracer.end(pass_index, phase);
        let mut order = match sorted {
            Ok(order) => order,
            Err(stalled) => {
                let rejected = self.config.pass_cycles == PassCyclePolicy::Reject;
                tracer.cycle(&CycleEvent {
                    pass_index,
                    remaining: trace::count(stalled.remaining.len()),
                    rejected,
                });
                if rejected {
                    self.state = ValidationState::Invalid;
                    tracer.pass_end(&PassEndEvent {
                        pass_index,
                        recomputed: 0,
                    });
                    let figures = stalled
                        .remaining
                        .iter()
                        .map(|&slot| self.store.id_at(slot))
                        .collect();
                    return Err(ModelError::LayoutCycle { figures });
                }
                stalled.into_appended()
            }
        };
        // Style-only figures are outside the graph.
        order.extend(
            self.dirty
                .iter()
                .map(|(slot, _)| slot)
                .filter(|&slot| !graph.contains(slot)),
        );

        let phase = tracer.begin(pass_index, PhaseKind::Recompute);
        let mut recomputed = Vec::with_capacity(order.len());
        for slot in order {
            let figure = self.store.figure_at_mut(slot);
            figure.on_style_recompute(ctx);
            figure.on_layout_recompute(ctx);
            figure.on_transform_recompute(ctx);
            #[cfg(feature = "trace-rich")]
            tracer.figure_recomputed(&trace::FigureRecomputedEvent {
                pass_index,
                figure: slot,
                mask: self.dirty.get(slot),
            });
            let id = self.store.id_at(slot);
            recomputed.push(id);
            self.fire_tree(TreeEvent::node_invalidated(id));
        }
        tracer.end(pass_index, phase);

        self.dirty.clear();
        self.state = ValidationState::Valid;
        self.pass_count += 1;
        tracer.pass_end(&PassEndEvent {
            pass_index,
            recomputed: trace::count(recomputed.len()),
        });

        Ok(ValidationChanges {
            pass_index: Some(pass_index),
            recomputed,
            graph_vertices: graph.vertex_count(),
            graph_edges: graph.edge_count(),
        })
    }
}
