// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for validation passes.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! the validator calls at each stage of a pass. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Events carry no timestamps; sinks that need timing stamp events on
//! arrival.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`FigureRecomputedEvent`] and the
//!   corresponding `TraceSink` method.

#[cfg(feature = "trace-rich")]
use crate::dirty::DirtyMask;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a validation pass is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Layout relation notifications.
    Notify,
    /// Dependency graph construction.
    BuildGraph,
    /// Topological sort of the graph.
    Sort,
    /// Style, layout, and transform recomputation.
    Recompute,
}

impl PhaseKind {
    /// All phases, in pass order.
    pub const ALL: [Self; 4] = [Self::Notify, Self::BuildGraph, Self::Sort, Self::Recompute];

    /// A short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Notify => "notify",
            Self::BuildGraph => "build_graph",
            Self::Sort => "sort",
            Self::Recompute => "recompute",
        }
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a validation pass starts.
#[derive(Clone, Copy, Debug)]
pub struct PassBeginEvent {
    /// Monotonic pass counter.
    pub pass_index: u64,
    /// Number of entries in the dirty set.
    pub dirty_figures: u32,
}

/// Marks the beginning of a pass phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
}

/// Marks the end of a pass phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
}

/// Emitted once the dependency graph is built.
#[derive(Clone, Copy, Debug)]
pub struct GraphBuiltEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Number of vertices.
    pub vertices: u32,
    /// Number of edges.
    pub edges: u32,
}

/// Emitted when the sort finds a cycle.
#[derive(Clone, Copy, Debug)]
pub struct CycleEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Number of vertices the sort could not place.
    pub remaining: u32,
    /// Whether the pass was abandoned.
    pub rejected: bool,
}

/// Emitted when a validation pass completes.
#[derive(Clone, Copy, Debug)]
pub struct PassEndEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Number of figures recomputed.
    pub recomputed: u32,
}

/// A single figure recomputation.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct FigureRecomputedEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Slot index of the figure.
    pub figure: u32,
    /// The dirty bits the figure carried into the pass.
    pub mask: DirtyMask,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the validator.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a pass starts.
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        _ = e;
    }

    /// Called at the beginning of a pass phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a pass phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called after the dependency graph is built.
    fn on_graph_built(&mut self, e: &GraphBuiltEvent) {
        _ = e;
    }

    /// Called when the sort finds a cycle.
    fn on_cycle(&mut self, e: &CycleEvent) {
        _ = e;
    }

    /// Called when a pass completes.
    fn on_pass_end(&mut self, e: &PassEndEvent) {
        _ = e;
    }

    /// Called per recomputed figure (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_figure_recomputed(&mut self, e: &FigureRecomputedEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

/// Generates a `Tracer` method forwarding one event to the sink.
macro_rules! forward {
    ($(#[$doc:meta])* $name:ident => $hook:ident($ty:ty)) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self, e: &$ty) {
            #[cfg(feature = "trace")]
            if let Some(s) = &mut self.sink {
                s.$hook(e);
            }
            #[cfg(not(feature = "trace"))]
            {
                _ = e;
            }
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    forward!(
        /// Emits a [`PassBeginEvent`].
        pass_begin => on_pass_begin(PassBeginEvent)
    );
    forward!(
        /// Emits a [`PhaseBeginEvent`].
        phase_begin => on_phase_begin(PhaseBeginEvent)
    );
    forward!(
        /// Emits a [`PhaseEndEvent`].
        phase_end => on_phase_end(PhaseEndEvent)
    );
    forward!(
        /// Emits a [`GraphBuiltEvent`].
        graph_built => on_graph_built(GraphBuiltEvent)
    );
    forward!(
        /// Emits a [`CycleEvent`].
        cycle => on_cycle(CycleEvent)
    );
    forward!(
        /// Emits a [`PassEndEvent`].
        pass_end => on_pass_end(PassEndEvent)
    );

    /// Emits a [`FigureRecomputedEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn figure_recomputed(&mut self, e: &FigureRecomputedEvent) {
        if let Some(s) = &mut self.sink {
            s.on_figure_recomputed(e);
        }
    }

    /// Emits a [`PhaseBeginEvent`] and returns the phase for the matching end.
    #[inline]
    pub(crate) fn begin(&mut self, pass_index: u64, phase: PhaseKind) -> PhaseKind {
        self.phase_begin(&PhaseBeginEvent { pass_index, phase });
        phase
    }

    /// Emits the [`PhaseEndEvent`] for a phase opened with `begin`.
    #[inline]
    pub(crate) fn end(&mut self, pass_index: u64, phase: PhaseKind) {
        self.phase_end(&PhaseEndEvent { pass_index, phase });
    }
}

/// Converts a count to the `u32` trace events carry, saturating.
#[inline]
pub(crate) fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_pass_begin(&PassBeginEvent {
            pass_index: 0,
            dirty_figures: 3,
        });
        sink.on_graph_built(&GraphBuiltEvent {
            pass_index: 0,
            vertices: 3,
            edges: 2,
        });
        sink.on_pass_end(&PassEndEvent {
            pass_index: 0,
            recomputed: 3,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        let phase = tracer.begin(0, PhaseKind::Sort);
        tracer.end(0, phase);
        tracer.cycle(&CycleEvent {
            pass_index: 0,
            remaining: 2,
            rejected: true,
        });
    }

    #[test]
    fn phase_names_are_distinct() {
        let names = PhaseKind::ALL.map(PhaseKind::name);
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn count_saturates() {
        assert_eq!(count(5), 5);
        #[cfg(target_pointer_width = "64")]
        assert_eq!(count(usize::MAX), u32::MAX);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            phases: Vec<(bool, PhaseKind)>,
        }
        impl TraceSink for RecordingSink {
            fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
                self.phases.push((true, e.phase));
            }
            fn on_phase_end(&mut self, e: &PhaseEndEvent) {
                self.phases.push((false, e.phase));
            }
        }

        let mut sink = RecordingSink { phases: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        let phase = tracer.begin(1, PhaseKind::BuildGraph);
        tracer.end(1, phase);
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(
            sink.phases,
            &[(true, PhaseKind::BuildGraph), (false, PhaseKind::BuildGraph)]
        );
    }
}
