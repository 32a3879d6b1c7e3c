// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use vellum_core::trace::{
    CycleEvent, FigureRecomputedEvent, GraphBuiltEvent, PassBeginEvent, PassEndEvent,
    PhaseBeginEvent, PhaseEndEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:begin] pass={} dirty={}",
            e.pass_index, e.dirty_figures,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] pass={} {}",
            e.pass_index,
            e.phase.name(),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] pass={} {}",
            e.pass_index,
            e.phase.name(),
        );
    }

    fn on_graph_built(&mut self, e: &GraphBuiltEvent) {
        let _ = writeln!(
            self.writer,
            "[graph] pass={} vertices={} edges={}",
            e.pass_index, e.vertices, e.edges,
        );
    }

    fn on_cycle(&mut self, e: &CycleEvent) {
        let action = if e.rejected { "REJECTED" } else { "appended" };
        let _ = writeln!(
            self.writer,
            "[cycle] pass={} remaining={} {action}",
            e.pass_index, e.remaining,
        );
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:end] pass={} recomputed={}",
            e.pass_index, e.recomputed,
        );
    }

    fn on_figure_recomputed(&mut self, e: &FigureRecomputedEvent) {
        let _ = writeln!(
            self.writer,
            "[figure] pass={} slot={} mask={:?}",
            e.pass_index, e.figure, e.mask,
        );
    }
}
