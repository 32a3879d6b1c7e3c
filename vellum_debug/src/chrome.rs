// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Passes and their phases become nested duration events (`B`/`E`); graph,
//! cycle, and figure events become instants inside them.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for record in decode(bytes) {
        let ts = nanos_to_us(record.timestamp_ns);
        let pass_index = record.event.pass_index();
        let event = match record.event {
            RecordedEvent::PassBegin(e) => json!({
                "ph": "B",
                "name": "Pass",
                "cat": "Validate",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "args": {
                    "pass_index": pass_index,
                    "dirty_figures": e.dirty_figures,
                }
            }),
            RecordedEvent::PassEnd(e) => json!({
                "ph": "E",
                "name": "Pass",
                "cat": "Validate",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "args": {
                    "pass_index": pass_index,
                    "recomputed": e.recomputed,
                }
            }),
            RecordedEvent::PhaseBegin(e) => json!({
                "ph": "B",
                "name": format!("{:?}", e.phase),
                "cat": "Phase",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "args": { "pass_index": pass_index }
            }),
            RecordedEvent::PhaseEnd(e) => json!({
                "ph": "E",
                "name": format!("{:?}", e.phase),
                "cat": "Phase",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "args": { "pass_index": pass_index }
            }),
            RecordedEvent::GraphBuilt(e) => json!({
                "ph": "i",
                "name": "GraphBuilt",
                "cat": "Graph",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "t",
                "args": {
                    "pass_index": pass_index,
                    "vertices": e.vertices,
                    "edges": e.edges,
                }
            }),
            RecordedEvent::Cycle(e) => json!({
                "ph": "i",
                "name": "Cycle",
                "cat": "Graph",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "t",
                "args": {
                    "pass_index": pass_index,
                    "remaining": e.remaining,
                    "rejected": e.rejected,
                }
            }),
            RecordedEvent::FigureRecomputed(e) => json!({
                "ph": "i",
                "name": "FigureRecomputed",
                "cat": "Rich",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "t",
                "args": {
                    "pass_index": pass_index,
                    "figure": e.figure,
                    "mask": format!("{:?}", e.mask),
                }
            }),
        };
        events.push(event);
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn nanos_to_us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}
