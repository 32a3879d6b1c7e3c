// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. Core trace events carry no
//! time, so each record starts with a timestamp in nanoseconds read from the
//! recorder's clock. [`decode`] reads them back as an iterator of
//! [`Record`].
//!
//! Record layout: `tag: u8`, `timestamp_ns: u64`, `pass_index: u64`, then the
//! event fields.

use std::fmt;
use std::time::Instant;

use vellum_core::dirty::DirtyMask;
use vellum_core::trace::{
    CycleEvent, FigureRecomputedEvent, GraphBuiltEvent, PassBeginEvent, PassEndEvent,
    PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PASS_BEGIN: u8 = 1;
const TAG_PHASE_BEGIN: u8 = 2;
const TAG_PHASE_END: u8 = 3;
const TAG_GRAPH_BUILT: u8 = 4;
const TAG_CYCLE: u8 = 5;
const TAG_PASS_END: u8 = 6;
const TAG_FIGURE_RECOMPUTED: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A clock returning monotonic nanoseconds.
pub type Clock = Box<dyn FnMut() -> u64>;

/// A [`TraceSink`] that encodes events into a compact binary buffer.
pub struct RecorderSink {
    buf: Vec<u8>,
    clock: Clock,
}

impl fmt::Debug for RecorderSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecorderSink")
            .field("len", &self.buf.len())
            .finish_non_exhaustive()
    }
}

impl Default for RecorderSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecorderSink {
    /// Creates an empty recorder stamping events with the time elapsed since
    /// its creation.
    #[must_use]
    pub fn new() -> Self {
        let start = Instant::now();
        Self::with_clock(move || u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX))
    }

    /// Creates an empty recorder that reads timestamps from `clock`.
    #[must_use]
    pub fn with_clock(clock: impl FnMut() -> u64 + 'static) -> Self {
        Self {
            buf: Vec::new(),
            clock: Box::new(clock),
        }
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn header(&mut self, tag: u8, pass_index: u64) {
        let now = (self.clock)();
        self.write_u8(tag);
        self.write_u64(now);
        self.write_u64(pass_index);
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::BuildGraph => 0,
            PhaseKind::Sort => 1,
            PhaseKind::Notify => 2,
            PhaseKind::Recompute => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.header(TAG_PASS_BEGIN, e.pass_index);
        self.write_u32(e.dirty_figures);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.header(TAG_PHASE_BEGIN, e.pass_index);
        self.write_phase(e.phase);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.header(TAG_PHASE_END, e.pass_index);
        self.write_phase(e.phase);
    }

    fn on_graph_built(&mut self, e: &GraphBuiltEvent) {
        self.header(TAG_GRAPH_BUILT, e.pass_index);
        self.write_u32(e.vertices);
        self.write_u32(e.edges);
    }

    fn on_cycle(&mut self, e: &CycleEvent) {
        self.header(TAG_CYCLE, e.pass_index);
        self.write_u32(e.remaining);
        self.write_u8(u8::from(e.rejected));
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.header(TAG_PASS_END, e.pass_index);
        self.write_u32(e.recomputed);
    }

    fn on_figure_recomputed(&mut self, e: &FigureRecomputedEvent) {
        self.header(TAG_FIGURE_RECOMPUTED, e.pass_index);
        self.write_u32(e.figure);
        self.write_u8(e.mask.bits());
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`PassBeginEvent`].
    PassBegin(PassBeginEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`GraphBuiltEvent`].
    GraphBuilt(GraphBuiltEvent),
    /// A [`CycleEvent`].
    Cycle(CycleEvent),
    /// A [`PassEndEvent`].
    PassEnd(PassEndEvent),
    /// A [`FigureRecomputedEvent`].
    FigureRecomputed(FigureRecomputedEvent),
}

impl RecordedEvent {
    /// Returns the pass the event belongs to.
    #[must_use]
    pub fn pass_index(&self) -> u64 {
        match self {
            Self::PassBegin(e) => e.pass_index,
            Self::PhaseBegin(e) => e.pass_index,
            Self::PhaseEnd(e) => e.pass_index,
            Self::GraphBuilt(e) => e.pass_index,
            Self::Cycle(e) => e.pass_index,
            Self::PassEnd(e) => e.pass_index,
            Self::FigureRecomputed(e) => e.pass_index,
        }
    }
}

/// A decoded event with the time it was recorded.
#[derive(Clone, Debug)]
pub struct Record {
    /// Recorder clock reading, in nanoseconds.
    pub timestamp_ns: u64,
    /// The event.
    pub event: RecordedEvent,
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`Record`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::BuildGraph,
            1 => PhaseKind::Sort,
            2 => PhaseKind::Notify,
            _ => PhaseKind::Recompute,
        })
    }

    fn decode_event(&mut self, tag: u8, pass_index: u64) -> Option<RecordedEvent> {
        Some(match tag {
            TAG_PASS_BEGIN => RecordedEvent::PassBegin(PassBeginEvent {
                pass_index,
                dirty_figures: self.read_u32()?,
            }),
            TAG_PHASE_BEGIN => RecordedEvent::PhaseBegin(PhaseBeginEvent {
                pass_index,
                phase: self.read_phase()?,
            }),
            TAG_PHASE_END => RecordedEvent::PhaseEnd(PhaseEndEvent {
                pass_index,
                phase: self.read_phase()?,
            }),
            TAG_GRAPH_BUILT => RecordedEvent::GraphBuilt(GraphBuiltEvent {
                pass_index,
                vertices: self.read_u32()?,
                edges: self.read_u32()?,
            }),
            TAG_CYCLE => RecordedEvent::Cycle(CycleEvent {
                pass_index,
                remaining: self.read_u32()?,
                rejected: self.read_u8()? != 0,
            }),
            TAG_PASS_END => RecordedEvent::PassEnd(PassEndEvent {
                pass_index,
                recomputed: self.read_u32()?,
            }),
            TAG_FIGURE_RECOMPUTED => RecordedEvent::FigureRecomputed(FigureRecomputedEvent {
                pass_index,
                figure: self.read_u32()?,
                mask: DirtyMask::from_bits_truncate(self.read_u8()?),
            }),
            _ => return None, // unknown tag → stop iteration
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        let timestamp_ns = self.read_u64()?;
        let pass_index = self.read_u64()?;
        let event = self.decode_event(tag, pass_index)?;
        Some(Record {
            timestamp_ns,
            event,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    /// A recorder whose clock advances by 100ns per event, starting at 0.
    fn stepping_recorder() -> RecorderSink {
        let t = Rc::new(Cell::new(0));
        RecorderSink::with_clock(move || {
            let now = t.get();
            t.set(now + 100);
            now
        })
    }

    #[test]
    fn records_are_stamped_in_order() {
        let mut rec = stepping_recorder();
        rec.on_pass_begin(&PassBeginEvent {
            pass_index: 3,
            dirty_figures: 2,
        });
        rec.on_phase_begin(&PhaseBeginEvent {
            pass_index: 3,
            phase: PhaseKind::Notify,
        });
        rec.on_phase_end(&PhaseEndEvent {
            pass_index: 3,
            phase: PhaseKind::Notify,
        });

        let records: Vec<_> = decode(rec.as_bytes()).collect();
        let stamps: Vec<_> = records.iter().map(|r| r.timestamp_ns).collect();
        assert_eq!(stamps, [0, 100, 200]);
        assert!(records.iter().all(|r| r.event.pass_index() == 3));
        match &records[0].event {
            RecordedEvent::PassBegin(e) => assert_eq!(e.dirty_figures, 2),
            other => panic!("expected PassBegin, got {other:?}"),
        }
        match &records[2].event {
            RecordedEvent::PhaseEnd(e) => assert_eq!(e.phase, PhaseKind::Notify),
            other => panic!("expected PhaseEnd, got {other:?}"),
        }
    }

    #[test]
    fn cycle_and_graph_fields_survive() {
        let mut rec = stepping_recorder();
        rec.on_graph_built(&GraphBuiltEvent {
            pass_index: 1,
            vertices: 9,
            edges: 12,
        });
        rec.on_cycle(&CycleEvent {
            pass_index: 1,
            remaining: 4,
            rejected: true,
        });

        let events: Vec<_> = decode(rec.as_bytes()).map(|r| r.event).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            RecordedEvent::GraphBuilt(e) => {
                assert_eq!(e.vertices, 9);
                assert_eq!(e.edges, 12);
            }
            other => panic!("expected GraphBuilt, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::Cycle(e) => {
                assert_eq!(e.remaining, 4);
                assert!(e.rejected);
            }
            other => panic!("expected Cycle, got {other:?}"),
        }
    }

    #[test]
    fn figure_recomputed_keeps_mask() {
        let mut rec = stepping_recorder();
        rec.on_figure_recomputed(&FigureRecomputedEvent {
            pass_index: 0,
            figure: 17,
            mask: DirtyMask::LAYOUT | DirtyMask::STYLE,
        });

        let events: Vec<_> = decode(rec.as_bytes()).map(|r| r.event).collect();
        match &events[..] {
            [RecordedEvent::FigureRecomputed(e)] => {
                assert_eq!(e.figure, 17);
                assert_eq!(e.mask, DirtyMask::LAYOUT | DirtyMask::STYLE);
            }
            other => panic!("expected one FigureRecomputed, got {other:?}"),
        }
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = stepping_recorder();
        rec.on_pass_end(&PassEndEvent {
            pass_index: 0,
            recomputed: 5,
        });
        rec.on_pass_end(&PassEndEvent {
            pass_index: 1,
            recomputed: 6,
        });
        let bytes = rec.into_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn default_clock_is_monotonic() {
        let mut rec = RecorderSink::new();
        for pass_index in 0..3 {
            rec.on_pass_end(&PassEndEvent {
                pass_index,
                recomputed: 0,
            });
        }
        let stamps: Vec<_> = decode(rec.as_bytes()).map(|r| r.timestamp_ns).collect();
        assert_eq!(stamps.len(), 3);
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }
}
