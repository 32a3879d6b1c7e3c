// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Figure identity.

use core::fmt;

/// Sentinel value indicating "no figure" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a figure in a [`FigureStore`](super::FigureStore).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a figure is destroyed and the slot is reused.
/// Two handles are equal exactly when they name the same figure.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FigureId {
    /// Slot index into the store's arrays.
    pub(crate) idx: u32,
    /// Generation counter; must match the store's generation for this slot.
    pub(crate) generation: u32,
}

impl FigureId {
    /// Returns the raw slot index (for diagnostics and trace records).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for FigureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FigureId({}@gen{})", self.idx, self.generation)
    }
}
