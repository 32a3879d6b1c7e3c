// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty bits and the per-figure dirty set.
//!
//! Each bit of a [`DirtyMask`] names an independent category of derived
//! state that has gone stale. Masks are values: combining two masks yields a
//! new mask, and nothing ever clears an individual bit. Bits only disappear
//! when a figure's whole entry leaves the [`DirtySet`].
//!
//! # Propagation semantics
//!
//! Bits differ in how far a validation pass reaches from the marked figure:
//!
//! - **Propagating**: [`LAYOUT`](DirtyMask::LAYOUT),
//!   [`TRANSFORM`](DirtyMask::TRANSFORM), [`NODE`](DirtyMask::NODE),
//!   [`LAYOUT_OBSERVERS`](DirtyMask::LAYOUT_OBSERVERS) and
//!   [`LAYOUT_SUBJECT`](DirtyMask::LAYOUT_SUBJECT) pull the figure's
//!   subtree, its child-layout ancestors, and its transitive layout observers
//!   into the dependency graph (see [`graph`](crate::graph)).
//!
//! - **Local-only**: [`STYLE`](DirtyMask::STYLE) alone recomputes just the
//!   marked figure. Style changes do not propagate transitively.
//!
//! - **Relation**: [`LAYOUT_OBSERVERS`](DirtyMask::LAYOUT_OBSERVERS) and
//!   [`LAYOUT_SUBJECT`](DirtyMask::LAYOUT_SUBJECT) additionally trigger the
//!   figure's relation-changed hooks before geometry is recomputed.

use alloc::vec::Vec;

use bitflags::bitflags;

use crate::figure::INVALID;

bitflags! {
    /// An immutable set of invalidation kinds.
    ///
    /// `EMPTY` has no bits set, `ALL` has every bit set. Combine masks with
    /// [`add`](Self::add) (or `|`); the result is always a new value.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DirtyMask: u8 {
        /// Computed style must be recomputed.
        const STYLE = 1 << 0;
        /// Local-to-world transform must be recomputed.
        const TRANSFORM = 1 << 1;
        /// Geometry must be laid out again.
        const LAYOUT = 1 << 2;
        /// The set of figures observing this figure's layout changed.
        const LAYOUT_OBSERVERS = 1 << 3;
        /// The set of figures this figure's layout depends on changed.
        const LAYOUT_SUBJECT = 1 << 4;
        /// The rendered node must be rebuilt.
        const NODE = 1 << 5;
    }
}

impl DirtyMask {
    /// The mask with no bits set.
    pub const EMPTY: Self = Self::empty();

    /// The mask with every bit set.
    pub const ALL: Self = Self::all();

    /// Bits that make a figure a member of the dependency graph.
    ///
    /// Everything except [`STYLE`](Self::STYLE).
    pub const PROPAGATING: Self = Self::ALL.difference(Self::STYLE);

    /// Bits that trigger relation-changed hooks at the start of a pass.
    pub const RELATION: Self = Self::LAYOUT_OBSERVERS.union(Self::LAYOUT_SUBJECT);

    /// Builds a mask from the OR of `masks`.
    #[must_use]
    pub const fn of(masks: &[Self]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < masks.len() {
            bits |= masks[i].bits();
            i += 1;
        }
        Self::from_bits_retain(bits)
    }

    /// Returns a new mask that is the OR of `self` and `other`.
    #[must_use]
    #[expect(
        clippy::should_implement_trait,
        reason = "masks combine through `|`; `add` is the usable-in-const spelling"
    )]
    pub const fn add(self, other: Self) -> Self {
        self.union(other)
    }

    /// Returns whether any of `masks` shares a bit with `self`.
    #[must_use]
    pub const fn contains_one_of(self, masks: &[Self]) -> bool {
        self.intersects(Self::of(masks))
    }
}

/// Accumulated dirty masks, keyed by raw figure slot.
///
/// Every present entry has a non-empty mask. Iteration yields entries in the
/// order they were first marked, which gives validation passes a
/// deterministic tie-break.
///
/// Slot indices come from [`FigureId::index`](crate::figure::FigureId::index).
/// The set does not check generations: the owner must [`remove`](Self::remove)
/// a slot's entry before the slot is recycled.
#[derive(Clone, Debug, Default)]
pub struct DirtySet {
    masks: Vec<DirtyMask>,
    /// Slots in first-marked order. Removed entries leave an [`INVALID`]
    /// tombstone until the next compaction.
    order: Vec<u32>,
    /// Slot → index into `order`, [`INVALID`] when absent.
    position: Vec<u32>,
    len: usize,
}

impl DirtySet {
    /// Creates an empty dirty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ORs `mask` into the entry for `slot`, inserting it if absent.
    ///
    /// An empty `mask` is ignored. Returns `true` if a new entry was created.
    pub fn mark(&mut self, slot: u32, mask: DirtyMask) -> bool {
        if mask.is_empty() {
            return false;
        }
        let i = slot as usize;
        if i >= self.masks.len() {
            self.masks.resize(i + 1, DirtyMask::EMPTY);
            self.position.resize(i + 1, INVALID);
        }
        let inserted = self.masks[i].is_empty();
        if inserted {
            self.position[i] = order_index(self.order.len());
            self.order.push(slot);
            self.len += 1;
        }
        self.masks[i] = self.masks[i].add(mask);
        inserted
    }

    /// Removes the entry for `slot` outright, returning its mask.
    ///
    /// Amortized constant time.
    pub fn remove(&mut self, slot: u32) -> Option<DirtyMask> {
        let mask = self.get(slot);
        if mask.is_empty() {
            return None;
        }
        let i = slot as usize;
        self.masks[i] = DirtyMask::EMPTY;
        self.order[self.position[i] as usize] = INVALID;
        self.position[i] = INVALID;
        self.len -= 1;
        if self.order.len() >= 2 * self.len.max(8) {
            self.compact();
        }
        Some(mask)
    }

    /// Returns the mask for `slot` ([`DirtyMask::EMPTY`] if absent).
    #[must_use]
    pub fn get(&self, slot: u32) -> DirtyMask {
        self.masks
            .get(slot as usize)
            .copied()
            .unwrap_or(DirtyMask::EMPTY)
    }

    /// Returns whether `slot` has an entry.
    #[must_use]
    pub fn contains(&self, slot: u32) -> bool {
        !self.get(slot).is_empty()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates `(slot, mask)` entries in first-marked order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, DirtyMask)> + '_ {
        self.order
            .iter()
            .filter(|&&slot| slot != INVALID)
            .map(|&slot| (slot, self.masks[slot as usize]))
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        for &slot in &self.order {
            if slot != INVALID {
                self.masks[slot as usize] = DirtyMask::EMPTY;
                self.position[slot as usize] = INVALID;
            }
        }
        self.order.clear();
        self.len = 0;
    }

    /// Drops tombstones from `order`, keeping first-marked order.
    fn compact(&mut self) {
        self.order.retain(|&slot| slot != INVALID);
        for (index, &slot) in self.order.iter().enumerate() {
            self.position[slot as usize] = order_index(index);
        }
    }
}

fn order_index(index: usize) -> u32 {
    u32::try_from(index).unwrap_or_else(|_| panic!("dirty set exceeds {INVALID} entries"))
}
