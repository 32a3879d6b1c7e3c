// Copyright 2026 the Vellum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by the drawing model.

use alloc::vec::Vec;
use core::fmt;

use crate::figure::FigureId;

/// An error returned by a [`DrawingModel`](crate::model::DrawingModel)
/// operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelError {
    /// Attempted to clear the root of a drawing that has one.
    NullRoot,
    /// Registering the layout relation would make `observer` depend on
    /// itself.
    ObserverCycle {
        /// The figure that would observe.
        observer: FigureId,
        /// The figure that would be observed.
        subject: FigureId,
    },
    /// The dependency graph of a validation pass contains a cycle.
    ///
    /// The relations involved are child layout and layout observers taken
    /// together; each is acyclic on its own.
    LayoutCycle {
        /// Figures on or behind the cycle, in discovery order.
        figures: Vec<FigureId>,
    },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullRoot => write!(f, "cannot replace the drawing root with no root"),
            Self::ObserverCycle { observer, subject } => write!(
                f,
                "layout relation {observer:?} -> {subject:?} would create a cycle"
            ),
            Self::LayoutCycle { figures } => write!(
                f,
                "layout dependency cycle among {} figures",
                figures.len()
            ),
        }
    }
}

impl core::error::Error for ModelError {}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            ModelError::NullRoot.to_string(),
            "cannot replace the drawing root with no root"
        );
        let a = FigureId {
            idx: 1,
            generation: 0,
        };
        let b = FigureId {
            idx: 2,
            generation: 3,
        };
        assert_eq!(
            ModelError::ObserverCycle {
                observer: a,
                subject: b
            }
            .to_string(),
            "layout relation FigureId(1@gen0) -> FigureId(2@gen3) would create a cycle"
        );
        assert_eq!(
            ModelError::LayoutCycle { figures: vec![a, b] }.to_string(),
            "layout dependency cycle among 2 figures"
        );
    }
}
