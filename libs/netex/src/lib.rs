//! Extraction of contacts, transistors and wires from pure-layer layout.
//!
//! [`extract`] takes a cell made only of polygons on technology layers and
//! rebuilds it as a cell of primitive nodes connected by wires. Stages run in
//! a fixed order on each cell, and each one removes the geometry it explains
//! before the next one runs:
//!
//! 1. contacts and vias, from the cuts on every cut layer;
//! 2. transistors, from the overlap of gate and diffusion layers;
//! 3. wires, from the centerlines of what is left on routable layers;
//! 4. bridges, joining small leftover regions to the networks they touch;
//! 5. residue, copying anything still unexplained as pure-layer shapes.
//!
//! Problems with individual pieces of geometry never stop extraction. They
//! are recorded as [`ExtractIssue`](diag::ExtractIssue)s in the result.

mod bridge;
mod cell;
pub mod centerline;
mod collect;
mod contact;
pub mod cuts;
pub mod diag;
pub mod error;
mod exports;
mod hier;
pub mod layers;
pub mod merge;
pub mod networks;
pub mod opts;
mod ports;
pub mod progress;
mod residue;
pub mod scale;
pub mod tech;
pub mod template;
mod transistor;
mod wire;

#[cfg(test)]
mod tests;

use std::ops::AddAssign;

use diagnostics::IssueSet;
use indexmap::IndexMap;
use layir::{CellId, Library};
use serde::{Deserialize, Serialize};

use crate::cell::Context;
use crate::diag::ExtractIssue;
use crate::error::Result;
use crate::opts::ExtractOpts;
use crate::progress::Progress;
use crate::tech::{LayerId, Technology};

/// Counts of what an extraction run produced.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExtractStats {
    pub contacts: usize,
    pub transistors: usize,
    pub wires: usize,
    pub pins: usize,
    pub bridges: usize,
    /// Pure-layer shapes left in the output.
    pub residue: usize,
    pub cells_processed: usize,
    pub cells_total: usize,
}

impl ExtractStats {
    /// Adds the per-cell counts of `other`. Cell counts are left alone.
    pub fn merge(&mut self, other: &ExtractStats) {
        self.contacts += other.contacts;
        self.transistors += other.transistors;
        self.wires += other.wires;
        self.pins += other.pins;
        self.bridges += other.bridges;
        self.residue += other.residue;
    }
}

impl AddAssign<&ExtractStats> for ExtractStats {
    fn add_assign(&mut self, rhs: &ExtractStats) {
        self.merge(rhs);
    }
}

/// How an extraction run ended.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    #[default]
    Complete,
    /// Cancelled through [`Progress::is_cancelled`].
    ///
    /// Cells finished before cancellation are complete; the cell being
    /// extracted when it happened is partially extracted.
    Aborted,
}

/// The result of [`extract`].
#[derive(Debug)]
pub struct ExtractResult {
    /// The extracted cells and every sub-cell they instantiate.
    pub library: Library<LayerId>,
    /// Maps source cells to their cells in `library`.
    pub cells: IndexMap<CellId, CellId>,
    /// The extracted root cell, if extraction got that far.
    pub root: Option<CellId>,
    pub issues: IssueSet<ExtractIssue>,
    pub stats: ExtractStats,
    pub outcome: Outcome,
}

impl ExtractResult {
    #[inline]
    pub fn num_errors(&self) -> usize {
        self.issues.num_errors()
    }

    #[inline]
    pub fn num_warnings(&self) -> usize {
        self.issues.num_warnings()
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.outcome == Outcome::Complete
    }
}

/// Extracts cell `root` of `lib` using technology `tech`.
///
/// Kept sub-cells are extracted too when [`ExtractOpts::recursive`] is set,
/// and copied unchanged otherwise. A cell whose extraction fails is kept as
/// far as it got and reported. Returns an error only when the options are
/// invalid or the output library cannot be assembled; cancellation yields
/// [`Outcome::Aborted`].
pub fn extract(
    lib: &Library<LayerId>,
    root: CellId,
    tech: &Technology,
    opts: &ExtractOpts,
    progress: &dyn Progress,
) -> Result<ExtractResult> {
    let ctx = Context::new(tech, opts, progress)?;
    hier::run(&ctx, lib, root)
}
