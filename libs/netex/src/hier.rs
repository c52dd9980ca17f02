//! Hierarchy traversal.
//!
//! Cells are extracted children first, so every kept sub-cell is in the
//! output library before any of its parents is collected. Each source cell is
//! processed at most once; `memo` maps it to its output cell.

use std::collections::HashSet;

use diagnostics::IssueSet;
use indexmap::{IndexMap, IndexSet};
use layir::{CellId, Library, LibraryBuilder};
use tracing::{span, Level};

use crate::cell::{run_stages, CellState, Context};
use crate::collect::{collect, kept_children};
use crate::diag::IssueKind;
use crate::error::{ExtractError, Result};
use crate::tech::LayerId;
use crate::{ExtractResult, ExtractStats, Outcome};

/// Source cells reachable from `root`, children before parents.
///
/// The root and, in recursive runs, every kept cell are extracted, so only
/// their kept sub-cells are visited. Cells copied verbatim keep all of their
/// instances.
pub fn order(ctx: &Context, lib: &Library<LayerId>, root: CellId) -> Vec<CellId> {
    let children = |id: CellId| -> Vec<CellId> {
        if id == root || ctx.opts.recursive {
            kept_children(lib, id, &ctx.rule)
        } else {
            lib.try_cell(id)
                .map(|c| c.instances().map(|(_, inst)| inst.child()).collect())
                .unwrap_or_default()
        }
    };

    let mut done = IndexSet::new();
    let mut visiting = HashSet::new();
    let mut stack = vec![(root, false)];
    while let Some((id, expanded)) = stack.pop() {
        if done.contains(&id) {
            continue;
        }
        if expanded {
            done.insert(id);
            continue;
        }
        if !visiting.insert(id) {
            continue;
        }
        stack.push((id, true));
        for child in children(id).into_iter().rev() {
            if !done.contains(&child) {
                stack.push((child, false));
            }
        }
    }
    done.into_iter().collect()
}

/// Extracts `root` and the sub-cells it keeps.
pub fn run(ctx: &Context, lib: &Library<LayerId>, root: CellId) -> Result<ExtractResult> {
    let span = span!(Level::INFO, "extract");
    let _guard = span.enter();

    let order = order(ctx, lib, root);
    let total = order.len();
    let mut out = LibraryBuilder::new();
    let mut memo: IndexMap<CellId, CellId> = IndexMap::new();
    let mut failed: HashSet<CellId> = HashSet::new();
    let mut issues = IssueSet::new();
    let mut stats = ExtractStats {
        cells_total: total,
        ..Default::default()
    };
    let mut outcome = Outcome::Complete;

    for (i, &id) in order.iter().enumerate() {
        ctx.progress.set_progress(i as f64 / total as f64);
        let source = lib
            .try_cell(id)
            .ok_or_else(|| ExtractError::UnknownCell(arcstr::format!("{id:?}")))?;
        ctx.progress.set_status(source.name());

        if id != root && !ctx.opts.recursive {
            let mut cell = source.clone();
            for (_, inst) in cell.instances_mut() {
                if let Some(&child) = memo.get(&inst.child()) {
                    *inst = inst.with_child(child);
                }
            }
            tracing::debug!(name = %source.name(), "copied sub-cell");
            memo.insert(id, out.add_cell(cell));
            continue;
        }

        if ctx.progress.is_cancelled() {
            outcome = Outcome::Aborted;
            break;
        }

        let mut state = CellState::new(ctx, source.name().clone());
        let result = collect(&mut state, lib, id, &out, &memo).and_then(|()| run_stages(&mut state));
        for child in kept_children(lib, id, &ctx.rule) {
            if failed.contains(&child) {
                let child = lib
                    .try_cell(child)
                    .map(|c| c.name().clone())
                    .unwrap_or_default();
                state.issue(None, IssueKind::ChildFailed { child });
            }
        }
        match result {
            Ok(()) => {}
            Err(ExtractError::Aborted) => outcome = Outcome::Aborted,
            Err(ExtractError::Invariant { message, .. }) => {
                state.issue(None, IssueKind::Invariant { message });
                failed.insert(id);
            }
            Err(e) => {
                state.issue(None, IssueKind::Invariant { message: e.to_string() });
                failed.insert(id);
            }
        }

        stats.merge(&state.stats);
        stats.cells_processed += 1;
        issues.extend(state.issues);
        memo.insert(id, out.add_cell(state.cell));
        if outcome == Outcome::Aborted {
            tracing::info!(name = %source.name(), "extraction cancelled");
            break;
        }
    }
    if outcome == Outcome::Complete {
        ctx.progress.set_progress(1.);
    }

    let root = memo.get(&root).copied();
    Ok(ExtractResult {
        library: out.build()?,
        cells: memo,
        root,
        issues,
        stats,
        outcome,
    })
}
