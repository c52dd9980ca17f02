//! Extraction diagnostics.

use std::fmt::Display;

use arcstr::ArcStr;
use diagnostics::{Diagnostic, Severity};
use geometry::prelude::*;
use itertools::Itertools;

/// Why a template could not explain a piece of geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    MissingLayer { layer: ArcStr },
    UnexpectedLayer { layer: ArcStr },
    CutSizeMismatch { expected: (i64, i64), actual: (i64, i64) },
    OppositeWell { layer: ArcStr },
    TooSmall { width: i64, length: i64 },
    NotContained { layer: ArcStr },
    /// The drawn cuts differ from the cuts the contact would place.
    CutLayout,
    /// The placement does not fall on the unit grid.
    OffGrid,
    Orientation,
}

impl Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingLayer { layer } => write!(f, "layer `{layer}` is missing"),
            Self::UnexpectedLayer { layer } => write!(f, "layer `{layer}` must be absent"),
            Self::CutSizeMismatch { expected, actual } => write!(
                f,
                "cut is {}x{}, expected {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
            Self::OppositeWell { layer } => write!(f, "sits on opposite well `{layer}`"),
            Self::TooSmall { width, length } => {
                write!(f, "gate is smaller than {width}x{length}")
            }
            Self::NotContained { layer } => {
                write!(f, "shape on `{layer}` is not covered by the layout")
            }
            Self::CutLayout => write!(f, "drawn cuts differ from the contact's cut layout"),
            Self::OffGrid => write!(f, "placement falls off the unit grid"),
            Self::Orientation => write!(f, "no orientation fits"),
        }
    }
}

/// A rejected template and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub template: ArcStr,
    pub reason: RejectReason,
}

impl Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.template, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    UnresolvedCut { reasons: Vec<Rejection> },
    MalformedCut,
    UnresolvedTransistor { reasons: Vec<Rejection> },
    AmbiguousBridge { networks: usize },
    UnresolvedRegion { layer: ArcStr },
    ChildFailed { child: ArcStr },
    /// A node or wire of the source could not be decomposed and was dropped.
    SkippedElement { name: ArcStr, message: String },
    Invariant { message: String },
    ExportUnmatched { name: ArcStr },
}

/// A problem found while extracting a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractIssue {
    pub cell: ArcStr,
    /// Location in external units.
    pub location: Option<Rect>,
    pub kind: IssueKind,
}

impl ExtractIssue {
    pub fn new(cell: impl Into<ArcStr>, location: Option<Rect>, kind: IssueKind) -> Self {
        Self {
            cell: cell.into(),
            location,
            kind,
        }
    }
}

impl Display for ExtractIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cell)?;
        if let Some(r) = self.location {
            write!(
                f,
                " ({}, {})-({}, {})",
                r.left(),
                r.bot(),
                r.right(),
                r.top()
            )?;
        }
        write!(f, ": ")?;
        match &self.kind {
            IssueKind::UnresolvedCut { reasons } => {
                write!(f, "no contact matches cut")?;
                if !reasons.is_empty() {
                    write!(f, " [{}]", reasons.iter().join("; "))?;
                }
                Ok(())
            }
            IssueKind::MalformedCut => write!(f, "cut is not an axis-aligned rectangle"),
            IssueKind::UnresolvedTransistor { reasons } => {
                write!(f, "no transistor matches gate region")?;
                if !reasons.is_empty() {
                    write!(f, " [{}]", reasons.iter().join("; "))?;
                }
                Ok(())
            }
            IssueKind::AmbiguousBridge { networks } => {
                write!(f, "leftover geometry touches {networks} networks")
            }
            IssueKind::UnresolvedRegion { layer } => {
                write!(f, "geometry on `{layer}` left as pure layer")
            }
            IssueKind::ChildFailed { child } => write!(f, "extraction of `{child}` failed"),
            IssueKind::SkippedElement { name, message } => write!(f, "skipped `{name}`: {message}"),
            IssueKind::Invariant { message } => write!(f, "internal error: {message}"),
            IssueKind::ExportUnmatched { name } => {
                write!(f, "export `{name}` matches no port; placed a pin")
            }
        }
    }
}

impl Diagnostic for ExtractIssue {
    fn help(&self) -> Option<Box<dyn Display>> {
        match self.kind {
            IssueKind::UnresolvedCut { .. } | IssueKind::UnresolvedTransistor { .. } => Some(
                Box::new("check that the surrounding layers match a technology prototype"),
            ),
            IssueKind::AmbiguousBridge { .. } => {
                Some(Box::new("connect the geometry by hand or split it"))
            }
            IssueKind::SkippedElement { .. } => {
                Some(Box::new("check the prototype names against the technology"))
            }
            _ => None,
        }
    }

    fn severity(&self) -> Severity {
        match self.kind {
            IssueKind::ChildFailed { .. } | IssueKind::Invariant { .. } => Severity::Error,
            IssueKind::MalformedCut
            | IssueKind::UnresolvedCut { .. }
            | IssueKind::UnresolvedTransistor { .. }
            | IssueKind::AmbiguousBridge { .. }
            | IssueKind::SkippedElement { .. } => Severity::Warning,
            IssueKind::UnresolvedRegion { .. } | IssueKind::ExportUnmatched { .. } => {
                Severity::Info
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_cut_lists_reasons() {
        let issue = ExtractIssue::new(
            "inv",
            Some(Rect::from_sides(0, 0, 2, 2)),
            IssueKind::UnresolvedCut {
                reasons: vec![
                    Rejection {
                        template: "metal-1-metal-2-con".into(),
                        reason: RejectReason::MissingLayer {
                            layer: "metal-2".into(),
                        },
                    },
                    Rejection {
                        template: "metal-1-polysilicon-1-con".into(),
                        reason: RejectReason::CutSizeMismatch {
                            expected: (2, 2),
                            actual: (3, 2),
                        },
                    },
                ],
            },
        );
        assert_eq!(
            issue.to_string(),
            "inv (0, 0)-(2, 2): no contact matches cut [metal-1-metal-2-con: layer `metal-2` is missing; \
             metal-1-polysilicon-1-con: cut is 3x2, expected 2x2]"
        );
        assert_eq!(issue.severity(), Severity::Warning);
        assert!(issue.help().is_some());
    }

    #[test]
    fn severities() {
        let child = ExtractIssue::new("top", None, IssueKind::ChildFailed { child: "a".into() });
        assert!(child.severity().is_error());
        let export = ExtractIssue::new("top", None, IssueKind::ExportUnmatched { name: "vdd".into() });
        assert_eq!(export.severity(), Severity::Info);
    }
}
