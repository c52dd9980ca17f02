//! Error types.

use arcstr::ArcStr;

/// The result type returned by extraction functions.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// An error that stops the extraction of a cell or of the whole run.
///
/// Cancellation and invalid options end the run. Other errors fail only the
/// cell being extracted.
///
/// Problems with individual pieces of geometry are not errors; they are
/// recorded as [`ExtractIssue`](crate::diag::ExtractIssue)s and extraction continues.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("cell `{0}` is not in the library")]
    UnknownCell(ArcStr),
    #[error("no arc prototype routes layer `{0}`")]
    NoArcForLayer(ArcStr),
    #[error("no pin prototype for arc `{0}`")]
    NoPinForArc(ArcStr),
    #[error("no node or arc prototype named `{0}`")]
    UnknownPrototype(ArcStr),
    /// An internal consistency check failed while extracting `cell`.
    ///
    /// Only the enclosing cell is affected.
    #[error("internal error while extracting `{cell}`: {message}")]
    Invariant { cell: ArcStr, message: String },
    #[error("extraction was cancelled")]
    Aborted,
    #[error("invalid extraction options: {0}")]
    Config(#[from] toml::de::Error),
    #[error("invalid cell name pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("failed to assemble the output library: {0}")]
    Build(#[from] layir::BuildError),
}

impl ExtractError {
    pub(crate) fn invariant(cell: &ArcStr, message: impl Into<String>) -> Self {
        Self::Invariant {
            cell: cell.clone(),
            message: message.into(),
        }
    }
}
