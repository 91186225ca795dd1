//! Error types for stylescope operations.

use thiserror::Error;

use crate::dom::NodeId;

/// Errors surfaced by the inspector API.
///
/// Per-item failures inside a batch pass (an unreadable sheet, a selector the
/// matcher rejects) never show up here; they are recorded on the result that
/// the pass returns. This enum only covers outright API misuse.
#[derive(Error, Debug)]
pub enum Error {
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// A selector the platform matcher rejected.
///
/// Carried as a value inside match reports so a skipped selector stays
/// visible to callers and tests instead of aborting the batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("selector {selector:?} was rejected by the matcher")]
pub struct SelectorError {
    pub selector: String,
}

impl SelectorError {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
