//! Error taxonomy for the extraction pipeline.
//!
//! Only two kinds abort a run: text that cannot be read at all, and a
//! source nobody identified. Everything else degrades: unsupported sources
//! and empty extractions come back as warning results, malformed blocks
//! are dropped alone, and balance mismatches lower the accuracy score.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// No text (and no rows) could be obtained from the document.
    #[error("no extractable text in statement")]
    UnreadableInput,
    /// The caller could not name a source institution.
    #[error("source institution could not be identified")]
    SourceUnidentified,
}

impl ExtractError {
    /// Stable machine-readable code for front-end mapping.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnreadableInput => "UNREADABLE_INPUT",
            Self::SourceUnidentified => "SOURCE_UNIDENTIFIED",
        }
    }

    /// Whether the application layer can recover (e.g. by asking the user
    /// which bank issued the statement).
    pub fn recoverable(&self) -> bool {
        matches!(self, Self::SourceUnidentified)
    }
}
