//! Parser error types for cdoc-parser.

/// Why a backend produced no symbol for a comment unit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFailure {
    /// The front-end is missing or rejected this unit; try another backend.
    #[error("Parser backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The declaration is not something this backend documents.
    #[error("Declaration could not be classified")]
    Unclassified,
}

/// Errors that can occur while reading sources for parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Unsupported source file: {0}")]
    UnsupportedFile(String),
}
