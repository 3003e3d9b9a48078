//! Error taxonomy for the bit sequence engine.

use thiserror::Error;

/// Result alias defaulting the error type to [`enum@Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Failure categories surfaced at every operation boundary.
///
/// Mutations are transactional per call: on failure the sequence is
/// unchanged. Typed reads restore the cursor on failure.
#[derive(Debug, Error)]
pub enum Error {
    /// A constructor or pack argument is inconsistent with the declared
    /// token or length: out-of-range integer, invalid digit, length
    /// mismatch, window past the end of a file.
    #[error("invalid construction: {0}")]
    Construction(String),

    /// A region was interpreted with a codec whose length constraints do
    /// not hold for it, such as hex of a region that is not a whole number
    /// of nibbles.
    #[error("invalid interpretation: {0}")]
    Interpretation(String),

    /// A read, peek or index reached past the end of the sequence.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// A byte-position or byte-length operation was invoked on a position
    /// that is not a multiple of eight bits.
    #[error("byte alignment required: {0}")]
    AlignmentRequired(String),

    /// The format string could not be parsed: unknown token name,
    /// unbalanced parentheses, or more than one unbounded token.
    #[error("format syntax: {0}")]
    Syntax(String),

    /// I/O failure from a file-backed sequence.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn construction(msg: impl Into<String>) -> Self {
        Error::Construction(msg.into())
    }

    pub(crate) fn interpretation(msg: impl Into<String>) -> Self {
        Error::Interpretation(msg.into())
    }

    pub(crate) fn out_of_range(msg: impl Into<String>) -> Self {
        Error::OutOfRange(msg.into())
    }

    pub(crate) fn alignment(msg: impl Into<String>) -> Self {
        Error::AlignmentRequired(msg.into())
    }

    pub(crate) fn syntax(msg: impl Into<String>) -> Self {
        Error::Syntax(msg.into())
    }

    /// Reclassify an interpretation failure as a construction failure, for
    /// the encoding side of a validation path shared with the readers.
    pub(crate) fn into_construction(self) -> Self {
        match self {
            Error::Interpretation(msg) => Error::Construction(msg),
            other => other,
        }
    }
}
