//! Error types for msetools-parser.

use thiserror::Error;

/// Result type for element parsing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that makes a parse fail.
///
/// Running out of bytes is not an error: it is reported as
/// [`ParserStatus::NeedMoreData`](crate::ParserStatus::NeedMoreData).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The element header bytes are not a valid encoding.
    #[error("Invalid element header: {0}")]
    InvalidHeader(String),

    /// The header is well formed but uses a feature this parser rejects.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// A leaf element declared an unknown size.
    #[error("Element {id} at offset {position} has an unknown size")]
    UnknownSizeLeaf { id: String, position: u64 },

    /// A list element declared an unknown size.
    #[error("List {id} at offset {position} has an unknown size, which is not supported")]
    UnknownSizeList { id: String, position: u64 },

    /// A child element extends past the end of its parent list.
    #[error("Element overruns list {id} (offset {position}) by {overrun} bytes")]
    ListOverrun {
        id: String,
        position: u64,
        overrun: u64,
    },

    /// The parser client refused an element.
    #[error("{id}: {reason}")]
    Rejected { id: String, reason: String },
}

impl Error {
    /// Create an invalid header error.
    pub fn invalid_header(msg: impl Into<String>) -> Self {
        Self::InvalidHeader(msg.into())
    }

    /// Create an unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create a client rejection for the element `id`.
    pub fn rejected(id: impl ToString, reason: impl Into<String>) -> Self {
        Self::Rejected {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}
