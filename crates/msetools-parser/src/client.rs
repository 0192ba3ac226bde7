//! Parser client contract and the header types it exchanges with the parser.

use std::fmt;

use crate::Result;

/// Outcome of a successful parse step.
///
/// Failures are reported through [`Error`](crate::Error) instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserStatus {
    /// All buffered bytes were consumed and no list is open.
    Ok,
    /// Parsing stopped at a boundary and is waiting for more bytes.
    NeedMoreData,
}

/// Payload size declared by an element header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementSize {
    /// Payload length in bytes.
    Known(u64),
    /// The format allows the length to be left undeclared.
    Unknown,
}

impl ElementSize {
    /// The declared size, if any.
    pub fn known(self) -> Option<u64> {
        match self {
            Self::Known(size) => Some(size),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for ElementSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(size) => write!(f, "{}", size),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// One decoded element header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHeader<Id> {
    /// Number of bytes the header occupies.
    pub bytes_used: usize,
    /// Format-specific element identifier.
    pub id: Id,
    /// Payload size.
    pub size: ElementSize,
}

impl<Id> ElementHeader<Id> {
    /// Header plus payload length, when the payload size is known.
    pub fn whole_size(&self) -> Option<u64> {
        self.size.known().map(|size| self.bytes_used as u64 + size)
    }
}

/// Format-specific behavior driven by [`ElementListParser`](crate::ElementListParser).
///
/// Returning `Err` from any callback aborts the parse; the parser never
/// tries to resynchronize afterwards.
pub trait ParserClient {
    /// Element identifier type.
    type Id: Clone + fmt::Display;

    /// Decode the header at the start of `buf`.
    ///
    /// Returns `Ok(None)` when `buf` ends before the header does.
    fn decode_header(&mut self, buf: &[u8]) -> Result<Option<ElementHeader<Self::Id>>>;

    /// Whether `id` names a list element whose body holds child elements.
    fn is_container(&self, id: &Self::Id) -> bool;

    /// Called after a list header has been parsed.
    ///
    /// `NeedMoreData` accepts the list but stops the current `append` call
    /// right after the header.
    fn on_container_start(
        &mut self,
        id: &Self::Id,
        element_position: u64,
        body_position: u64,
    ) -> Result<ParserStatus>;

    /// Called once every byte of a list has been consumed. `size` counts the
    /// list header too.
    fn on_container_end(&mut self, id: &Self::Id, size: u64) -> Result<()>;

    /// Called with the complete payload of a leaf element.
    fn on_leaf(&mut self, id: &Self::Id, value: &[u8]) -> Result<()>;
}
