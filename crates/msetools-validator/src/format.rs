//! Stateless container format descriptions.

use std::fmt;

use msetools_parser::{ElementHeader, Result};

/// Header decoding and element classification for one container format.
///
/// Validators, dumps and indexers all build their parser clients on top of
/// the same implementation, so they agree on what a stream contains.
pub trait ContainerFormat {
    /// Element identifier type.
    type Id: Clone + fmt::Display;

    /// Human readable format name.
    const NAME: &'static str;

    /// Decode the element header at the start of `buf`.
    ///
    /// Returns `Ok(None)` when `buf` ends before the header does.
    fn decode_header(buf: &[u8]) -> Result<Option<ElementHeader<Self::Id>>>;

    /// Whether `id` is a list whose body holds child elements.
    fn is_container(id: &Self::Id) -> bool;

    /// Short description of a leaf payload for display, or `None` when the
    /// payload is opaque.
    fn describe_leaf(id: &Self::Id, value: &[u8]) -> Option<String>;
}
