//! msetools-parser: incremental element/list parsing for media bytestreams
//!
//! This crate holds the format-agnostic half of the bytestream validators.
//! An [`ElementListParser`] accepts bytes in arbitrarily sized chunks and
//! drives a [`ParserClient`], which supplies the format-specific pieces:
//! header decoding and deciding which elements are lists.
//!
//! # Model
//!
//! Every element is a header (id + payload size) followed by its payload.
//! Leaf payloads are delivered whole. List payloads are a sequence of child
//! elements; the parser keeps a stack of open lists and closes each one when
//! exactly its declared size has been consumed by its children. A child that
//! would run past the end of its parent is an error.
//!
//! The parser never resynchronizes: the first error ends the parse.

pub mod client;
pub mod error;
pub mod parser;

pub use client::{ElementHeader, ElementSize, ParserClient, ParserStatus};
pub use error::{Error, Result};
pub use parser::{ElementListParser, ListEntry};
