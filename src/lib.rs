//! msetools - Media Source Extensions bytestream tooling
//!
//! This library crate wires the validators into sessions, dumps and
//! segment indexes, and exposes them for integration testing.

pub mod config;
pub mod detect;
pub mod dump;
pub mod mime;
pub mod segment_index;
pub mod session;
pub mod stream;
