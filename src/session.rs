//! Media source sessions.
//!
//! A [`MediaSourceSession`] stands in for a media source object: it owns
//! one [`SourceBufferSession`] per added source buffer and routes appended
//! bytes through the validator chosen for the buffer's MIME type.

use msetools_validator::{new_validator, ByteStreamValidator, TypeInfo};
use thiserror::Error;

use crate::mime::{parse_mime_type, MimeError};

/// Errors from session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Invalid MIME type: {0}")]
    Mime(#[from] MimeError),

    #[error("No validator for type '{0}'")]
    UnsupportedType(String),

    #[error("Unknown source buffer '{0}'")]
    UnknownSourceBuffer(String),

    #[error("endOfStream() called in unexpected readyState '{0}'")]
    InvalidState(ReadyState),
}

/// Ready state of a media source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Open,
    Ended,
}

impl std::fmt::Display for ReadyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadyState::Open => write!(f, "open"),
            ReadyState::Ended => write!(f, "ended"),
        }
    }
}

/// Reason passed to [`MediaSourceSession::end_of_stream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfStreamError {
    Network,
    Decode,
}

/// One source buffer and the validator watching its appends.
pub struct SourceBufferSession {
    id: String,
    type_info: TypeInfo,
    validator: Box<dyn ByteStreamValidator>,
    errors: Vec<String>,
    bytes_appended: u64,
}

impl std::fmt::Debug for SourceBufferSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceBufferSession")
            .field("id", &self.id)
            .field("type_info", &self.type_info)
            .field("errors", &self.errors.len())
            .field("bytes_appended", &self.bytes_appended)
            .finish()
    }
}

impl SourceBufferSession {
    fn new(id: String, type_info: TypeInfo) -> Result<Self, SessionError> {
        let validator = new_validator(&type_info)
            .ok_or_else(|| SessionError::UnsupportedType(type_info.to_string()))?;
        tracing::info!("{}: new SourceBuffer({})", id, type_info);
        Ok(Self {
            id,
            type_info,
            validator,
            errors: Vec::new(),
            bytes_appended: 0,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// Every error reported for this buffer, oldest first.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn bytes_appended(&self) -> u64 {
        self.bytes_appended
    }

    /// Validate appended bytes, returning the errors they produced.
    pub fn append(&mut self, data: &[u8]) -> Vec<String> {
        tracing::debug!("{}: SourceBuffer.append({})", self.id, data.len());
        self.bytes_appended += data.len() as u64;
        let errors = self.validator.parse(data);
        self.record(&errors);
        errors
    }

    /// Drop any partially appended segment and start over.
    pub fn abort(&mut self) {
        tracing::debug!("{}: SourceBuffer.abort()", self.id);
        self.validator.reset();
    }

    fn end_of_stream(&mut self) -> Vec<String> {
        let errors = self.validator.end_of_stream();
        self.record(&errors);
        errors
    }

    fn record(&mut self, errors: &[String]) {
        for error in errors {
            tracing::warn!("{}: {}", self.id, error);
        }
        self.errors.extend_from_slice(errors);
    }
}

/// A media source with its source buffers.
#[derive(Debug)]
pub struct MediaSourceSession {
    id: String,
    source_buffers: Vec<SourceBufferSession>,
    next_source_buffer_id: u32,
    ready_state: ReadyState,
}

impl MediaSourceSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_buffers: Vec::new(),
            next_source_buffer_id: 0,
            ready_state: ReadyState::Open,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    /// Add a source buffer for `mime`, returning its id.
    pub fn add_source_buffer(&mut self, mime: &str) -> Result<String, SessionError> {
        tracing::debug!("{}: MediaSource.addSourceBuffer({})", self.id, mime);
        let type_info = parse_mime_type(mime)?;
        let id = format!("{}-{}", self.id, self.next_source_buffer_id);
        let buffer = SourceBufferSession::new(id.clone(), type_info)?;
        self.source_buffers.push(buffer);
        self.next_source_buffer_id += 1;
        Ok(id)
    }

    /// Remove a source buffer. Unknown ids are ignored.
    pub fn remove_source_buffer(&mut self, id: &str) -> bool {
        tracing::debug!("{}: MediaSource.removeSourceBuffer({})", self.id, id);
        let before = self.source_buffers.len();
        self.source_buffers.retain(|buffer| buffer.id != id);
        self.source_buffers.len() != before
    }

    pub fn source_buffers(&self) -> &[SourceBufferSession] {
        &self.source_buffers
    }

    pub fn source_buffer(&self, id: &str) -> Option<&SourceBufferSession> {
        self.source_buffers.iter().find(|buffer| buffer.id == id)
    }

    pub fn source_buffer_mut(&mut self, id: &str) -> Option<&mut SourceBufferSession> {
        self.source_buffers.iter_mut().find(|buffer| buffer.id == id)
    }

    /// Append to the source buffer `id`. Appending reopens an ended source.
    pub fn append(&mut self, id: &str, data: &[u8]) -> Result<Vec<String>, SessionError> {
        self.ready_state = ReadyState::Open;
        let buffer = self
            .source_buffer_mut(id)
            .ok_or_else(|| SessionError::UnknownSourceBuffer(id.to_string()))?;
        Ok(buffer.append(data))
    }

    /// Abort the source buffer `id`.
    pub fn abort(&mut self, id: &str) -> Result<(), SessionError> {
        let buffer = self
            .source_buffer_mut(id)
            .ok_or_else(|| SessionError::UnknownSourceBuffer(id.to_string()))?;
        buffer.abort();
        Ok(())
    }

    /// Mark the stream ended and collect per-buffer truncation errors.
    ///
    /// With an error reason the stream is known to be cut short, so buffers
    /// are not checked for truncation.
    pub fn end_of_stream(
        &mut self,
        error: Option<EndOfStreamError>,
    ) -> Result<Vec<(String, Vec<String>)>, SessionError> {
        tracing::debug!("{}: MediaSource.endOfStream({:?})", self.id, error);
        if self.ready_state != ReadyState::Open {
            return Err(SessionError::InvalidState(self.ready_state));
        }
        self.ready_state = ReadyState::Ended;

        if error.is_some() {
            return Ok(Vec::new());
        }
        Ok(self
            .source_buffers
            .iter_mut()
            .map(|buffer| (buffer.id.clone(), buffer.end_of_stream()))
            .filter(|(_, errors)| !errors.is_empty())
            .collect())
    }
}
