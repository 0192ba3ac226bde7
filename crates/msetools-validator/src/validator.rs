//! Bytestream validator contract and the shared validator driver.

use std::fmt;

use msetools_parser::{ElementListParser, ParserClient, ParserStatus};

/// Error returned by every `parse` call once a validator has failed.
pub const PREVIOUS_PARSER_ERROR: &str = "Previously encountered a parser error.";

/// MIME type information for a bytestream, e.g. `video/webm; codecs="vp8"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeInfo {
    /// Top-level type (`video`, `audio`).
    pub major: String,
    /// Subtype (`webm`, `mp4`).
    pub minor: String,
    /// Codec strings from the `codecs` parameter.
    pub codecs: Vec<String>,
}

impl TypeInfo {
    pub fn new(major: impl Into<String>, minor: impl Into<String>) -> Self {
        Self {
            major: major.into(),
            minor: minor.into(),
            codecs: Vec::new(),
        }
    }

    /// Add codec strings.
    pub fn with_codecs<I, S>(mut self, codecs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.codecs.extend(codecs.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.major, self.minor)?;
        if !self.codecs.is_empty() {
            write!(f, "; codecs=\"{}\"", self.codecs.join(", "))?;
        }
        Ok(())
    }
}

/// Validates bytes as they are appended to a media stream.
///
/// Calls must be serialized; a validator holds the state of exactly one
/// stream.
pub trait ByteStreamValidator {
    /// Prepare for a stream of the given type.
    fn init(&mut self, type_info: &TypeInfo);

    /// Parse newly appended bytes, returning the errors found in them.
    fn parse(&mut self, data: &[u8]) -> Vec<String>;

    /// Forget all stream state, including a previous failure.
    fn reset(&mut self);

    /// Signal that no more bytes will arrive, returning truncation errors.
    fn end_of_stream(&mut self) -> Vec<String>;
}

/// Format-specific half of a [`StreamValidator`].
pub trait ValidatorClient: ParserClient + Default {
    /// Called from [`ByteStreamValidator::init`].
    fn init(&mut self, _type_info: &TypeInfo) {}
}

/// Drives an [`ElementListParser`] with a format client and turns parse
/// failures into error strings.
///
/// The first failure poisons the validator: every later `parse` returns
/// [`PREVIOUS_PARSER_ERROR`] without looking at the data, until `reset`.
pub struct StreamValidator<C: ValidatorClient> {
    parser: ElementListParser<C::Id>,
    client: C,
    type_info: Option<TypeInfo>,
    parser_error: bool,
}

impl<C: ValidatorClient> Default for StreamValidator<C> {
    fn default() -> Self {
        Self {
            parser: ElementListParser::new(),
            client: C::default(),
            type_info: None,
            parser_error: false,
        }
    }
}

impl<C: ValidatorClient> StreamValidator<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The format client, for inspecting what it has decoded.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Type information passed to `init`, if any.
    pub fn type_info(&self) -> Option<&TypeInfo> {
        self.type_info.as_ref()
    }

    /// Whether a parse error has been seen since the last reset.
    pub fn has_failed(&self) -> bool {
        self.parser_error
    }

    /// Absolute offset of the next byte to be parsed.
    pub fn position(&self) -> u64 {
        self.parser.position()
    }
}

impl<C: ValidatorClient> ByteStreamValidator for StreamValidator<C> {
    fn init(&mut self, type_info: &TypeInfo) {
        tracing::debug!(type_info = %type_info, "validator init");
        self.client.init(type_info);
        self.type_info = Some(type_info.clone());
    }

    fn parse(&mut self, data: &[u8]) -> Vec<String> {
        if self.parser_error {
            return vec![PREVIOUS_PARSER_ERROR.to_string()];
        }

        match self.parser.append(&mut self.client, data) {
            Ok(ParserStatus::Ok) => {
                tracing::trace!(len = data.len(), "append complete");
                Vec::new()
            }
            Ok(ParserStatus::NeedMoreData) => {
                tracing::trace!(
                    len = data.len(),
                    pending = self.parser.pending_bytes(),
                    depth = self.parser.depth(),
                    "append needs more data"
                );
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(position = self.parser.position(), "parse error: {}", e);
                self.parser_error = true;
                vec![e.to_string()]
            }
        }
    }

    fn reset(&mut self) {
        tracing::debug!("validator reset");
        self.parser.reset(0);
        self.client = C::default();
        if let Some(type_info) = &self.type_info {
            self.client.init(type_info);
        }
        self.parser_error = false;
    }

    fn end_of_stream(&mut self) -> Vec<String> {
        if self.parser_error {
            return vec![PREVIOUS_PARSER_ERROR.to_string()];
        }

        let mut errors: Vec<String> = self
            .parser
            .open_lists()
            .iter()
            .rev()
            .map(|list| {
                format!(
                    "Stream ended inside {} (offset {}) with {} bytes of its body unparsed",
                    list.id, list.start_position, list.bytes_left
                )
            })
            .collect();

        let pending = self.parser.pending_bytes();
        if pending > 0 {
            errors.push(format!(
                "Stream ended with {} bytes of an incomplete element at offset {}",
                pending,
                self.parser.position()
            ));
        }

        for error in &errors {
            tracing::warn!("end of stream: {}", error);
        }
        errors
    }
}
