//! WebM (EBML) bytestream validation.

pub mod ids;
pub mod value;
pub mod vint;

pub use ids::{ElementId, ElementInfo, ElementType};
pub use value::{ElementValue, ValueError};

use msetools_parser::{ElementHeader, Error, ParserClient, ParserStatus, Result};

use crate::format::ContainerFormat;
use crate::validator::{StreamValidator, ValidatorClient};

/// The WebM container format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Webm;

impl ContainerFormat for Webm {
    type Id = ElementId;

    const NAME: &'static str = "WebM";

    fn decode_header(buf: &[u8]) -> Result<Option<ElementHeader<ElementId>>> {
        vint::decode_header(buf)
    }

    fn is_container(id: &ElementId) -> bool {
        id.is_list()
    }

    fn describe_leaf(id: &ElementId, value: &[u8]) -> Option<String> {
        let element_type = id.element_type()?;
        match ElementValue::decode(element_type, value) {
            Ok(ElementValue::Binary(_)) => None,
            Ok(ElementValue::Uint(raw)) if id.is(ids::id::SEEK_ID) => Some(
                u32::try_from(raw)
                    .map_or_else(|_| raw.to_string(), |raw| ElementId::from_raw(raw).to_string()),
            ),
            Ok(decoded) => Some(decoded.to_string()),
            Err(e) => Some(format!("invalid: {}", e)),
        }
    }
}

/// Parser client for WebM streams.
///
/// Typed leaves (UINT, INT, FLOAT, DATE) must have a payload length legal
/// for their type.
#[derive(Debug, Default)]
pub struct WebmClient {
    elements: u64,
}

impl WebmClient {
    /// Number of elements accepted so far, lists included.
    pub fn element_count(&self) -> u64 {
        self.elements
    }
}

impl ParserClient for WebmClient {
    type Id = ElementId;

    fn decode_header(&mut self, buf: &[u8]) -> Result<Option<ElementHeader<ElementId>>> {
        Webm::decode_header(buf)
    }

    fn is_container(&self, id: &ElementId) -> bool {
        Webm::is_container(id)
    }

    fn on_container_start(
        &mut self,
        id: &ElementId,
        element_position: u64,
        body_position: u64,
    ) -> Result<ParserStatus> {
        tracing::debug!("onListStart({}, {}, {})", id, element_position, body_position);
        self.elements += 1;
        Ok(ParserStatus::Ok)
    }

    fn on_container_end(&mut self, id: &ElementId, size: u64) -> Result<()> {
        tracing::debug!("onListEnd({}, {})", id, size);
        Ok(())
    }

    fn on_leaf(&mut self, id: &ElementId, value: &[u8]) -> Result<()> {
        if let Some(element_type) = id.element_type() {
            ElementValue::decode(element_type, value).map_err(|e| Error::rejected(id, e.to_string()))?;
        }
        tracing::trace!("onBinary({}, {})", id, value.len());
        self.elements += 1;
        Ok(())
    }
}

impl ValidatorClient for WebmClient {}

/// Validator for `video/webm` and `audio/webm` bytestreams.
pub type WebmValidator = StreamValidator<WebmClient>;
