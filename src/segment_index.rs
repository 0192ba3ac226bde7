//! Init and media segment byte ranges for a complete stream.
//!
//! The index is what a player needs to fetch a stream piecewise: the byte
//! range of the initialization segment, then one range per media segment.
//! WebM media segments are clusters; ISO-BMFF media segments run from a
//! `moof` through the end of the `mdat` that follows it.

use std::io::Read;

use anyhow::Result;
use chrono::{DateTime, Utc};
use msetools_parser::{ElementHeader, Error, ParserClient, ParserStatus};
use msetools_validator::isobmff::{BoxType, BOX_HEADER_SIZE};
use msetools_validator::webm::ids::id as ebml_id;
use msetools_validator::webm::{ElementId, ElementType, ElementValue};
use msetools_validator::{ContainerFormat, IsoBmff, TypeInfo, Webm};
use serde::{Deserialize, Serialize};

use crate::detect::Container;
use crate::stream::parse_reader;

/// TimecodeScale used when a stream does not declare one.
const DEFAULT_TIMECODE_SCALE: u64 = 1_000_000;

/// A byte range within the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub offset: u64,
    pub size: u64,
}

/// One independently appendable media segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSegment {
    pub offset: u64,
    pub size: u64,
    /// Start time in seconds, when the container records one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timecode: Option<f64>,
}

/// Segment layout of a stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentIndex {
    /// MIME type with codecs, when the codecs are recognized.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Duration in seconds. Absent for live streams.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Set by [`build_index`] when no duration was found.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub live: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<ByteRange>,

    #[serde(default)]
    pub media: Vec<MediaSegment>,
}

impl SegmentIndex {
    /// A stream without a declared duration is live.
    pub fn is_live(&self) -> bool {
        self.duration.is_none()
    }
}

/// Build the index of a complete stream.
pub fn build_index<R: Read>(container: Container, reader: R, chunk_size: usize) -> Result<SegmentIndex> {
    let mut index = match container {
        Container::Webm => {
            let mut client = WebmIndexClient::default();
            parse_reader(&mut client, reader, chunk_size, |_| Ok(()))?;
            client.index
        }
        Container::IsoBmff => {
            let mut client = IsoBmffIndexClient::default();
            parse_reader(&mut client, reader, chunk_size, |_| Ok(()))?;
            client.index
        }
    };
    index.live = index.is_live();
    tracing::debug!(
        %container,
        media_segments = index.media.len(),
        "segment index built"
    );
    Ok(index)
}

/// Collects WebM segment boundaries.
#[derive(Debug, Default)]
pub struct WebmIndexClient {
    index: SegmentIndex,
    header_offset: Option<u64>,
    timecode_scale: Option<u64>,
    raw_duration: Option<f64>,
    cluster_offset: u64,
    cluster_timecode: u64,
    video_codec: Option<&'static str>,
    audio_codec: Option<&'static str>,
}

impl WebmIndexClient {
    /// The index collected so far.
    pub fn index(&self) -> &SegmentIndex {
        &self.index
    }

    fn seconds(&self, ticks: f64) -> f64 {
        ticks * self.timecode_scale.unwrap_or(DEFAULT_TIMECODE_SCALE) as f64 / 1e9
    }

    fn content_type(&self) -> Option<String> {
        let major = match (self.video_codec, self.audio_codec) {
            (None, None) => return None,
            (Some(_), _) => "video",
            (None, Some(_)) => "audio",
        };
        let codecs = self.video_codec.into_iter().chain(self.audio_codec);
        Some(TypeInfo::new(major, "webm").with_codecs(codecs).to_string())
    }
}

impl ParserClient for WebmIndexClient {
    type Id = ElementId;

    fn decode_header(&mut self, buf: &[u8]) -> msetools_parser::Result<Option<ElementHeader<ElementId>>> {
        Webm::decode_header(buf)
    }

    fn is_container(&self, id: &ElementId) -> bool {
        Webm::is_container(id)
    }

    fn on_container_start(
        &mut self,
        id: &ElementId,
        element_position: u64,
        _body_position: u64,
    ) -> msetools_parser::Result<ParserStatus> {
        if id.is(ebml_id::EBML_HEADER) {
            if self.header_offset.is_some() {
                return Err(Error::rejected(id, "Multiple EBML headers are not supported"));
            }
            self.header_offset = Some(element_position);
            self.video_codec = None;
            self.audio_codec = None;
        } else if id.is(ebml_id::CLUSTER) {
            if self.index.init.is_none() {
                let offset = self
                    .header_offset
                    .ok_or_else(|| Error::rejected(id, "Cluster before the EBML header"))?;
                self.index.init = Some(ByteRange {
                    offset,
                    size: element_position - offset,
                });
            }
            self.cluster_offset = element_position;
            self.cluster_timecode = 0;
        }
        Ok(ParserStatus::Ok)
    }

    fn on_container_end(&mut self, id: &ElementId, size: u64) -> msetools_parser::Result<()> {
        if id.is(ebml_id::INFO) {
            self.index.duration = self.raw_duration.map(|ticks| self.seconds(ticks));
        } else if id.is(ebml_id::TRACKS) {
            self.index.content_type = self.content_type();
        } else if id.is(ebml_id::CLUSTER) {
            self.index.media.push(MediaSegment {
                offset: self.cluster_offset,
                size,
                timecode: Some(self.seconds(self.cluster_timecode as f64)),
            });
        }
        Ok(())
    }

    fn on_leaf(&mut self, id: &ElementId, value: &[u8]) -> msetools_parser::Result<()> {
        let Some(raw) = id.raw() else {
            return Ok(());
        };
        let element_type = match raw {
            ebml_id::TIMECODE_SCALE | ebml_id::TIMECODE => ElementType::Uint,
            ebml_id::DURATION => ElementType::Float,
            ebml_id::DATE_UTC => ElementType::Date,
            ebml_id::CODEC_ID => ElementType::String,
            _ => return Ok(()),
        };
        let decoded =
            ElementValue::decode(element_type, value).map_err(|e| Error::rejected(id, e.to_string()))?;

        match raw {
            ebml_id::TIMECODE_SCALE => self.timecode_scale = decoded.as_uint(),
            ebml_id::TIMECODE => self.cluster_timecode = decoded.as_uint().unwrap_or(0),
            ebml_id::DURATION => self.raw_duration = decoded.as_float(),
            ebml_id::DATE_UTC => {
                if let ElementValue::Date(date) = decoded {
                    self.index.start_date = Some(date);
                }
            }
            _ => match decoded.as_str() {
                Some("V_VP8") => self.video_codec = Some("vp8"),
                Some("V_VP9") => self.video_codec = Some("vp9"),
                Some("A_VORBIS") => self.audio_codec = Some("vorbis"),
                Some("A_OPUS") => self.audio_codec = Some("opus"),
                other => tracing::debug!("unrecognized CodecID {:?}", other),
            },
        }
        Ok(())
    }
}

/// Collects ISO-BMFF segment boundaries and enforces top-level box order.
#[derive(Debug, Default)]
pub struct IsoBmffIndexClient {
    index: SegmentIndex,
    /// Offset just past the last header or leaf consumed.
    cursor: u64,
    found_init: bool,
    media_offset: Option<u64>,
}

impl IsoBmffIndexClient {
    /// The index collected so far.
    pub fn index(&self) -> &SegmentIndex {
        &self.index
    }

    fn check_order(&mut self, id: &BoxType, offset: u64) -> msetools_parser::Result<()> {
        if offset == 0 && *id != BoxType::FTYP {
            return Err(Error::rejected(id, "File must start with a 'ftyp' box"));
        }
        match *id {
            BoxType::MOOV if self.found_init => {
                Err(Error::rejected(id, "Multiple 'moov' boxes are not supported"))
            }
            BoxType::MOOF if !self.found_init => {
                Err(Error::rejected(id, "'moof' boxes must come after the 'moov' box"))
            }
            BoxType::MOOF => {
                self.media_offset = Some(offset);
                Ok(())
            }
            BoxType::MDAT if self.media_offset.is_none() => {
                Err(Error::rejected(id, "'mdat' boxes must come after a 'moof' box"))
            }
            _ => Ok(()),
        }
    }
}

impl ParserClient for IsoBmffIndexClient {
    type Id = BoxType;

    fn decode_header(&mut self, buf: &[u8]) -> msetools_parser::Result<Option<ElementHeader<BoxType>>> {
        IsoBmff::decode_header(buf)
    }

    fn is_container(&self, id: &BoxType) -> bool {
        IsoBmff::is_container(id)
    }

    fn on_container_start(
        &mut self,
        id: &BoxType,
        element_position: u64,
        body_position: u64,
    ) -> msetools_parser::Result<ParserStatus> {
        self.check_order(id, element_position)?;
        self.cursor = body_position;
        Ok(ParserStatus::Ok)
    }

    fn on_container_end(&mut self, id: &BoxType, _size: u64) -> msetools_parser::Result<()> {
        // Children fill the list exactly, so the cursor is at its end.
        if *id == BoxType::MOOV {
            self.found_init = true;
            self.index.init = Some(ByteRange {
                offset: 0,
                size: self.cursor,
            });
        }
        Ok(())
    }

    fn on_leaf(&mut self, id: &BoxType, value: &[u8]) -> msetools_parser::Result<()> {
        let offset = self.cursor;
        self.cursor += (BOX_HEADER_SIZE + value.len()) as u64;
        self.check_order(id, offset)?;

        if *id == BoxType::MDAT {
            if let Some(media_offset) = self.media_offset.take() {
                self.index.media.push(MediaSegment {
                    offset: media_offset,
                    size: self.cursor - media_offset,
                    timecode: None,
                });
            }
        }
        Ok(())
    }
}
