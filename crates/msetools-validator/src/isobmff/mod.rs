//! ISO-BMFF (fragmented MP4) bytestream validation.

pub mod fragment;

pub use fragment::{
    FullBoxHeader, SampleDefaults, SampleFlags, TrackFragmentHeader, TrackRun, TrunSample,
};

use std::fmt;

use msetools_parser::{ElementHeader, ElementSize, Error, ParserClient, ParserStatus, Result};

use crate::format::ContainerFormat;
use crate::validator::{StreamValidator, ValidatorClient};

/// Box header length: 32-bit size plus four-character type.
pub const BOX_HEADER_SIZE: usize = 8;

/// Four-character box type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoxType(pub [u8; 4]);

impl BoxType {
    pub const FTYP: Self = Self(*b"ftyp");
    pub const MOOV: Self = Self(*b"moov");
    pub const MOOF: Self = Self(*b"moof");
    pub const MDAT: Self = Self(*b"mdat");
    pub const TRAK: Self = Self(*b"trak");
    pub const MDIA: Self = Self(*b"mdia");
    pub const MINF: Self = Self(*b"minf");
    pub const STBL: Self = Self(*b"stbl");
    pub const TRAF: Self = Self(*b"traf");
    pub const TFHD: Self = Self(*b"tfhd");
    pub const TRUN: Self = Self(*b"trun");
    pub const UUID: Self = Self(*b"uuid");

    /// The type code as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// Whether boxes of this type hold child boxes.
    pub fn is_container(&self) -> bool {
        matches!(
            *self,
            Self::MOOV | Self::MOOF | Self::TRAF | Self::TRAK | Self::MDIA | Self::MINF | Self::STBL
        )
    }

    /// Whether this box is parsed as a full box.
    pub fn is_full_box(&self) -> bool {
        matches!(*self, Self::TFHD | Self::TRUN)
    }
}

impl fmt::Display for BoxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.0 {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{:02x}", byte)?;
            }
        }
        Ok(())
    }
}

/// The ISO base media file format.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsoBmff;

impl ContainerFormat for IsoBmff {
    type Id = BoxType;

    const NAME: &'static str = "ISO-BMFF";

    fn decode_header(buf: &[u8]) -> Result<Option<ElementHeader<BoxType>>> {
        if buf.len() < BOX_HEADER_SIZE {
            return Ok(None);
        }

        let size = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if size == 0 {
            return Err(Error::unsupported("Box size of 0 not allowed"));
        }
        if size == 1 {
            return Err(Error::unsupported("64-bit box sizes not supported"));
        }

        let box_type = BoxType([buf[4], buf[5], buf[6], buf[7]]);
        if box_type == BoxType::UUID {
            return Err(Error::unsupported("uuid boxes not supported"));
        }

        if (size as usize) < BOX_HEADER_SIZE {
            return Err(Error::invalid_header(format!("Invalid box size {}", size)));
        }

        Ok(Some(ElementHeader {
            bytes_used: BOX_HEADER_SIZE,
            id: box_type,
            size: ElementSize::Known(size as u64 - BOX_HEADER_SIZE as u64),
        }))
    }

    fn is_container(id: &BoxType) -> bool {
        id.is_container()
    }

    fn describe_leaf(id: &BoxType, value: &[u8]) -> Option<String> {
        if !id.is_full_box() {
            return None;
        }
        let described = FullBoxHeader::parse(*id, value).and_then(|(header, body)| {
            Ok(match *id {
                BoxType::TFHD => TrackFragmentHeader::parse(header, body)?.to_string(),
                _ => {
                    let run = TrackRun::parse(header, body, SampleDefaults::default())?;
                    format!("{} samples", run.sample_count)
                }
            })
        });
        Some(described.unwrap_or_else(|e| format!("invalid: {}", e)))
    }
}

/// Parser client for ISO-BMFF streams.
///
/// Holds the sample defaults of the most recent `tfhd` so that the `trun`
/// boxes of the same track fragment resolve against them. Defaults are
/// cleared when a new `traf` starts.
#[derive(Debug, Default)]
pub struct IsoBmffClient {
    defaults: SampleDefaults,
    last_tfhd: Option<TrackFragmentHeader>,
    last_trun: Option<TrackRun>,
    samples: u64,
}

impl IsoBmffClient {
    /// Defaults currently applied to `trun` boxes.
    pub fn defaults(&self) -> SampleDefaults {
        self.defaults
    }

    /// The most recent `tfhd`.
    pub fn last_tfhd(&self) -> Option<&TrackFragmentHeader> {
        self.last_tfhd.as_ref()
    }

    /// The most recent `trun`.
    pub fn last_trun(&self) -> Option<&TrackRun> {
        self.last_trun.as_ref()
    }

    /// Total samples declared by every `trun` so far.
    pub fn sample_count(&self) -> u64 {
        self.samples
    }

    fn on_full_box(&mut self, id: BoxType, value: &[u8]) -> Result<()> {
        let (header, body) = FullBoxHeader::parse(id, value)?;
        tracing::debug!(
            "onFullBox({}, {}, 0x{:x}, {})",
            id,
            header.version,
            header.flags,
            body.len()
        );

        match id {
            BoxType::TFHD => {
                let tfhd = TrackFragmentHeader::parse(header, body)?;
                tracing::debug!("tfhd : {}", tfhd);
                self.defaults = tfhd.defaults();
                self.last_tfhd = Some(tfhd);
            }
            BoxType::TRUN => {
                let run = TrackRun::parse(header, body, self.defaults)?;
                tracing::debug!(
                    "trun.sample_count {} data_offset {:?} first_sample_flags {:?}",
                    run.sample_count,
                    run.data_offset,
                    run.first_sample_flags.map(|flags| flags.to_string())
                );
                if tracing::enabled!(tracing::Level::TRACE) {
                    trace_samples(&run);
                }
                self.samples += run.sample_count as u64;
                self.last_trun = Some(run);
            }
            _ => {}
        }
        Ok(())
    }
}

/// Per-sample trace lines logged for one `trun`.
const MAX_TRACED_SAMPLES: usize = 64;

/// Log the first samples of `run`, returning how many were logged.
fn trace_samples(run: &TrackRun) -> usize {
    let mut traced = 0;
    for sample in run.samples().take(MAX_TRACED_SAMPLES) {
        tracing::trace!("trun : {}", sample);
        traced += 1;
    }
    let skipped = run.sample_count as u64 - traced as u64;
    if skipped > 0 {
        tracing::trace!("trun : {} more samples not shown", skipped);
    }
    traced
}

impl ParserClient for IsoBmffClient {
    type Id = BoxType;

    fn decode_header(&mut self, buf: &[u8]) -> Result<Option<ElementHeader<BoxType>>> {
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
    ) -> Result<ParserStatus> {
        tracing::debug!("onListStart({}, {}, {})", id, element_position, body_position);
        if *id == BoxType::TRAF {
            self.defaults = SampleDefaults::default();
        }
        Ok(ParserStatus::Ok)
    }

    fn on_container_end(&mut self, id: &BoxType, size: u64) -> Result<()> {
        tracing::debug!("onListEnd({}, {})", id, size);
        Ok(())
    }

    fn on_leaf(&mut self, id: &BoxType, value: &[u8]) -> Result<()> {
        if id.is_full_box() {
            return self.on_full_box(*id, value);
        }
        tracing::trace!("onBinary({}, {})", id, value.len());
        Ok(())
    }
}

impl ValidatorClient for IsoBmffClient {}

/// Validator for `video/mp4` and `audio/mp4` bytestreams.
pub type IsoBmffValidator = StreamValidator<IsoBmffClient>;
