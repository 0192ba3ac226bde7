//! Track fragment boxes: `tfhd` and `trun`.
//!
//! Both are full boxes, so their payload starts with a version byte and 24
//! bits of flags that select which optional fields follow.

use std::fmt;

use bytes::Buf;
use msetools_parser::{Error, Result};

use super::BoxType;

/// `tfhd` flag bits.
pub mod tfhd_flags {
    pub const BASE_DATA_OFFSET: u32 = 0x00_0001;
    pub const SAMPLE_DESCRIPTION_INDEX: u32 = 0x00_0002;
    pub const DEFAULT_SAMPLE_DURATION: u32 = 0x00_0008;
    pub const DEFAULT_SAMPLE_SIZE: u32 = 0x00_0010;
    pub const DEFAULT_SAMPLE_FLAGS: u32 = 0x00_0020;
    pub const DURATION_IS_EMPTY: u32 = 0x01_0000;
    pub const DEFAULT_BASE_IS_MOOF: u32 = 0x02_0000;
}

/// `trun` flag bits.
pub mod trun_flags {
    pub const DATA_OFFSET: u32 = 0x00_0001;
    pub const FIRST_SAMPLE_FLAGS: u32 = 0x00_0004;
    pub const SAMPLE_DURATION: u32 = 0x00_0100;
    pub const SAMPLE_SIZE: u32 = 0x00_0200;
    pub const SAMPLE_FLAGS: u32 = 0x00_0400;
    pub const SAMPLE_COMPOSITION_TIME_OFFSET: u32 = 0x00_0800;
}

/// Version and flags at the start of a full box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullBoxHeader {
    pub version: u8,
    pub flags: u32,
}

impl FullBoxHeader {
    /// Split a full box payload into its header and body.
    pub fn parse(box_type: BoxType, payload: &[u8]) -> Result<(Self, &[u8])> {
        let mut buf = payload;
        if buf.remaining() < 4 {
            return Err(Error::rejected(box_type, "Invalid FullBox"));
        }
        let word = buf.get_u32();
        let header = Self {
            version: (word >> 24) as u8,
            flags: word & 0x00FF_FFFF,
        };
        Ok((header, buf))
    }

    fn has(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}

fn read_u32(buf: &mut &[u8], box_type: BoxType, field: &str) -> Result<u32> {
    if buf.remaining() < 4 {
        return Err(truncated(box_type, field));
    }
    Ok(buf.get_u32())
}

fn read_u64(buf: &mut &[u8], box_type: BoxType, field: &str) -> Result<u64> {
    if buf.remaining() < 8 {
        return Err(truncated(box_type, field));
    }
    Ok(buf.get_u64())
}

fn truncated(box_type: BoxType, field: &str) -> Error {
    Error::rejected(box_type, format!("box ends before {}", field))
}

/// Per-sample fields as laid out in `sample_flags`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleFlags(pub u32);

impl SampleFlags {
    pub fn depends_on(self) -> u32 {
        (self.0 >> 24) & 0x3
    }

    pub fn is_depended_on(self) -> u32 {
        (self.0 >> 22) & 0x3
    }

    pub fn has_redundancy(self) -> u32 {
        (self.0 >> 20) & 0x3
    }

    pub fn padding(self) -> u32 {
        (self.0 >> 17) & 0x7
    }

    pub fn is_non_sync(self) -> bool {
        (self.0 >> 16) & 0x1 != 0
    }

    pub fn degradation_priority(self) -> u32 {
        self.0 & 0xFFFF
    }
}

impl fmt::Display for SampleFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ DO{} IDO{} HR{} P{} D{} PR{} ]",
            self.depends_on(),
            self.is_depended_on(),
            self.has_redundancy(),
            self.padding(),
            self.is_non_sync() as u8,
            self.degradation_priority()
        )
    }
}

/// Sample defaults carried from a `tfhd` to the `trun` boxes after it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleDefaults {
    pub duration: Option<u32>,
    pub size: Option<u32>,
    pub flags: SampleFlags,
}

/// Decoded `tfhd` box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackFragmentHeader {
    pub version: u8,
    pub flags: u32,
    pub track_id: u32,
    pub base_data_offset: Option<u64>,
    pub sample_description_index: Option<u32>,
    pub default_sample_duration: Option<u32>,
    pub default_sample_size: Option<u32>,
    pub default_sample_flags: Option<u32>,
}

impl TrackFragmentHeader {
    /// Parse the body of a `tfhd` that follows its full box header.
    pub fn parse(header: FullBoxHeader, body: &[u8]) -> Result<Self> {
        use tfhd_flags::*;

        let tag = BoxType::TFHD;
        let mut buf = body;
        let track_id = read_u32(&mut buf, tag, "track_ID")?;

        let base_data_offset = if header.has(BASE_DATA_OFFSET) {
            Some(read_u64(&mut buf, tag, "base_data_offset")?)
        } else {
            None
        };
        let sample_description_index = if header.has(SAMPLE_DESCRIPTION_INDEX) {
            Some(read_u32(&mut buf, tag, "sample_description_index")?)
        } else {
            None
        };
        let default_sample_duration = if header.has(DEFAULT_SAMPLE_DURATION) {
            Some(read_u32(&mut buf, tag, "default_sample_duration")?)
        } else {
            None
        };
        let default_sample_size = if header.has(DEFAULT_SAMPLE_SIZE) {
            Some(read_u32(&mut buf, tag, "default_sample_size")?)
        } else {
            None
        };
        let default_sample_flags = if header.has(DEFAULT_SAMPLE_FLAGS) {
            Some(read_u32(&mut buf, tag, "default_sample_flags")?)
        } else {
            None
        };

        Ok(Self {
            version: header.version,
            flags: header.flags,
            track_id,
            base_data_offset,
            sample_description_index,
            default_sample_duration,
            default_sample_size,
            default_sample_flags,
        })
    }

    pub fn duration_is_empty(&self) -> bool {
        self.flags & tfhd_flags::DURATION_IS_EMPTY != 0
    }

    pub fn default_base_is_moof(&self) -> bool {
        self.flags & tfhd_flags::DEFAULT_BASE_IS_MOOF != 0
    }

    /// Defaults for the runs in this track fragment. Absent fields are
    /// cleared rather than inherited.
    pub fn defaults(&self) -> SampleDefaults {
        SampleDefaults {
            duration: self.default_sample_duration,
            size: self.default_sample_size,
            flags: SampleFlags(self.default_sample_flags.unwrap_or(0)),
        }
    }
}

impl fmt::Display for TrackFragmentHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let defaults = self.defaults();
        write!(
            f,
            "track {} base_offset {} index {} duration {} size {} flags {}",
            self.track_id,
            OptField(self.base_data_offset),
            OptField(self.sample_description_index),
            OptField(defaults.duration),
            OptField(defaults.size),
            defaults.flags
        )
    }
}

/// Displays `-` for an absent field.
struct OptField<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for OptField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => write!(f, "{}", v),
            None => write!(f, "-"),
        }
    }
}

/// One sample of a `trun`, with `tfhd` defaults applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrunSample {
    pub duration: Option<u32>,
    pub size: Option<u32>,
    pub flags: SampleFlags,
    pub composition_time_offset: Option<i64>,
}

impl fmt::Display for TrunSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            OptField(self.duration),
            OptField(self.size),
            self.flags,
            OptField(self.composition_time_offset)
        )
    }
}

/// Decoded `trun` box.
///
/// The per-sample table is validated against `sample_count` up front and
/// decoded on demand by [`TrackRun::samples`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRun {
    pub version: u8,
    pub flags: u32,
    pub sample_count: u32,
    pub data_offset: Option<i32>,
    pub first_sample_flags: Option<SampleFlags>,
    defaults: SampleDefaults,
    table: Vec<u8>,
}

impl TrackRun {
    /// Parse the body of a `trun` that follows its full box header,
    /// resolving absent per-sample fields from `defaults`.
    pub fn parse(header: FullBoxHeader, body: &[u8], defaults: SampleDefaults) -> Result<Self> {
        use trun_flags::*;

        let tag = BoxType::TRUN;
        let mut buf = body;
        let sample_count = read_u32(&mut buf, tag, "sample_count")?;

        let data_offset = if header.has(DATA_OFFSET) {
            Some(read_u32(&mut buf, tag, "data_offset")? as i32)
        } else {
            None
        };
        let first_sample_flags = if header.has(FIRST_SAMPLE_FLAGS) {
            Some(SampleFlags(read_u32(&mut buf, tag, "first_sample_flags")?))
        } else {
            None
        };

        let stride = Self::stride_for(header.flags) as u64;
        let needed = (sample_count as u64) * stride;
        if needed > buf.remaining() as u64 {
            return Err(Error::rejected(
                tag,
                format!(
                    "{} samples need {} bytes but only {} remain",
                    sample_count,
                    needed,
                    buf.remaining()
                ),
            ));
        }
        // Bounded by the remaining payload above.
        let table = buf[..needed as usize].to_vec();

        Ok(Self {
            version: header.version,
            flags: header.flags,
            sample_count,
            data_offset,
            first_sample_flags,
            defaults,
            table,
        })
    }

    /// Bytes per sample record for the given flags.
    fn stride_for(flags: u32) -> usize {
        [
            trun_flags::SAMPLE_DURATION,
            trun_flags::SAMPLE_SIZE,
            trun_flags::SAMPLE_FLAGS,
            trun_flags::SAMPLE_COMPOSITION_TIME_OFFSET,
        ]
        .iter()
        .filter(|&&flag| flags & flag != 0)
        .count()
            * 4
    }

    /// The defaults this run was resolved against.
    pub fn defaults(&self) -> SampleDefaults {
        self.defaults
    }

    /// Iterate over the samples in order.
    pub fn samples(&self) -> TrunSamples<'_> {
        TrunSamples {
            run: self,
            index: 0,
            cursor: &self.table,
        }
    }
}

/// Iterator over the samples of a [`TrackRun`].
pub struct TrunSamples<'a> {
    run: &'a TrackRun,
    index: u32,
    cursor: &'a [u8],
}

impl Iterator for TrunSamples<'_> {
    type Item = TrunSample;

    fn next(&mut self) -> Option<TrunSample> {
        use trun_flags::*;

        if self.index >= self.run.sample_count {
            return None;
        }
        let flags = self.run.flags;
        let defaults = self.run.defaults;

        let mut sample = TrunSample {
            duration: defaults.duration,
            size: defaults.size,
            flags: defaults.flags,
            composition_time_offset: None,
        };
        if self.index == 0 {
            if let Some(first) = self.run.first_sample_flags {
                sample.flags = first;
            }
        }

        // `TrackRun::parse` checked that the table holds every record.
        if flags & SAMPLE_DURATION != 0 {
            sample.duration = Some(self.cursor.get_u32());
        }
        if flags & SAMPLE_SIZE != 0 {
            sample.size = Some(self.cursor.get_u32());
        }
        if flags & SAMPLE_FLAGS != 0 {
            sample.flags = SampleFlags(self.cursor.get_u32());
        }
        if flags & SAMPLE_COMPOSITION_TIME_OFFSET != 0 {
            let raw = self.cursor.get_u32();
            sample.composition_time_offset = Some(if self.run.version == 0 {
                raw as i64
            } else {
                raw as i32 as i64
            });
        }

        self.index += 1;
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.run.sample_count - self.index) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for TrunSamples<'_> {}
