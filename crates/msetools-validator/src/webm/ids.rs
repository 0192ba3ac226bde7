//! WebM element ids, names and value types.

use std::borrow::Cow;
use std::fmt;

/// Element ids referenced by name elsewhere in the crate.
pub mod id {
    pub const EBML_HEADER: u32 = 0x1A45_DFA3;
    pub const VOID: u32 = 0xEC;
    pub const SEGMENT: u32 = 0x1853_8067;
    pub const SEEK_ID: u32 = 0x53AB;
    pub const INFO: u32 = 0x1549_A966;
    pub const TIMECODE_SCALE: u32 = 0x2A_D7B1;
    pub const DURATION: u32 = 0x4489;
    pub const DATE_UTC: u32 = 0x4461;
    pub const TRACKS: u32 = 0x1654_AE6B;
    pub const CODEC_ID: u32 = 0x86;
    pub const CLUSTER: u32 = 0x1F43_B675;
    pub const TIMECODE: u32 = 0xE7;
}

/// Value type of an element's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Binary,
    Date,
    Float,
    Int,
    List,
    String,
    Uint,
    Utf8,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Binary => "BINARY",
            Self::Date => "DATE",
            Self::Float => "FLOAT",
            Self::Int => "INT",
            Self::List => "LIST",
            Self::String => "STRING",
            Self::Uint => "UINT",
            Self::Utf8 => "UTF8",
        };
        f.write_str(name)
    }
}

/// Static description of a known element.
#[derive(Debug, PartialEq, Eq)]
pub struct ElementInfo {
    /// Raw id, including the length marker bits.
    pub id: u32,
    pub name: &'static str,
    pub element_type: ElementType,
}

const fn el(id: u32, name: &'static str, element_type: ElementType) -> ElementInfo {
    ElementInfo {
        id,
        name,
        element_type,
    }
}

use ElementType::{Binary, Date, Float, Int, List, String as Str, Uint, Utf8};

/// Every element the validator knows by name.
pub static ELEMENTS: &[ElementInfo] = &[
    // EBML header
    el(id::EBML_HEADER, "EBMLHeader", List),
    el(0x4286, "EBMLVersion", Uint),
    el(0x42F7, "EBMLReadVersion", Uint),
    el(0x42F2, "EBMLMaxIDLength", Uint),
    el(0x42F3, "EBMLMaxSizeLength", Uint),
    el(0x4282, "DocType", Str),
    el(0x4287, "DocTypeVersion", Uint),
    el(0x4285, "DocTypeReadVersion", Uint),
    el(id::VOID, "Void", Binary),
    el(0xBF, "CRC-32", Binary),
    // Segment
    el(id::SEGMENT, "Segment", List),
    el(0x114D_9B74, "SeekHead", List),
    el(0x4DBB, "Seek", List),
    el(id::SEEK_ID, "SeekID", Uint),
    el(0x53AC, "SeekPosition", Uint),
    // Info
    el(id::INFO, "Info", List),
    el(0x73A4, "SegmentUID", Binary),
    el(0x7384, "SegmentFilename", Utf8),
    el(0x3C_B923, "PrevUID", Binary),
    el(0x3C_83AB, "PrevFilename", Utf8),
    el(0x3E_B923, "NextUID", Binary),
    el(0x3E_83BB, "NextFilename", Utf8),
    el(0x4444, "SegmentFamily", Binary),
    el(0x6924, "ChapterTranslate", List),
    el(0x69FC, "ChapterTranslateEditionUID", Uint),
    el(0x69BF, "ChapterTranslateCodec", Uint),
    el(0x69A5, "ChapterTranslateID", Binary),
    el(id::TIMECODE_SCALE, "TimecodeScale", Uint),
    el(id::DURATION, "Duration", Float),
    el(id::DATE_UTC, "DateUTC", Date),
    el(0x7BA9, "Title", Utf8),
    el(0x4D80, "MuxingApp", Utf8),
    el(0x5741, "WritingApp", Utf8),
    // Cluster
    el(id::CLUSTER, "Cluster", List),
    el(id::TIMECODE, "Timecode", Uint),
    el(0x5854, "SilentTracks", List),
    el(0x58D7, "SilentTrackNumber", Uint),
    el(0xA7, "Position", Uint),
    el(0xAB, "PrevSize", Uint),
    el(0xA3, "SimpleBlock", Binary),
    el(0xA0, "BlockGroup", List),
    el(0xA1, "Block", Binary),
    el(0x75A1, "BlockAdditions", List),
    el(0xA6, "BlockMore", List),
    el(0xEE, "BlockAddID", Uint),
    el(0xA5, "BlockAdditional", Binary),
    el(0x9B, "BlockDuration", Uint),
    el(0xFA, "ReferencePriority", Uint),
    el(0xFB, "ReferenceBlock", Int),
    el(0xA4, "CodecState", Binary),
    el(0x75A2, "DiscardPadding", Int),
    el(0x8E, "Slices", List),
    el(0xE8, "TimeSlice", List),
    el(0xCC, "LaceNumber", Uint),
    // Tracks
    el(id::TRACKS, "Tracks", List),
    el(0xAE, "TrackEntry", List),
    el(0xD7, "TrackNumber", Uint),
    el(0x73C5, "TrackUID", Uint),
    el(0x83, "TrackType", Uint),
    el(0xB9, "FlagEnabled", Uint),
    el(0x88, "FlagDefault", Uint),
    el(0x55AA, "FlagForced", Uint),
    el(0x9C, "FlagLacing", Uint),
    el(0x6DE7, "MinCache", Uint),
    el(0x6DF8, "MaxCache", Uint),
    el(0x23_E383, "DefaultDuration", Uint),
    el(0x23_314F, "TrackTimecodeScale", Float),
    el(0x55EE, "MaxBlockAdditionID", Uint),
    el(0x536E, "Name", Utf8),
    el(0x22_B59C, "Language", Str),
    el(id::CODEC_ID, "CodecID", Str),
    el(0x63A2, "CodecPrivate", Binary),
    el(0x25_8688, "CodecName", Utf8),
    el(0x7446, "AttachmentLink", Uint),
    el(0xAA, "CodecDecodeAll", Uint),
    el(0x6FAB, "TrackOverlay", Uint),
    el(0x56AA, "CodecDelay", Uint),
    el(0x56BB, "SeekPreRoll", Uint),
    el(0x6624, "TrackTranslate", List),
    el(0x66FC, "TrackTranslateEditionUID", Uint),
    el(0x66BF, "TrackTranslateCodec", Uint),
    el(0x66A5, "TrackTranslateTrackID", Binary),
    el(0xE0, "Video", List),
    el(0x9A, "FlagInterlaced", Uint),
    el(0x53B8, "StereoMode", Uint),
    el(0x53C0, "AlphaMode", Uint),
    el(0xB0, "PixelWidth", Uint),
    el(0xBA, "PixelHeight", Uint),
    el(0x54AA, "PixelCropBottom", Uint),
    el(0x54BB, "PixelCropTop", Uint),
    el(0x54CC, "PixelCropLeft", Uint),
    el(0x54DD, "PixelCropRight", Uint),
    el(0x54B0, "DisplayWidth", Uint),
    el(0x54BA, "DisplayHeight", Uint),
    el(0x54B2, "DisplayUnit", Uint),
    el(0x54B3, "AspectRatioType", Uint),
    el(0x2E_B524, "ColorSpace", Binary),
    el(0x23_83E3, "FrameRate", Float),
    el(0xE1, "Audio", List),
    el(0xB5, "SamplingFrequency", Float),
    el(0x78B5, "OutputSamplingFrequency", Float),
    el(0x9F, "Channels", Uint),
    el(0x6264, "BitDepth", Uint),
    el(0xE2, "TrackOperation", List),
    el(0xE3, "TrackCombinePlanes", List),
    el(0xE4, "TrackPlane", List),
    el(0xE5, "TrackPlaneUID", Uint),
    el(0xE6, "TrackPlaneType", Uint),
    el(0xE9, "TrackJoinBlocks", List),
    el(0xED, "TrackJoinUID", Uint),
    el(0x6D80, "ContentEncodings", List),
    el(0x6240, "ContentEncoding", List),
    el(0x5031, "ContentEncodingOrder", Uint),
    el(0x5032, "ContentEncodingScope", Uint),
    el(0x5033, "ContentEncodingType", Uint),
    el(0x5034, "ContentCompression", List),
    el(0x4254, "ContentCompAlgo", Uint),
    el(0x4255, "ContentCompSettings", Binary),
    el(0x5035, "ContentEncryption", List),
    el(0x47E1, "ContentEncAlgo", Uint),
    el(0x47E2, "ContentEncKeyID", Binary),
    el(0x47E3, "ContentSignature", Binary),
    el(0x47E4, "ContentSigKeyID", Binary),
    el(0x47E5, "ContentSigAlgo", Uint),
    el(0x47E6, "ContentSigHashAlgo", Uint),
    // Cues
    el(0x1C53_BB6B, "Cues", List),
    el(0xBB, "CuePoint", List),
    el(0xB3, "CueTime", Uint),
    el(0xB7, "CueTrackPositions", List),
    el(0xF7, "CueTrack", Uint),
    el(0xF1, "CueClusterPosition", Uint),
    el(0xF0, "CueRelativePosition", Uint),
    el(0x5378, "CueBlockNumber", Uint),
    el(0xEA, "CueCodecState", Uint),
    el(0xDB, "CueReference", List),
    el(0x96, "CueRefTime", Uint),
    // Attachments
    el(0x1941_A469, "Attachments", List),
    el(0x61A7, "AttachedFile", List),
    el(0x467E, "FileDescription", Utf8),
    el(0x466E, "FileName", Utf8),
    el(0x4660, "FileMimeType", Str),
    el(0x465C, "FileData", Binary),
    el(0x46AE, "FileUID", Uint),
    // Chapters
    el(0x1043_A770, "Chapters", List),
    el(0x45B9, "EditionEntry", List),
    el(0x45BC, "EditionUID", Uint),
    el(0x45BD, "EditionFlagHidden", Uint),
    el(0x45DB, "EditionFlagDefault", Uint),
    el(0x45DD, "EditionFlagOrdered", Uint),
    el(0xB6, "ChapterAtom", List),
    el(0x73C4, "ChapterUID", Uint),
    el(0x91, "ChapterTimeStart", Uint),
    el(0x92, "ChapterTimeEnd", Uint),
    el(0x98, "ChapterFlagHidden", Uint),
    el(0x4598, "ChapterFlagEnabled", Uint),
    el(0x6E67, "ChapterSegmentUID", Binary),
    el(0x6EBC, "ChapterSegmentEditionUID", Uint),
    el(0x63C3, "ChapterPhysicalEquiv", Uint),
    el(0x8F, "ChapterTrack", List),
    el(0x89, "ChapterTrackNumber", Uint),
    el(0x80, "ChapterDisplay", List),
    el(0x85, "ChapString", Utf8),
    el(0x437C, "ChapLanguage", Str),
    el(0x437E, "ChapCountry", Str),
    el(0x6944, "ChapProcess", List),
    el(0x6955, "ChapProcessCodecID", Uint),
    el(0x450D, "ChapProcessPrivate", Binary),
    el(0x6911, "ChapProcessCommand", List),
    el(0x6922, "ChapProcessTime", Uint),
    el(0x6933, "ChapProcessData", Binary),
    // Tags
    el(0x1254_C367, "Tags", List),
    el(0x7373, "Tag", List),
    el(0x63C0, "Targets", List),
    el(0x68CA, "TargetTypeValue", Uint),
    el(0x63CA, "TargetType", Str),
    el(0x63C5, "TagTrackUID", Uint),
    el(0x63C9, "TagEditionUID", Uint),
    el(0x63C4, "TagChapterUID", Uint),
    el(0x63C6, "TagAttachmentUID", Uint),
    el(0x67C8, "SimpleTag", List),
    el(0x45A3, "TagName", Utf8),
    el(0x447A, "TagLanguage", Str),
    el(0x4484, "TagDefault", Uint),
    el(0x4487, "TagString", Utf8),
    el(0x4485, "TagBinary", Binary),
];

/// Look up a known element by raw id.
pub fn element_info(id: u32) -> Option<&'static ElementInfo> {
    ELEMENTS.iter().find(|info| info.id == id)
}

/// Canonical key for a raw id: uppercase hex without leading zeros.
pub fn id_key(id: u32) -> String {
    format!("{:X}", id)
}

/// Decoded element id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementId {
    /// An id listed in [`ELEMENTS`].
    Known(&'static ElementInfo),
    /// A well-formed id with no table entry.
    Unknown(u32),
    /// An id whose value bits are all ones.
    Reserved,
}

impl ElementId {
    /// Classify a raw id.
    pub fn from_raw(raw: u32) -> Self {
        element_info(raw).map_or(Self::Unknown(raw), Self::Known)
    }

    /// Raw id, unless reserved.
    pub fn raw(&self) -> Option<u32> {
        match self {
            Self::Known(info) => Some(info.id),
            Self::Unknown(raw) => Some(*raw),
            Self::Reserved => None,
        }
    }

    /// Whether this is the element with raw id `raw`.
    pub fn is(&self, raw: u32) -> bool {
        self.raw() == Some(raw)
    }

    /// Display name; unknown ids are rendered as `UNKNOWN_ID(<hex>)`.
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            Self::Known(info) => Cow::Borrowed(info.name),
            Self::Unknown(raw) => Cow::Owned(format!("UNKNOWN_ID({})", id_key(*raw))),
            Self::Reserved => Cow::Borrowed("ReservedID"),
        }
    }

    /// Value type, for known elements.
    pub fn element_type(&self) -> Option<ElementType> {
        match self {
            Self::Known(info) => Some(info.element_type),
            _ => None,
        }
    }

    /// Whether the element's body holds child elements.
    pub fn is_list(&self) -> bool {
        self.element_type() == Some(ElementType::List)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
