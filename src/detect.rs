//! Container format detection from magic bytes.

use std::path::Path;

use msetools_validator::TypeInfo;

/// Bytes needed to recognize either format.
pub const MAGIC_LEN: usize = 8;

const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// Container formats the validators understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// WebM / Matroska (EBML)
    Webm,
    /// ISO base media file format (fragmented MP4)
    IsoBmff,
}

impl Container {
    /// MIME type used when the caller does not supply one.
    pub fn default_type_info(self) -> TypeInfo {
        match self {
            Container::Webm => TypeInfo::new("video", "webm"),
            Container::IsoBmff => TypeInfo::new("video", "mp4"),
        }
    }
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Container::Webm => write!(f, "WebM"),
            Container::IsoBmff => write!(f, "ISO-BMFF"),
        }
    }
}

/// Detect the container from the first bytes of a stream.
///
/// WebM starts with the EBML header id; ISO-BMFF files start with an
/// `ftyp` box, so its type sits at offset 4.
pub fn detect_container_from_bytes(magic: &[u8]) -> Option<Container> {
    if magic.len() >= 4 && magic[..4] == EBML_MAGIC {
        return Some(Container::Webm);
    }
    if magic.len() >= MAGIC_LEN && &magic[4..8] == b"ftyp" {
        return Some(Container::IsoBmff);
    }
    None
}

/// Get container type from file extension (fallback)
pub fn container_from_extension(path: &Path) -> Option<Container> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "webm" | "mkv" | "mka" | "weba" => Some(Container::Webm),
        "mp4" | "m4v" | "m4a" | "m4s" | "cmfv" | "cmfa" => Some(Container::IsoBmff),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_from_bytes() {
        assert_eq!(
            detect_container_from_bytes(&[0x1A, 0x45, 0xDF, 0xA3, 0x84]),
            Some(Container::Webm)
        );
        assert_eq!(
            detect_container_from_bytes(b"\0\0\0\x18ftypiso5"),
            Some(Container::IsoBmff)
        );
        assert_eq!(detect_container_from_bytes(b"\0\0\0\x08moov"), None);
        assert_eq!(detect_container_from_bytes(&[0x1A]), None);
    }

    #[test]
    fn test_container_from_extension() {
        assert_eq!(
            container_from_extension(Path::new("a/b/clip.WEBM")),
            Some(Container::Webm)
        );
        assert_eq!(
            container_from_extension(Path::new("seg-1.m4s")),
            Some(Container::IsoBmff)
        );
        assert_eq!(container_from_extension(Path::new("notes.txt")), None);
    }

    #[test]
    fn test_default_type_info() {
        assert_eq!(Container::Webm.default_type_info().to_string(), "video/webm");
        assert_eq!(Container::IsoBmff.default_type_info().minor, "mp4");
    }
}
