//! EBML variable-length integers.
//!
//! The number of leading zero bits in the first byte gives the encoded
//! length: `1xxx xxxx` is one byte, `01xx xxxx xxxx xxxx` is two, and so on.
//! Ids keep the marker bit as part of their value; sizes drop it. A value
//! whose bits are all ones is reserved (ids) or means "unknown" (sizes).

use msetools_parser::{ElementHeader, ElementSize, Error, Result};

use super::ids::ElementId;

/// Longest id encoding accepted.
pub const MAX_ID_LENGTH: usize = 4;
/// Longest size encoding accepted.
pub const MAX_SIZE_LENGTH: usize = 8;

/// A decoded variable-length integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vint {
    /// Encoded length in bytes.
    pub len: usize,
    /// Decoded value.
    pub value: u64,
    /// Whether every value bit was set.
    pub all_ones: bool,
}

/// Decode one vint of at most `max_len` bytes from the start of `buf`.
///
/// Returns `Ok(None)` if `buf` is shorter than the encoded length.
pub fn decode_vint(buf: &[u8], max_len: usize, keep_marker: bool) -> Result<Option<Vint>> {
    let Some(&first) = buf.first() else {
        return Ok(None);
    };

    let len = first.leading_zeros() as usize + 1;
    if len > max_len {
        return Err(Error::invalid_header(format!(
            "no length marker within {} bytes (first byte 0x{:02X})",
            max_len, first
        )));
    }
    if buf.len() < len {
        return Ok(None);
    }

    let value_mask = 0x7Fu8 >> (len - 1);
    let mut value = if keep_marker {
        first as u64
    } else {
        (first & value_mask) as u64
    };
    let mut all_ones = first & value_mask == value_mask;

    for &byte in &buf[1..len] {
        value = (value << 8) | byte as u64;
        all_ones &= byte == 0xFF;
    }

    Ok(Some(Vint {
        len,
        value,
        all_ones,
    }))
}

/// Decode an element id.
pub fn decode_id(buf: &[u8]) -> Result<Option<(usize, ElementId)>> {
    let Some(vint) = decode_vint(buf, MAX_ID_LENGTH, true)? else {
        return Ok(None);
    };
    let id = if vint.all_ones {
        ElementId::Reserved
    } else {
        // At most four bytes.
        ElementId::from_raw(vint.value as u32)
    };
    Ok(Some((vint.len, id)))
}

/// Decode an element payload size.
pub fn decode_size(buf: &[u8]) -> Result<Option<(usize, ElementSize)>> {
    let Some(vint) = decode_vint(buf, MAX_SIZE_LENGTH, false)? else {
        return Ok(None);
    };
    let size = if vint.all_ones {
        ElementSize::Unknown
    } else {
        ElementSize::Known(vint.value)
    };
    Ok(Some((vint.len, size)))
}

/// Decode a complete element header: id followed by size.
pub fn decode_header(buf: &[u8]) -> Result<Option<ElementHeader<ElementId>>> {
    let Some((id_len, id)) = decode_id(buf)? else {
        return Ok(None);
    };
    let Some((size_len, size)) = decode_size(&buf[id_len..])? else {
        return Ok(None);
    };
    Ok(Some(ElementHeader {
        bytes_used: id_len + size_len,
        id,
        size,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_one_byte_size() {
        assert_eq!(decode_size(&[0x84]).unwrap(), Some((1, ElementSize::Known(4))));
        assert_eq!(decode_size(&[0x80]).unwrap(), Some((1, ElementSize::Known(0))));
    }

    #[test]
    fn test_multi_byte_size() {
        assert_eq!(
            decode_size(&[0x40, 0x02]).unwrap(),
            Some((2, ElementSize::Known(2)))
        );
        assert_eq!(
            decode_size(&[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00]).unwrap(),
            Some((8, ElementSize::Known(256)))
        );
    }

    #[test]
    fn test_all_ones_size_is_unknown() {
        assert_eq!(decode_size(&[0xFF]).unwrap(), Some((1, ElementSize::Unknown)));
        assert_eq!(
            decode_size(&[0x7F, 0xFF]).unwrap(),
            Some((2, ElementSize::Unknown))
        );
        assert_eq!(
            decode_size(&[0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap(),
            Some((8, ElementSize::Unknown))
        );
        // Not every byte set: an ordinary size.
        assert_eq!(
            decode_size(&[0x7F, 0xFE]).unwrap(),
            Some((2, ElementSize::Known(0x3FFE)))
        );
    }

    #[test]
    fn test_all_ones_id_is_reserved() {
        assert_eq!(decode_id(&[0xFF]).unwrap(), Some((1, ElementId::Reserved)));
        assert_eq!(
            decode_id(&[0x1F, 0xFF, 0xFF, 0xFF]).unwrap(),
            Some((4, ElementId::Reserved))
        );
    }

    #[test]
    fn test_id_keeps_marker_bit() {
        let (len, id) = decode_id(&[0x1A, 0x45, 0xDF, 0xA3]).unwrap().unwrap();
        assert_eq!(len, 4);
        assert_eq!(id.raw(), Some(0x1A45DFA3));
        assert_eq!(id.to_string(), "EBMLHeader");
    }

    #[test]
    fn test_zero_leading_byte_is_error() {
        assert_matches!(decode_size(&[0x00, 0x01]), Err(Error::InvalidHeader(_)));
        assert_matches!(decode_id(&[0x00]), Err(Error::InvalidHeader(_)));
        // Five-byte ids are out of range.
        assert_matches!(decode_id(&[0x08, 0, 0, 0, 0]), Err(Error::InvalidHeader(_)));
    }

    #[test]
    fn test_truncated_input_needs_more_data() {
        assert_eq!(decode_id(&[]).unwrap(), None);
        assert_eq!(decode_id(&[0x1A, 0x45]).unwrap(), None);
        assert_eq!(decode_size(&[0x40]).unwrap(), None);
        // Id complete, size missing.
        assert_eq!(decode_header(&[0x42, 0x86]).unwrap(), None);
    }

    #[test]
    fn test_header() {
        let header = decode_header(&[0x42, 0x86, 0x81, 0x01]).unwrap().unwrap();
        assert_eq!(header.bytes_used, 3);
        assert_eq!(header.id.to_string(), "EBMLVersion");
        assert_eq!(header.size, ElementSize::Known(1));
    }
}
