//! Typed decoding of WebM leaf payloads.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

use super::ids::ElementType;

/// Seconds from the Unix epoch to 2001-01-01T00:00:00Z, the EBML date origin.
const EBML_EPOCH_SECS: i64 = 978_307_200;

/// A leaf payload decoded according to its element type.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Uint(u64),
    Int(i64),
    Float(f64),
    String(String),
    Date(DateTime<Utc>),
    Binary(usize),
}

/// Payload that does not fit its element type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("{element_type} payload of {len} bytes is not allowed")]
    InvalidLength { element_type: ElementType, len: usize },

    #[error("DATE value is out of range")]
    DateOutOfRange,
}

impl ElementValue {
    /// Decode `payload` as `element_type`.
    ///
    /// `List` payloads are treated as opaque binary.
    pub fn decode(element_type: ElementType, payload: &[u8]) -> Result<Self, ValueError> {
        let invalid = || ValueError::InvalidLength {
            element_type,
            len: payload.len(),
        };

        match element_type {
            ElementType::Uint => {
                if payload.len() > 8 {
                    return Err(invalid());
                }
                Ok(Self::Uint(
                    payload.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64),
                ))
            }
            ElementType::Int => {
                if payload.len() > 8 {
                    return Err(invalid());
                }
                let init = match payload.first() {
                    Some(&b) if b & 0x80 != 0 => -1i64,
                    _ => 0,
                };
                Ok(Self::Int(
                    payload.iter().fold(init, |acc, &b| (acc << 8) | b as i64),
                ))
            }
            ElementType::Float => match payload.len() {
                0 => Ok(Self::Float(0.0)),
                4 => {
                    let bytes: [u8; 4] = payload.try_into().map_err(|_| invalid())?;
                    Ok(Self::Float(f32::from_be_bytes(bytes) as f64))
                }
                8 => {
                    let bytes: [u8; 8] = payload.try_into().map_err(|_| invalid())?;
                    Ok(Self::Float(f64::from_be_bytes(bytes)))
                }
                _ => Err(invalid()),
            },
            ElementType::Date => {
                let nanos = match payload.len() {
                    0 => 0,
                    8 => {
                        let bytes: [u8; 8] = payload.try_into().map_err(|_| invalid())?;
                        i64::from_be_bytes(bytes)
                    }
                    _ => return Err(invalid()),
                };
                DateTime::from_timestamp(EBML_EPOCH_SECS, 0)
                    .and_then(|epoch| epoch.checked_add_signed(TimeDelta::nanoseconds(nanos)))
                    .map(Self::Date)
                    .ok_or(ValueError::DateOutOfRange)
            }
            ElementType::String | ElementType::Utf8 => {
                let end = payload
                    .iter()
                    .rposition(|&b| b != 0)
                    .map_or(0, |last| last + 1);
                Ok(Self::String(
                    String::from_utf8_lossy(&payload[..end]).into_owned(),
                ))
            }
            ElementType::Binary | ElementType::List => Ok(Self::Binary(payload.len())),
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Self::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ElementValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(s) => write!(f, "{}", s),
            Self::Date(d) => write!(f, "{}", d.to_rfc3339()),
            Self::Binary(len) => write!(f, "{} bytes", len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_uint() {
        assert_eq!(
            ElementValue::decode(ElementType::Uint, &[0x01]),
            Ok(ElementValue::Uint(1))
        );
        assert_eq!(
            ElementValue::decode(ElementType::Uint, &[0x0F, 0x42, 0x40]),
            Ok(ElementValue::Uint(1_000_000))
        );
        assert_eq!(
            ElementValue::decode(ElementType::Uint, &[]),
            Ok(ElementValue::Uint(0))
        );
        assert_matches!(
            ElementValue::decode(ElementType::Uint, &[0; 9]),
            Err(ValueError::InvalidLength { len: 9, .. })
        );
    }

    #[test]
    fn test_int_sign_extends() {
        assert_eq!(
            ElementValue::decode(ElementType::Int, &[0xFF, 0xFE]),
            Ok(ElementValue::Int(-2))
        );
        assert_eq!(
            ElementValue::decode(ElementType::Int, &[0x7F]),
            Ok(ElementValue::Int(127))
        );
    }

    #[test]
    fn test_float() {
        let value = ElementValue::decode(ElementType::Float, &1.5f32.to_be_bytes()).unwrap();
        assert_eq!(value.as_float(), Some(1.5));
        let value = ElementValue::decode(ElementType::Float, &2500.0f64.to_be_bytes()).unwrap();
        assert_eq!(value.as_float(), Some(2500.0));
        assert_matches!(
            ElementValue::decode(ElementType::Float, &[0; 3]),
            Err(ValueError::InvalidLength { .. })
        );
    }

    #[test]
    fn test_string_trims_trailing_nuls() {
        let value = ElementValue::decode(ElementType::String, b"webm\0\0").unwrap();
        assert_eq!(value.as_str(), Some("webm"));
    }

    #[test]
    fn test_date() {
        let value = ElementValue::decode(ElementType::Date, &[]).unwrap();
        assert_eq!(value.to_string(), "2001-01-01T00:00:00+00:00");

        let one_sec = 1_000_000_000i64.to_be_bytes();
        let value = ElementValue::decode(ElementType::Date, &one_sec).unwrap();
        assert_eq!(value.to_string(), "2001-01-01T00:00:01+00:00");

        assert_matches!(
            ElementValue::decode(ElementType::Date, &[0; 4]),
            Err(ValueError::InvalidLength { .. })
        );
    }

    #[test]
    fn test_binary_reports_length() {
        let value = ElementValue::decode(ElementType::Binary, &[1, 2, 3]).unwrap();
        assert_eq!(value, ElementValue::Binary(3));
        assert_eq!(value.to_string(), "3 bytes");
    }
}
