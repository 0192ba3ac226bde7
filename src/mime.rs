//! MIME type parsing for source buffer types.

use msetools_validator::TypeInfo;
use thiserror::Error;

/// Errors from [`parse_mime_type`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MimeError {
    #[error("MIME type is empty")]
    Empty,

    #[error("MIME type '{0}' has no subtype")]
    MissingSubtype(String),

    #[error("Unterminated quoted value in parameter '{0}'")]
    UnterminatedQuote(String),
}

/// Parse a type such as `video/webm; codecs="vp8, vorbis"`.
///
/// Type and subtype are lowercased. Parameters other than `codecs` are
/// ignored.
pub fn parse_mime_type(mime: &str) -> Result<TypeInfo, MimeError> {
    let mut parts = mime.splitn(2, ';');
    let essence = parts.next().unwrap_or_default().trim();
    if essence.is_empty() {
        return Err(MimeError::Empty);
    }

    let (major, minor) = essence
        .split_once('/')
        .map(|(major, minor)| (major.trim(), minor.trim()))
        .filter(|(major, minor)| !major.is_empty() && !minor.is_empty())
        .ok_or_else(|| MimeError::MissingSubtype(essence.to_string()))?;

    let mut type_info = TypeInfo::new(major.to_ascii_lowercase(), minor.to_ascii_lowercase());

    if let Some(params) = parts.next() {
        for (name, value) in split_params(params)? {
            if name.eq_ignore_ascii_case("codecs") {
                type_info = type_info.with_codecs(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|codec| !codec.is_empty()),
                );
            }
        }
    }

    Ok(type_info)
}

/// Split `a=1; b="x; y"` into name/value pairs, honoring quotes.
fn split_params(params: &str) -> Result<Vec<(String, String)>, MimeError> {
    let mut out = Vec::new();
    let mut rest = params;

    loop {
        rest = rest.trim_start_matches(|c: char| c == ';' || c.is_whitespace());
        if rest.is_empty() {
            break;
        }

        let (name, after_name) = match rest.find(['=', ';']) {
            Some(i) if rest[i..].starts_with('=') => (rest[..i].trim(), &rest[i + 1..]),
            Some(i) => {
                rest = &rest[i..];
                continue;
            }
            None => break,
        };

        let after_name = after_name.trim_start();
        if let Some(quoted) = after_name.strip_prefix('"') {
            let end = quoted
                .find('"')
                .ok_or_else(|| MimeError::UnterminatedQuote(name.to_string()))?;
            out.push((name.to_string(), quoted[..end].to_string()));
            rest = &quoted[end + 1..];
        } else {
            let end = after_name.find(';').unwrap_or(after_name.len());
            out.push((name.to_string(), after_name[..end].trim().to_string()));
            rest = &after_name[end..];
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_plain_type() {
        let info = parse_mime_type("video/webm").unwrap();
        assert_eq!(info.major, "video");
        assert_eq!(info.minor, "webm");
        assert!(info.codecs.is_empty());
    }

    #[test]
    fn test_quoted_codecs() {
        let info = parse_mime_type("video/webm; codecs=\"vp8, vorbis\"").unwrap();
        assert_eq!(info.codecs, vec!["vp8", "vorbis"]);
        assert_eq!(info.to_string(), "video/webm; codecs=\"vp8, vorbis\"");
    }

    #[test]
    fn test_unquoted_codecs_and_other_params() {
        let info = parse_mime_type("Audio/MP4;profiles=dash;CODECS=mp4a.40.2").unwrap();
        assert_eq!(info.major, "audio");
        assert_eq!(info.minor, "mp4");
        assert_eq!(info.codecs, vec!["mp4a.40.2"]);
    }

    #[test]
    fn test_invalid_types() {
        assert_matches!(parse_mime_type("  "), Err(MimeError::Empty));
        assert_matches!(parse_mime_type("video"), Err(MimeError::MissingSubtype(_)));
        assert_matches!(parse_mime_type("video/"), Err(MimeError::MissingSubtype(_)));
        assert_matches!(
            parse_mime_type("video/webm; codecs=\"vp8"),
            Err(MimeError::UnterminatedQuote(_))
        );
    }
}
