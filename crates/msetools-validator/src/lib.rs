//! msetools-validator: WebM and ISO-BMFF bytestream validators
//!
//! Each validator wraps an [`ElementListParser`](msetools_parser::ElementListParser)
//! with a format client and implements [`ByteStreamValidator`]: bytes go in
//! through `parse` as they are appended to a media stream, and structural
//! problems come back as error strings.
//!
//! # Example
//!
//! ```
//! use msetools_validator::{new_validator, TypeInfo};
//!
//! let type_info = TypeInfo::new("video", "webm").with_codecs(["vp8"]);
//! let mut validator = new_validator(&type_info).unwrap();
//!
//! // EBML header containing EBMLVersion = 1.
//! let errors = validator.parse(&[0x1A, 0x45, 0xDF, 0xA3, 0x84, 0x42, 0x86, 0x81, 0x01]);
//! assert!(errors.is_empty());
//! ```

pub mod format;
pub mod isobmff;
pub mod validator;
pub mod webm;

pub use format::ContainerFormat;
pub use isobmff::{BoxType, IsoBmff, IsoBmffClient, IsoBmffValidator};
pub use msetools_parser::{Error, Result};
pub use validator::{
    ByteStreamValidator, StreamValidator, TypeInfo, ValidatorClient, PREVIOUS_PARSER_ERROR,
};
pub use webm::{ElementId, Webm, WebmClient, WebmValidator};

/// Create and initialize the validator for `type_info`.
///
/// `webm` subtypes get a WebM validator and `mp4` subtypes an ISO-BMFF one;
/// any other subtype returns `None`.
pub fn new_validator(type_info: &TypeInfo) -> Option<Box<dyn ByteStreamValidator>> {
    let mut validator: Box<dyn ByteStreamValidator> = match type_info.minor.as_str() {
        "webm" => Box::new(WebmValidator::new()),
        "mp4" => Box::new(IsoBmffValidator::new()),
        _ => return None,
    };
    validator.init(type_info);
    Some(validator)
}
