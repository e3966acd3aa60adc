//! Field-level validation shared by the resource services.
//!
//! Static rules are declared on the input types with `#[derive(Validate)]`.
//! Rules that need the store (existence, uniqueness) are added to the same
//! [`ValidationErrors`] by the services before anything is written.

use std::borrow::Cow;
use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use once_cell::sync::Lazy;
use regex::Regex;
pub use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::DomainError;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const NON_FIELD: &str = "non_field_errors";

/// Letters, digits, underscores and hyphens. Emptiness is left to [`not_blank`].
pub static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]*$").expect("slug pattern compiles"));

/// Letters, digits and `@.+-_`.
pub static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]*$").expect("username pattern compiles"));

/// Error with a client-facing message.
pub fn field_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Rejects text that is empty once surrounding whitespace is removed.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(field_error("blank", BLANK))
    } else {
        Ok(())
    }
}

pub fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

/// Runs the derived rules and hands back whatever they found so the caller
/// can add its own.
pub fn collect<T: Validate>(input: &T) -> ValidationErrors {
    input.validate().err().unwrap_or_default()
}

/// `Ok(())` when nothing was recorded.
pub fn into_result(errors: ValidationErrors) -> Result<(), DomainError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(DomainError::Validation(errors))
    }
}

/// Flattens errors into `{field: [messages]}` for response bodies.
pub fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages = errors
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => e.code.to_string(),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

/// Image formats accepted for post attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
        }
    }

    fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageFormat::Webp)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

/// Decode an image sent inline as a base64 string or `data:` URI.
///
/// The declared media type is ignored; the format is taken from the
/// payload's magic bytes.
pub fn decode_image(data: &str) -> Result<DecodedImage, &'static str> {
    let payload = match data.split_once(";base64,") {
        Some((header, payload)) if header.starts_with("data:") => payload,
        Some(_) => return Err(INVALID_IMAGE),
        None => data,
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| INVALID_IMAGE)?;
    let format = ImageFormat::sniff(&bytes).ok_or(INVALID_IMAGE)?;

    Ok(DecodedImage { bytes, format })
}
