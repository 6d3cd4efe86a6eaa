//! Client-side preconditions, checked before any request leaves the process.
//!
//! The backend runs the same checks on receipt; these exist so that obvious
//! mistakes (empty title, a 15 MB GIF) fail without a network round trip.

use image::ImageFormat;

use crate::constants::{MAX_LABEL_LEN, MAX_UPLOAD_SIZE};
use crate::error::ValidationError;

/// Accepted screenshot encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Webp,
}

impl ImageKind {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }
}

/// Detect the encoding from the byte signature.
pub fn sniff_image(bytes: &[u8]) -> Result<ImageKind, ValidationError> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => Ok(ImageKind::Png),
        Ok(ImageFormat::Jpeg) => Ok(ImageKind::Jpeg),
        Ok(ImageFormat::WebP) => Ok(ImageKind::Webp),
        Ok(other) => Err(ValidationError::UnsupportedImageType(format!("{other:?}"))),
        Err(_) => Err(ValidationError::UnsupportedImageType("unknown".to_string())),
    }
}

/// Check size and encoding of an uploaded screenshot.
pub fn validate_image(bytes: &[u8], max_size: usize) -> Result<ImageKind, ValidationError> {
    if bytes.is_empty() {
        return Err(ValidationError::EmptyImage);
    }
    if bytes.len() > max_size {
        return Err(ValidationError::ImageTooLarge {
            size: bytes.len(),
            max: max_size,
        });
    }
    sniff_image(bytes)
}

/// [`validate_image`] with the default 10 MiB ceiling.
pub fn validate_screenshot(bytes: &[u8]) -> Result<ImageKind, ValidationError> {
    validate_image(bytes, MAX_UPLOAD_SIZE)
}

/// Returns the trimmed title.
pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    check_len("Title", trimmed)?;
    Ok(trimmed.to_string())
}

/// Returns the trimmed library item name.
pub fn validate_library_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    check_len("Name", trimmed)?;
    Ok(trimmed.to_string())
}

fn check_len(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > MAX_LABEL_LEN {
        return Err(ValidationError::TooLong {
            field,
            len,
            max: MAX_LABEL_LEN,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0];

    fn with_padding(magic: &[u8], len: usize) -> Vec<u8> {
        let mut bytes = magic.to_vec();
        bytes.resize(len, 0);
        bytes
    }

    #[test]
    fn test_sniff_accepted_formats() {
        assert_eq!(sniff_image(&with_padding(PNG_MAGIC, 64)).unwrap(), ImageKind::Png);
        assert_eq!(sniff_image(&with_padding(JPEG_MAGIC, 64)).unwrap(), ImageKind::Jpeg);

        let mut webp = b"RIFF\x00\x00\x00\x00WEBPVP8 ".to_vec();
        webp.resize(64, 0);
        assert_eq!(sniff_image(&webp).unwrap(), ImageKind::Webp);
    }

    #[test]
    fn test_sniff_rejects_gif_and_garbage() {
        assert!(matches!(
            sniff_image(&with_padding(b"GIF89a", 64)),
            Err(ValidationError::UnsupportedImageType(_))
        ));
        assert!(sniff_image(b"definitely not an image").is_err());
    }

    #[test]
    fn test_oversize_rejected_before_sniffing() {
        let bytes = with_padding(PNG_MAGIC, 15 * 1024 * 1024);
        assert_eq!(
            validate_screenshot(&bytes),
            Err(ValidationError::ImageTooLarge {
                size: 15 * 1024 * 1024,
                max: MAX_UPLOAD_SIZE,
            })
        );
    }

    #[test]
    fn test_exactly_at_ceiling_is_accepted() {
        let bytes = with_padding(PNG_MAGIC, MAX_UPLOAD_SIZE);
        assert_eq!(validate_screenshot(&bytes).unwrap(), ImageKind::Png);
    }

    #[test]
    fn test_empty_image() {
        assert_eq!(validate_screenshot(&[]), Err(ValidationError::EmptyImage));
    }

    #[test]
    fn test_title_and_name_trimmed() {
        assert_eq!(validate_title("  Homepage v1 ").unwrap(), "Homepage v1");
        assert_eq!(validate_title(" \t "), Err(ValidationError::EmptyTitle));
        assert_eq!(validate_library_name(""), Err(ValidationError::EmptyName));
        assert_eq!(
            validate_library_name(" Homepage Template ").unwrap(),
            "Homepage Template"
        );
    }

    #[test]
    fn test_overlong_label() {
        let long = "x".repeat(MAX_LABEL_LEN + 1);
        assert!(matches!(
            validate_title(&long),
            Err(ValidationError::TooLong { field: "Title", .. })
        ));
    }
}
