//! Image upload validation.
//!
//! An upload is accepted only when its file extension is on the allow-list
//! and the sniffed content is an image of the same kind.

use std::fmt;
use std::path::Path;

use image::ImageFormat;
use thiserror::Error;

/// Extensions accepted for uploads.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Longest base name kept by [`truncate_filename`].
pub const MAX_BASE_NAME_LENGTH: usize = 64;

/// Reasons an upload is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("image file is empty")]
    Empty,

    #[error("image is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("image file name has no extension")]
    MissingExtension,

    #[error("file extension .{0} is not allowed")]
    UnsupportedExtension(String),

    #[error("file content is not a JPEG, PNG or GIF image")]
    UnrecognizedContent,

    #[error("file extension .{extension} does not match {detected} content")]
    ContentMismatch {
        extension: String,
        detected: ImageKind,
    },

    #[error("invalid stored file name")]
    InvalidStoredName,
}

/// Accepted image kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
}

impl ImageKind {
    /// Kind implied by a (case-insensitive) file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            "gif" => Some(ImageKind::Gif),
            _ => None,
        }
    }

    /// Kind detected from the leading bytes of `bytes`.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            ImageFormat::Png => Some(ImageKind::Png),
            ImageFormat::Gif => Some(ImageKind::Gif),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// An image received with a post or comment.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// File name as sent by the client.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Lower-cased extension of the client file name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .map(str::to_ascii_lowercase)
    }
}

/// Check an upload against the size limit, the extension allow-list and the
/// sniffed content type.
pub fn validate_image(upload: &ImageUpload, max_bytes: usize) -> Result<ImageKind, UploadError> {
    if upload.bytes.is_empty() {
        return Err(UploadError::Empty);
    }
    if upload.bytes.len() > max_bytes {
        return Err(UploadError::TooLarge {
            size: upload.bytes.len(),
            limit: max_bytes,
        });
    }

    let extension = upload.extension().ok_or(UploadError::MissingExtension)?;
    let declared = ImageKind::from_extension(&extension)
        .ok_or_else(|| UploadError::UnsupportedExtension(extension.clone()))?;
    let detected = ImageKind::sniff(&upload.bytes).ok_or(UploadError::UnrecognizedContent)?;

    if declared != detected {
        return Err(UploadError::ContentMismatch {
            extension,
            detected,
        });
    }
    Ok(detected)
}

/// Make a client file name safe for storage.
///
/// Characters other than ASCII letters, digits, `.`, `_` and `-` become `_`,
/// and the part before the extension is cut to [`MAX_BASE_NAME_LENGTH`].
///
/// # Examples
///
/// ```
/// use mmiv::upload::truncate_filename;
///
/// assert_eq!(truncate_filename("my cat (1).png"), "my_cat__1_.png");
/// ```
pub fn truncate_filename(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let (base, ext) = match safe.rfind('.') {
        Some(idx) if idx > 0 => safe.split_at(idx),
        _ => (safe.as_str(), ""),
    };
    // `safe` is pure ASCII, so byte slicing is on char boundaries.
    let base = &base[..base.len().min(MAX_BASE_NAME_LENGTH)];
    format!("{base}{ext}")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    pub(crate) const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];
    pub(crate) const GIF: &[u8] = b"GIF89a\x01\x00\x01\x00";

    #[test]
    fn test_accepts_matching_images() {
        let cases = [
            ("a.png", PNG, ImageKind::Png),
            ("b.JPG", JPEG, ImageKind::Jpeg),
            ("c.jpeg", JPEG, ImageKind::Jpeg),
            ("d.gif", GIF, ImageKind::Gif),
        ];
        for (name, bytes, kind) in cases {
            let upload = ImageUpload::new(name, bytes);
            assert_eq!(validate_image(&upload, 1024), Ok(kind), "{name}");
        }
    }

    #[test]
    fn test_rejects_bad_extension() {
        let upload = ImageUpload::new("evil.svg", PNG);
        assert_eq!(
            validate_image(&upload, 1024),
            Err(UploadError::UnsupportedExtension("svg".to_string()))
        );

        let upload = ImageUpload::new("noext", PNG);
        assert_eq!(validate_image(&upload, 1024), Err(UploadError::MissingExtension));
    }

    #[test]
    fn test_rejects_disguised_content() {
        let upload = ImageUpload::new("page.png", b"<html><script>x</script></html>".to_vec());
        assert_eq!(validate_image(&upload, 1024), Err(UploadError::UnrecognizedContent));

        let upload = ImageUpload::new("photo.png", JPEG);
        assert!(matches!(
            validate_image(&upload, 1024),
            Err(UploadError::ContentMismatch {
                detected: ImageKind::Jpeg,
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_size() {
        assert_eq!(
            validate_image(&ImageUpload::new("a.png", Vec::new()), 1024),
            Err(UploadError::Empty)
        );
        assert_eq!(
            validate_image(&ImageUpload::new("a.png", PNG), 4),
            Err(UploadError::TooLarge {
                size: PNG.len(),
                limit: 4
            })
        );
    }

    #[test]
    fn test_truncate_filename() {
        assert_eq!(truncate_filename("photo.png"), "photo.png");
        assert_eq!(truncate_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(truncate_filename("日本.gif"), "__.gif");
        assert_eq!(truncate_filename(".hidden"), ".hidden");

        let long = format!("{}.jpeg", "a".repeat(100));
        let out = truncate_filename(&long);
        assert_eq!(out, format!("{}.jpeg", "a".repeat(MAX_BASE_NAME_LENGTH)));
    }
}
