//! Image uploads attached to posts and comments.

mod storage;
mod validation;

pub use storage::UploadStorage;
pub use validation::{
    truncate_filename, validate_image, ImageKind, ImageUpload, UploadError, ALLOWED_EXTENSIONS,
    MAX_BASE_NAME_LENGTH,
};

#[cfg(test)]
pub(crate) use validation::tests as test_images;
