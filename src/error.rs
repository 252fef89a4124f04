//! Error types for multiformat
//!
//! Drawing calls fail with [`ValidationError`] before anything is recorded.
//! Rendering failures from the PDF writer, the image encoder or the
//! filesystem are wrapped in [`Error`] and propagated unchanged.

use thiserror::Error;

/// A drawing argument that cannot be recorded in a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid {field}: {value:?}, should be an integer")]
    NotAnInteger { field: &'static str, value: String },

    #[error("{field} not within document boundaries: {value} (allowed 0..={max})")]
    OutOfBounds {
        field: &'static str,
        value: i64,
        max: i64,
    },

    #[error("Invalid {field}: {value}, should be >= 0")]
    Negative { field: &'static str, value: i64 },

    #[error("Color '{0}' is not in #RRGGBB or #RGB format")]
    ColorFormat(String),

    #[error("Invalid RGB color code {channel} value: {value}")]
    ColorComponent { channel: &'static str, value: i64 },

    #[error("Invalid RGB color code: {0}")]
    ColorShape(String),

    #[error("Invalid alignment: {0:?}, expected left, right or middle")]
    Alignment(String),

    #[error("Font named ({0}) not valid. Custom fonts need to be loaded.")]
    UnknownFont(String),

    #[error("Invalid page number: {page}, document has {pages} page(s)")]
    PageNumber { page: String, pages: u32 },

    #[error("{0} requires border or fill")]
    InvisibleShape(&'static str),
}

/// Errors returned by document construction and rendering.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid document configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Image format not valid: {0:?}. Supported types are PNG, GIF, JPEG")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Render error: {0}")]
    Render(String),
}

/// Result type alias for multiformat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Helper to convert serde_json errors
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Render(err.to_string())
    }
}
