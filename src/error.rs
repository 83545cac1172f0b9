//! Error types shared by the recognition pipeline and the exporters

use std::path::PathBuf;

/// Failures surfaced by loading, recognition and export
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    /// The image file is missing, unreadable or in an unsupported format
    #[error("failed to load image {path:?}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The image decoded but cannot be recognized (e.g. zero-sized)
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Recognition mode outside the supported range
    #[error("invalid recognition mode {0}, expected a value in 0..=13")]
    InvalidMode(i64),

    #[error("no image loaded")]
    NoImageLoaded,

    #[error("nothing to export: recognized text is empty")]
    EmptyResult,

    #[error("unsupported export format '{0}', expected txt, docx or pdf")]
    UnsupportedFormat(String),

    /// The OCR engine could not be started or reported a failure
    #[error("OCR engine failed: {0}")]
    Engine(String),

    /// A document writer failed to serialize the text
    #[error("failed to export {path:?}: {message}")]
    Export { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OcrError>;
