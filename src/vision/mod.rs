//! Vision/OCR Layer
//!
//! Prepares images for recognition and hands them to the OCR engine.

pub mod ocr;
pub mod preprocess;

pub use ocr::{RecognitionMode, TesseractCli};
