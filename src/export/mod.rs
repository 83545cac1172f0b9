//! Document export
//!
//! Serializes recognized text to plain text, DOCX or PDF.

pub mod docx;
pub mod pdf;
pub mod text;

pub use docx::DocxWriter;
pub use pdf::{PdfSettings, PdfWriter};
pub use text::TextWriter;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{OcrError, Result};

/// Serializer for one output format
pub trait DocumentWriter {
    /// Write `text` to a new file at `path`, replacing any existing file
    fn write(&self, text: &str, path: &Path) -> Result<()>;
}

/// Run `fill` against a scratch file next to `path`, then move it into place.
/// A failed write leaves the destination untouched.
pub(crate) fn write_atomically(path: &Path, fill: impl FnOnce(&mut File) -> Result<()>) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut scratch = tempfile::NamedTempFile::new_in(dir)?;
    fill(scratch.as_file_mut())?;
    scratch.as_file_mut().sync_all()?;
    scratch.persist(path).map_err(|e| OcrError::Io(e.error))?;
    Ok(())
}

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// UTF-8 plain text
    Txt,
    /// Office Open XML word-processing document
    Docx,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Txt, ExportFormat::Docx, ExportFormat::Pdf];

    /// File extension without the dot
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Docx => "docx",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// Infer the format from a destination's extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| OcrError::UnsupportedFormat(path.display().to_string()))?;
        ext.parse()
    }

    /// Append this format's extension when `path` has none
    pub fn with_extension(self, path: &Path) -> PathBuf {
        if path.extension().is_some() {
            path.to_path_buf()
        } else {
            path.with_extension(self.extension())
        }
    }
}

impl FromStr for ExportFormat {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        if name == "text" {
            return Ok(ExportFormat::Txt);
        }
        ExportFormat::ALL
            .into_iter()
            .find(|format| format.extension() == name)
            .ok_or_else(|| OcrError::UnsupportedFormat(s.to_string()))
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// The three writers, configured once and picked per export
#[derive(Debug, Clone, Default)]
pub struct Exporters {
    pub text: TextWriter,
    pub docx: DocxWriter,
    pub pdf: PdfWriter,
}

impl Exporters {
    pub fn new(pdf: PdfSettings) -> Self {
        Self {
            text: TextWriter,
            docx: DocxWriter,
            pdf: PdfWriter::new(pdf),
        }
    }

    pub fn writer(&self, format: ExportFormat) -> &dyn DocumentWriter {
        match format {
            ExportFormat::Txt => &self.text,
            ExportFormat::Docx => &self.docx,
            ExportFormat::Pdf => &self.pdf,
        }
    }
}
