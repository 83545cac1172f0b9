//! DOCX export
//!
//! The whole text goes into one paragraph. Line structure is kept with
//! in-paragraph line breaks, the way word processors represent a soft
//! return.

use docx_rs::{BreakType, Docx, Paragraph, Run};
use std::path::Path;
use tracing::debug;

use super::{write_atomically, DocumentWriter};
use crate::error::{OcrError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct DocxWriter;

impl DocxWriter {
    fn build(text: &str) -> Docx {
        let mut run = Run::new();
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                run = run.add_break(BreakType::TextWrapping);
            }
            let line = line.strip_suffix('\r').unwrap_or(line);
            if !line.is_empty() {
                run = run.add_text(line);
            }
        }
        Docx::new().add_paragraph(Paragraph::new().add_run(run))
    }
}

impl DocumentWriter for DocxWriter {
    fn write(&self, text: &str, path: &Path) -> Result<()> {
        write_atomically(path, |file| {
            Self::build(text)
                .build()
                .pack(file)
                .map_err(|e| OcrError::Export {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
        })?;
        debug!("Wrote DOCX with one paragraph to {:?}", path);
        Ok(())
    }
}
