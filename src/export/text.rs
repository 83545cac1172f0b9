//! Plain text export

use std::io::Write;
use std::path::Path;
use tracing::debug;

use super::{write_atomically, DocumentWriter};
use crate::error::Result;

/// Writes the text verbatim as UTF-8
#[derive(Debug, Clone, Copy, Default)]
pub struct TextWriter;

impl DocumentWriter for TextWriter {
    fn write(&self, text: &str, path: &Path) -> Result<()> {
        write_atomically(path, |file| Ok(file.write_all(text.as_bytes())?))?;
        debug!("Wrote {} bytes of text to {:?}", text.len(), path);
        Ok(())
    }
}
