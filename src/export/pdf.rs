//! PDF export
//!
//! Lays text out on A4 pages with fixed margins, wrapping long lines at
//! word boundaries and starting a new page whenever the next line would
//! cross the bottom margin.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{write_atomically, DocumentWriter};
use crate::error::{OcrError, Result};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const PT_TO_MM: f32 = 0.352_778;

/// Unicode fonts tried, in order, when no font is configured
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// PDF page layout and font settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfSettings {
    /// TrueType font to embed; must cover every recognized script.
    /// The whole font file is embedded, so its size dominates the output.
    pub font_path: Option<PathBuf>,
    /// Look for a Unicode system font when `font_path` is unset
    pub use_system_fonts: bool,
    /// Font size in points
    pub font_size: f32,
    /// Distance between baselines
    pub line_height_mm: f32,
    /// Left, right and top margin
    pub margin_mm: f32,
    /// Space kept free at the bottom before breaking to a new page
    pub bottom_margin_mm: f32,
    /// Average glyph advance as a fraction of the font size, used for wrapping
    pub char_width_em: f32,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            font_path: None,
            use_system_fonts: true,
            font_size: 12.0,
            line_height_mm: 10.0,
            margin_mm: 10.0,
            bottom_margin_mm: 15.0,
            char_width_em: 0.6,
        }
    }
}

impl PdfSettings {
    /// Characters that fit on one line
    fn chars_per_line(&self) -> usize {
        let usable = PAGE_WIDTH_MM - 2.0 * self.margin_mm;
        let glyph = self.font_size * PT_TO_MM * self.char_width_em;
        ((usable / glyph).floor() as usize).max(1)
    }

    /// Lines that fit between the top and bottom margins
    fn lines_per_page(&self) -> usize {
        let usable = PAGE_HEIGHT_MM - self.margin_mm - self.bottom_margin_mm;
        ((usable / self.line_height_mm).floor() as usize).max(1)
    }

    /// Embedded font chosen for this export, if any
    fn resolve_font(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.font_path {
            if !path.is_file() {
                return Err(OcrError::Export {
                    path: path.clone(),
                    message: "configured PDF font not found".to_string(),
                });
            }
            return Ok(Some(path.clone()));
        }
        if !self.use_system_fonts {
            return Ok(None);
        }
        Ok(SYSTEM_FONTS.iter().map(PathBuf::from).find(|p| p.is_file()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    settings: PdfSettings,
}

impl PdfWriter {
    pub fn new(settings: PdfSettings) -> Self {
        Self { settings }
    }

    fn load_font(&self, doc: &PdfDocumentReference, font_path: Option<&Path>) -> Result<IndirectFontRef> {
        let font = match font_path {
            Some(path) => {
                debug!("Embedding PDF font {:?}", path);
                doc.add_external_font(File::open(path)?)
            }
            None => doc.add_builtin_font(BuiltinFont::Helvetica),
        };
        font.map_err(|e| OcrError::Export {
            path: font_path.map(Path::to_path_buf).unwrap_or_default(),
            message: format!("failed to load font: {e}"),
        })
    }
}

impl DocumentWriter for PdfWriter {
    fn write(&self, text: &str, path: &Path) -> Result<()> {
        let font_path = self.settings.resolve_font()?;
        let text = match font_path {
            Some(_) => text.replace('\t', "    "),
            None => {
                let (ascii, replaced) = to_builtin_charset(text);
                if replaced > 0 {
                    warn!(
                        "No Unicode font available, {} characters replaced in PDF output; set export.pdf.font_path",
                        replaced
                    );
                }
                ascii
            }
        };

        let pages = layout(&text, &self.settings);
        let s = &self.settings;

        let (doc, first_page, first_layer) =
            PdfDocument::new("Recognized text", Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Text");
        let font = self.load_font(&doc, font_path.as_deref())?;

        // Baseline sits in the lower part of each line cell
        let first_baseline = PAGE_HEIGHT_MM - s.margin_mm - 0.7 * s.line_height_mm;

        for (page_no, lines) in pages.iter().enumerate() {
            let (page, layer) = if page_no == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Text")
            };
            let layer = doc.get_page(page).get_layer(layer);

            for (row, line) in lines.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let y = first_baseline - row as f32 * s.line_height_mm;
                layer.use_text(line.as_str(), s.font_size, Mm(s.margin_mm), Mm(y), &font);
            }
        }

        write_atomically(path, |file| {
            let mut writer = BufWriter::new(file);
            doc.save(&mut writer).map_err(|e| OcrError::Export {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            writer.flush()?;
            Ok(())
        })?;

        info!("Wrote {} PDF page(s) to {:?}", pages.len(), path);
        Ok(())
    }
}

/// Split text into pages of wrapped lines
fn layout(text: &str, settings: &PdfSettings) -> Vec<Vec<String>> {
    let width = settings.chars_per_line();
    let per_page = settings.lines_per_page();

    let lines: Vec<String> = text
        .lines()
        .flat_map(|line| wrap_line(line, width))
        .collect();

    if lines.is_empty() {
        return vec![Vec::new()];
    }
    lines.chunks(per_page).map(|chunk| chunk.to_vec()).collect()
}

/// Greedy word wrap; words longer than a line are cut
fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split(' ') {
        let mut chars: Vec<char> = word.chars().collect();

        if current_len > 0 && current_len + 1 + chars.len() > width {
            out.push(std::mem::take(&mut current));
            current_len = 0;
        } else if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }

        while current_len + chars.len() > width {
            let room = width.saturating_sub(current_len);
            let tail = chars.split_off(room.min(chars.len()));
            current.extend(chars);
            out.push(std::mem::take(&mut current));
            current_len = 0;
            chars = tail;
        }
        current_len += chars.len();
        current.extend(chars);
    }

    out.push(current);
    out
}

/// Keep what the built-in Helvetica can show; returns the replacement count
fn to_builtin_charset(text: &str) -> (String, usize) {
    let mut replaced = 0;
    let out = text
        .chars()
        .map(|c| match c {
            '\t' => ' ',
            ' '..='~' | '\n' | '\r' => c,
            _ => {
                replaced += 1;
                '?'
            }
        })
        .collect();
    (out, replaced)
}
