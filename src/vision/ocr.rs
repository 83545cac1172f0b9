//! OCR (Optical Character Recognition) module
//!
//! Runs the Tesseract engine as an external process on a binarized image.

use image::{GrayImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

use crate::error::{OcrError, Result};

/// Page-segmentation strategy passed to the engine (Tesseract `--psm`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct RecognitionMode(u8);

impl RecognitionMode {
    /// Highest mode the engine understands (raw line)
    pub const MAX: u8 = 13;

    /// Validate a user-selected mode
    pub fn new(value: i64) -> Result<Self> {
        if (0..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(OcrError::InvalidMode(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Every valid mode, lowest first
    pub fn all() -> impl Iterator<Item = RecognitionMode> {
        (0..=Self::MAX).map(Self)
    }

    /// Short description of what the engine does in this mode
    pub fn description(self) -> &'static str {
        match self.0 {
            0 => "Orientation and script detection only",
            1 => "Automatic page segmentation with OSD",
            2 => "Automatic page segmentation, no OSD or OCR",
            3 => "Fully automatic page segmentation, no OSD",
            4 => "Single column of text of variable sizes",
            5 => "Single uniform block of vertically aligned text",
            6 => "Single uniform block of text",
            7 => "Single text line",
            8 => "Single word",
            9 => "Single word in a circle",
            10 => "Single character",
            11 => "Sparse text",
            12 => "Sparse text with OSD",
            _ => "Raw line",
        }
    }
}

impl Default for RecognitionMode {
    fn default() -> Self {
        Self(6)
    }
}

impl TryFrom<i64> for RecognitionMode {
    type Error = OcrError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RecognitionMode> for u8 {
    fn from(mode: RecognitionMode) -> u8 {
        mode.0
    }
}

impl fmt::Display for RecognitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PSM {}", self.0)
    }
}

/// Languages enabled together for one recognition call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSet {
    pub primary: String,
    pub secondary: String,
}

impl Default for LanguageSet {
    fn default() -> Self {
        Self {
            primary: "eng".to_string(),
            secondary: "rus".to_string(),
        }
    }
}

impl LanguageSet {
    /// Engine argument form, e.g. `eng+rus`
    pub fn to_arg(&self) -> String {
        format!("{}+{}", self.primary, self.secondary)
    }
}

/// Opaque recognition primitive
pub trait OcrEngine {
    /// Recognize all text in a binarized image
    fn recognize(
        &self,
        image: &GrayImage,
        languages: &LanguageSet,
        mode: RecognitionMode,
    ) -> Result<String>;
}

/// Tesseract invoked through its command-line executable
#[derive(Debug, Clone)]
pub struct TesseractCli {
    command: PathBuf,
    tessdata_dir: Option<PathBuf>,
}

impl TesseractCli {
    /// Create an engine that runs `command` (a path or a name on `PATH`)
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            tessdata_dir: None,
        }
    }

    /// Use language data from a custom directory
    pub fn with_tessdata_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.tessdata_dir = dir;
        self
    }

    fn build_command(&self, input: &std::path::Path, languages: &LanguageSet, mode: RecognitionMode) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.arg(input).arg("stdout");
        if let Some(dir) = &self.tessdata_dir {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        cmd.arg("-l")
            .arg(languages.to_arg())
            .arg("--psm")
            .arg(mode.value().to_string());
        cmd
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(
        &self,
        image: &GrayImage,
        languages: &LanguageSet,
        mode: RecognitionMode,
    ) -> Result<String> {
        // The engine reads images from disk; the file is removed on drop
        let input = tempfile::Builder::new()
            .prefix("scanscribe-")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| OcrError::Engine(format!("failed to stage image: {e}")))?;

        info!(
            "Running {:?} on {}x{} image (lang={}, {})",
            self.command,
            image.width(),
            image.height(),
            languages.to_arg(),
            mode
        );

        let output = self
            .build_command(input.path(), languages, mode)
            .output()
            .map_err(|e| OcrError::Engine(format!("could not run {:?}: {e}", self.command)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine(format!(
                "{:?} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        let text = clean_output(&String::from_utf8_lossy(&output.stdout));
        debug!("Engine returned {} characters", text.len());
        Ok(text)
    }
}

/// Drop the page-separator form feed Tesseract appends after each page
fn clean_output(raw: &str) -> String {
    raw.trim_end_matches(['\u{c}', '\n', '\r']).to_string()
}
