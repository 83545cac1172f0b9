//! Recognition session
//!
//! Owns the loaded image, the selected recognition mode and the last
//! recognized text, and runs load → preprocess → recognize → export.

use image::{DynamicImage, ImageReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{OcrError, Result};
use crate::export::{ExportFormat, Exporters};
use crate::vision::ocr::{LanguageSet, OcrEngine, RecognitionMode};
use crate::vision::preprocess::preprocess;

/// Raster formats offered for loading
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// An image that has been opened and decoded
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub path: PathBuf,
    pub image: DynamicImage,
}

impl LoadedImage {
    fn open(path: &Path) -> Result<Self> {
        let image = ImageReader::open(path)
            .map_err(|e| OcrError::ImageLoad {
                path: path.to_path_buf(),
                source: e.into(),
            })?
            .with_guessed_format()
            .map_err(|e| OcrError::ImageLoad {
                path: path.to_path_buf(),
                source: e.into(),
            })?
            .decode()
            .map_err(|source| OcrError::ImageLoad {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            image,
        })
    }
}

/// Where the session is; decides which operations are allowed
#[derive(Debug, Clone, Default)]
pub enum Session {
    #[default]
    NoImage,
    ImageLoaded { image: LoadedImage },
    HasResult { image: LoadedImage, text: String },
}

impl Session {
    fn image(&self) -> Option<&LoadedImage> {
        match self {
            Session::NoImage => None,
            Session::ImageLoaded { image } | Session::HasResult { image, .. } => Some(image),
        }
    }

    fn into_image(self) -> Option<LoadedImage> {
        match self {
            Session::NoImage => None,
            Session::ImageLoaded { image } | Session::HasResult { image, .. } => Some(image),
        }
    }

    /// Attach `text` to the loaded image; stays `NoImage` without one
    fn with_text(self, text: String) -> Session {
        match self.into_image() {
            Some(image) => Session::HasResult { image, text },
            None => Session::NoImage,
        }
    }
}

/// Drives one image-to-document session
pub struct RecognitionController<E: OcrEngine> {
    engine: E,
    languages: LanguageSet,
    exporters: Exporters,
    mode: RecognitionMode,
    session: Session,
}

impl<E: OcrEngine> RecognitionController<E> {
    /// Create a controller with the default mode, eng+rus and default writers
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            languages: LanguageSet::default(),
            exporters: Exporters::default(),
            mode: RecognitionMode::default(),
            session: Session::NoImage,
        }
    }

    pub fn with_languages(mut self, languages: LanguageSet) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_exporters(mut self, exporters: Exporters) -> Self {
        self.exporters = exporters;
        self
    }

    pub fn with_mode(mut self, mode: RecognitionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Open and decode an image. Any previous result is discarded.
    pub fn load_image(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let loaded = LoadedImage::open(path)?;
        info!(
            "Loaded {:?} ({}x{}, {:?})",
            path,
            loaded.image.width(),
            loaded.image.height(),
            loaded.image.color()
        );
        self.session = Session::ImageLoaded { image: loaded };
        Ok(())
    }

    /// Select the page-segmentation mode used by the next recognition
    pub fn set_recognition_mode(&mut self, value: i64) -> Result<()> {
        self.mode = RecognitionMode::new(value)?;
        debug!("Recognition mode set to {}", self.mode);
        Ok(())
    }

    pub fn recognition_mode(&self) -> RecognitionMode {
        self.mode
    }

    /// Binarize the loaded image and run the engine on it
    pub fn recognize(&mut self) -> Result<&str> {
        let image = self.session.image().ok_or(OcrError::NoImageLoaded)?;

        let binary = preprocess(&image.image)?;
        let text = self.engine.recognize(&binary, &self.languages, self.mode)?;
        info!(
            "Recognized {} characters from {:?} ({})",
            text.chars().count(),
            image.path,
            self.mode
        );

        // Only a successful run replaces the session
        self.session = std::mem::take(&mut self.session).with_text(text);
        Ok(self.text().unwrap_or_default())
    }

    /// Serialize the current text; refuses to create a file when there is none
    pub fn export_text(&self, format: ExportFormat, destination: impl AsRef<Path>) -> Result<()> {
        let destination = destination.as_ref();
        let text = match self.text() {
            Some(text) if !text.is_empty() => text,
            _ => return Err(OcrError::EmptyResult),
        };

        self.exporters.writer(format).write(text, destination)?;
        info!("Exported {} to {:?}", format, destination);
        Ok(())
    }

    /// Replace the recognized text with a user-edited version
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<()> {
        if self.session.image().is_none() {
            return Err(OcrError::NoImageLoaded);
        }
        self.session = std::mem::take(&mut self.session).with_text(text.into());
        Ok(())
    }

    /// Last recognized (or edited) text
    pub fn text(&self) -> Option<&str> {
        match &self.session {
            Session::HasResult { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn image_path(&self) -> Option<&Path> {
        self.session.image().map(|i| i.path.as_path())
    }

    pub fn image_dimensions(&self) -> Option<(u32, u32)> {
        self.session.image().map(|i| (i.image.width(), i.image.height()))
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session {
        &self.session
    }
}
