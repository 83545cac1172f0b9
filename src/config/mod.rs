//! Application Configuration
//!
//! User settings stored in TOML format, with environment overrides for the
//! OCR engine location.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::export::PdfSettings;
use crate::vision::ocr::{LanguageSet, RecognitionMode};

/// Environment variables checked, in order, for the engine executable
pub const TESSERACT_ENV_VARS: &[&str] = &["SCANSCRIBE_TESSERACT", "TESSERACT_CMD"];

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// OCR engine settings
    pub ocr: OcrSettings,
    /// Export settings
    pub export: ExportSettings,
}

/// OCR engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Tesseract executable, either a full path or a name on PATH
    pub tesseract_cmd: PathBuf,
    /// Custom directory holding `*.traineddata`
    pub tessdata_dir: Option<PathBuf>,
    /// Page-segmentation mode used when none is given
    pub default_mode: RecognitionMode,
    /// Languages enabled together
    pub languages: LanguageSet,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            tesseract_cmd: PathBuf::from("tesseract"),
            tessdata_dir: None,
            default_mode: RecognitionMode::default(),
            languages: LanguageSet::default(),
        }
    }
}

/// Export-related settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub pdf: PdfSettings,
}

impl AppConfig {
    /// Apply environment overrides on top of file settings
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let found = TESSERACT_ENV_VARS
            .iter()
            .find_map(|key| lookup(key).filter(|v| !v.trim().is_empty()).map(|v| (*key, v)));
        if let Some((key, value)) = found {
            info!("Using tesseract from {}: {}", key, value);
            self.ocr.tesseract_cmd = PathBuf::from(value);
        }
    }
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "scanscribe", "ScanScribe")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    Ok(proj_dirs.config_dir().to_path_buf())
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {path:?}"))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Invalid config {path:?}"))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        assert_eq!(config.ocr.tesseract_cmd, PathBuf::from("tesseract"));
        assert!(config.ocr.tessdata_dir.is_none());
        assert_eq!(config.ocr.languages.to_arg(), "eng+rus");
        assert_eq!(config.ocr.default_mode.value(), 6);

        assert!(config.export.pdf.font_path.is_none());
        assert!((config.export.pdf.font_size - 12.0).abs() < 0.01);
        assert!((config.export.pdf.bottom_margin_mm - 15.0).abs() < 0.01);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = AppConfig::default();
        config.ocr.tessdata_dir = Some(PathBuf::from("/opt/tessdata"));
        config.ocr.default_mode = RecognitionMode::new(4).unwrap();

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.ocr.tessdata_dir, config.ocr.tessdata_dir);
        assert_eq!(parsed.ocr.default_mode, config.ocr.default_mode);
        assert_eq!(parsed.ocr.languages, config.ocr.languages);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [ocr]
            tesseract_cmd = 'E:\Tesseract\tesseract.exe'

            [export.pdf]
            font_size = 10.0
            "#,
        )
        .unwrap();

        assert_eq!(parsed.ocr.tesseract_cmd, PathBuf::from(r"E:\Tesseract\tesseract.exe"));
        assert_eq!(parsed.ocr.default_mode.value(), 6);
        assert!((parsed.export.pdf.font_size - 10.0).abs() < 0.01);
        assert!((parsed.export.pdf.line_height_mm - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_out_of_range_default_mode_rejected() {
        let result: std::result::Result<AppConfig, _> = toml::from_str("[ocr]\ndefault_mode = 14\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.export.pdf.font_path = Some(PathBuf::from("/fonts/DejaVuSans.ttf"));

        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();

        assert_eq!(loaded.export.pdf.font_path, config.export.pdf.font_path);
        assert_eq!(loaded.ocr.tesseract_cmd, config.ocr.tesseract_cmd);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_env_override_order() {
        let mut config = AppConfig::default();
        config.apply_env_with(|key| match key {
            "SCANSCRIBE_TESSERACT" => Some("/custom/tesseract".to_string()),
            "TESSERACT_CMD" => Some("/other/tesseract".to_string()),
            _ => None,
        });
        assert_eq!(config.ocr.tesseract_cmd, PathBuf::from("/custom/tesseract"));

        let mut config = AppConfig::default();
        config.apply_env_with(|key| match key {
            "SCANSCRIBE_TESSERACT" => Some("  ".to_string()),
            "TESSERACT_CMD" => Some("/other/tesseract".to_string()),
            _ => None,
        });
        assert_eq!(config.ocr.tesseract_cmd, PathBuf::from("/other/tesseract"));
    }

    #[test]
    fn test_env_absent_keeps_file_value() {
        let mut config = AppConfig::default();
        config.ocr.tesseract_cmd = PathBuf::from("/from/file");
        config.apply_env_with(|_| None);
        assert_eq!(config.ocr.tesseract_cmd, PathBuf::from("/from/file"));
    }
}
