//! ScanScribe - recognize text in scanned images
//!
//! Loads an image, binarizes it, runs Tesseract with the selected
//! page-segmentation mode and exports the text to TXT, DOCX or PDF.

mod config;
mod controller;
mod error;
mod export;
mod vision;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::AppConfig;
use crate::controller::{RecognitionController, SUPPORTED_EXTENSIONS};
use crate::export::{ExportFormat, Exporters};
use crate::vision::{RecognitionMode, TesseractCli};

/// ScanScribe - image to text
#[derive(Parser, Debug)]
#[command(name = "scanscribe")]
#[command(about = "Recognize text in an image and export it to TXT, DOCX or PDF")]
struct Args {
    /// Image to recognize (PNG, JPEG or BMP)
    #[arg(required_unless_present_any = ["list_modes", "init_config"])]
    image: Option<PathBuf>,

    /// Page-segmentation mode (0-13)
    #[arg(short, long, allow_negative_numbers = true)]
    psm: Option<i64>,

    /// Write the text as UTF-8 plain text
    #[arg(long, value_name = "PATH")]
    txt: Option<PathBuf>,

    /// Write the text as a DOCX document
    #[arg(long, value_name = "PATH")]
    docx: Option<PathBuf>,

    /// Write the text as a PDF document
    #[arg(long, value_name = "PATH")]
    pdf: Option<PathBuf>,

    /// Export to a path whose extension selects the format (repeatable)
    #[arg(short, long, value_name = "PATH")]
    output: Vec<PathBuf>,

    /// Configuration file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Open the recognized text in $VISUAL or $EDITOR before exporting
    #[arg(short, long)]
    edit: bool,

    /// Do not print the recognized text
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// List recognition modes and exit
    #[arg(long)]
    list_modes: bool,

    /// Write a default configuration file and exit
    #[arg(long)]
    init_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.list_modes {
        println!("Recognition modes:");
        for mode in RecognitionMode::all() {
            let marker = if mode == RecognitionMode::default() { " (default)" } else { "" };
            println!("  {:>2}  {}{}", mode.value(), mode.description(), marker);
        }
        return Ok(());
    }

    if args.init_config {
        let path = match &args.config {
            Some(path) => path.clone(),
            None => config::get_config_dir()?.join("config.toml"),
        };
        config::save_config(&AppConfig::default(), &path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = load_or_create_config(args.config.as_deref())?;
    run(&args, config)
}

/// Load configuration from file or fall back to defaults
fn load_or_create_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let mut config = match explicit {
        // An explicitly requested file must exist and parse
        Some(path) => {
            let config = config::load_config(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => default_location_config(),
    };
    config.apply_env();
    Ok(config)
}

fn default_location_config() -> AppConfig {
    if let Ok(config_dir) = config::get_config_dir() {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            match config::load_config(&config_path) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", config_path);
                    return config;
                }
                Err(e) => warn!("Ignoring configuration: {:#}", e),
            }
        }
    }
    info!("Using default configuration");
    AppConfig::default()
}

/// Load → recognize → export
fn run(args: &Args, config: AppConfig) -> Result<()> {
    let Some(image) = args.image.as_deref() else {
        bail!("no image given");
    };

    let engine = TesseractCli::new(config.ocr.tesseract_cmd.clone())
        .with_tessdata_dir(config.ocr.tessdata_dir.clone());
    let mut controller = RecognitionController::new(engine)
        .with_mode(config.ocr.default_mode)
        .with_languages(config.ocr.languages.clone())
        .with_exporters(Exporters::new(config.export.pdf.clone()));

    if let Some(psm) = args.psm {
        controller.set_recognition_mode(psm)?;
    }

    let known = image
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    if !known {
        warn!("{:?} is not a PNG, JPEG or BMP file; trying to decode anyway", image);
    }

    controller
        .load_image(image)
        .with_context(|| format!("Could not load {}", image.display()))?;
    if let (Some(path), Some((width, height))) = (controller.image_path(), controller.image_dimensions()) {
        info!("Recognizing {:?} ({}x{}) with {}", path, width, height, controller.recognition_mode());
    }
    let recognized = controller.recognize()?.to_string();

    if args.edit {
        let edited = edit_text(&recognized, &default_editor())?;
        if edited != recognized {
            info!("Using edited text ({} characters)", edited.chars().count());
        }
        controller.set_text(edited)?;
    }

    if !args.quiet {
        if let Some(text) = controller.text() {
            println!("{text}");
        }
    }

    for (format, path) in export_targets(args)? {
        controller
            .export_text(format, &path)
            .with_context(|| format!("Export to {} failed", path.display()))?;
        println!("Saved {} to {}", format, path.display());
    }

    Ok(())
}

fn default_editor() -> String {
    std::env::var("VISUAL")
        .or_else(|_| std::env::var("EDITOR"))
        .unwrap_or_else(|_| if cfg!(windows) { "notepad" } else { "vi" }.to_string())
}

/// Round-trip `initial` through an editor command and return what was saved
fn edit_text(initial: &str, editor: &str) -> Result<String> {
    let mut parts = editor.split_whitespace();
    let Some(program) = parts.next() else {
        bail!("editor command is empty");
    };

    let mut file = tempfile::Builder::new()
        .prefix("scanscribe-")
        .suffix(".txt")
        .tempfile()?;
    file.write_all(initial.as_bytes())?;
    file.flush()?;

    let status = Command::new(program)
        .args(parts)
        .arg(file.path())
        .status()
        .with_context(|| format!("Could not start editor {program:?}"))?;
    if !status.success() {
        bail!("Editor {program:?} exited with {status}");
    }

    // Editors may replace the file rather than rewrite it
    std::fs::read_to_string(file.path()).context("Could not read edited text")
}

/// Collect requested exports, giving format-specific paths their extension
fn export_targets(args: &Args) -> Result<Vec<(ExportFormat, PathBuf)>> {
    let mut targets = Vec::new();

    let named = [
        (ExportFormat::Txt, &args.txt),
        (ExportFormat::Docx, &args.docx),
        (ExportFormat::Pdf, &args.pdf),
    ];
    for (format, path) in named {
        if let Some(path) = path {
            targets.push((format, format.with_extension(path)));
        }
    }

    for path in &args.output {
        targets.push((ExportFormat::from_path(path)?, path.clone()));
    }

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_exports() {
        let args = Args::try_parse_from([
            "scanscribe", "scan.png", "--psm", "4", "--txt", "out", "--pdf", "out.pdf", "-o", "copy.docx",
        ])
        .unwrap();

        assert_eq!(args.psm, Some(4));
        let targets = export_targets(&args).unwrap();
        assert_eq!(
            targets,
            vec![
                (ExportFormat::Txt, PathBuf::from("out.txt")),
                (ExportFormat::Pdf, PathBuf::from("out.pdf")),
                (ExportFormat::Docx, PathBuf::from("copy.docx")),
            ]
        );
    }

    #[test]
    fn test_cli_rejects_unknown_output_extension() {
        let args = Args::try_parse_from(["scanscribe", "scan.png", "-o", "copy.odt"]).unwrap();
        assert!(export_targets(&args).is_err());
    }

    #[test]
    fn test_cli_requires_image() {
        assert!(Args::try_parse_from(["scanscribe"]).is_err());
        assert!(Args::try_parse_from(["scanscribe", "--list-modes"]).is_ok());
    }

    #[test]
    #[cfg(unix)]
    fn test_edit_unchanged_when_editor_saves_nothing() {
        let text = edit_text("Helo world\nПривет", "true").unwrap();
        assert_eq!(text, "Helo world\nПривет");
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_edit_reads_back_changes() {
        let text = edit_text("Helo world", "sed -i s/Helo/Hello/").unwrap();
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn test_edit_missing_editor_fails() {
        assert!(edit_text("x", "scanscribe-no-such-editor").is_err());
        assert!(edit_text("x", "   ").is_err());
    }

    #[test]
    #[cfg(unix)]
    fn test_edit_failing_editor_fails() {
        assert!(edit_text("x", "false").is_err());
    }

    #[test]
    fn test_cli_edit_flag() {
        let args = Args::try_parse_from(["scanscribe", "scan.png", "--edit", "-q"]).unwrap();
        assert!(args.edit);
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_keeps_negative_mode_for_validation() {
        let args = Args::try_parse_from(["scanscribe", "scan.png", "--psm", "-1"]).unwrap();
        assert_eq!(args.psm, Some(-1));
    }
}
