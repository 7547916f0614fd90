//! Pipeline configuration.
//!
//! Loaded from config.json at startup. Every field has a default, so a
//! partial file only overrides what it names and a missing file is not an error.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// OCR preprocessing and tesseract settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Images narrower than this are upscaled to it; wider images are left alone.
    pub target_width: u32,
    /// Gaussian sigma of the unsharp mask.
    pub sharpen_sigma: f32,
    /// Minimum brightness difference the unsharp mask will amplify.
    pub sharpen_threshold: i32,
    /// Explicit tesseract executable; discovered on PATH when unset.
    pub tesseract_path: Option<String>,
    /// Explicit tessdata directory; discovered when unset.
    pub tessdata_dir: Option<String>,
    pub language: String,
    /// Tesseract page segmentation mode (6 = single uniform block of text).
    pub page_segmentation_mode: u8,
    /// Recognitions below this confidence are logged as warnings.
    pub low_confidence_threshold: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            target_width: 2000,
            sharpen_sigma: 1.0,
            sharpen_threshold: 2,
            tesseract_path: None,
            tessdata_dir: None,
            language: "eng".to_string(),
            page_segmentation_mode: 6,
            low_confidence_threshold: 60.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of error, warn, info, debug, trace.
    pub level: String,
    /// Also append log lines to `<exe_dir>/logs/parse_analyzer.log`.
    pub log_to_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: true,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub ocr: OcrConfig,
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    /// Load config from file, or fall back to defaults if it is missing or malformed.
    ///
    /// Runs before the logger exists, so the reason for a fallback is returned
    /// alongside the config for the caller to log once logging is up.
    pub fn load(config_path: &Path) -> (Self, Option<String>) {
        if !config_path.exists() {
            return (
                Self::default(),
                Some(format!(
                    "{} not found. Using default config.",
                    config_path.display()
                )),
            );
        }

        match fs::read_to_string(config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => (config, None),
                Err(e) => (
                    Self::default(),
                    Some(format!(
                        "Failed to parse {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    )),
                ),
            },
            Err(e) => (
                Self::default(),
                Some(format!(
                    "Failed to read {}: {}. Using defaults.",
                    config_path.display(),
                    e
                )),
            ),
        }
    }
}
