use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::OcrConfig;
use crate::error::{PipelineError, Result};

#[cfg(windows)]
const EXECUTABLE_NAME: &str = "tesseract.exe";
#[cfg(not(windows))]
const EXECUTABLE_NAME: &str = "tesseract";

#[cfg(windows)]
const COMMON_INSTALL_DIRS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR",
    r"C:\Program Files (x86)\Tesseract-OCR",
];
#[cfg(not(windows))]
const COMMON_INSTALL_DIRS: &[&str] = &["/usr/bin", "/usr/local/bin", "/opt/homebrew/bin"];

#[cfg(windows)]
const COMMON_TESSDATA_DIRS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
];
#[cfg(not(windows))]
const COMMON_TESSDATA_DIRS: &[&str] = &[
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
];

/// Finds the Tesseract executable.
///
/// Order: explicit config path, PATH, then common installation directories.
pub fn find_tesseract_executable(config: &OcrConfig) -> Result<PathBuf> {
    if let Some(path) = &config.tesseract_path {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
        log::warn!("Configured tesseract_path {} does not exist", p.display());
    }

    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for dir in COMMON_INSTALL_DIRS {
        let p = Path::new(dir).join(EXECUTABLE_NAME);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(PipelineError::TesseractNotFound(
        "install Tesseract-OCR or set ocr.tesseract_path in config.json".to_string(),
    ))
}

/// Finds a tessdata directory that contains the configured language.
///
/// Returns `None` when nothing is found; tesseract then falls back to its
/// compiled-in default location.
pub fn find_tessdata_dir(config: &OcrConfig) -> Option<PathBuf> {
    let traineddata = format!("{}.traineddata", config.language);
    let has_language = |dir: &Path| dir.join(&traineddata).exists();

    if let Some(dir) = &config.tessdata_dir {
        let p = PathBuf::from(dir);
        if has_language(&p) {
            return Some(p);
        }
        log::warn!(
            "Configured tessdata_dir {} has no {}",
            p.display(),
            traineddata
        );
    }

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if has_language(&p) {
            return Some(p);
        }
        let p = p.join("tessdata");
        if has_language(&p) {
            return Some(p);
        }
    }

    COMMON_TESSDATA_DIRS
        .iter()
        .map(PathBuf::from)
        .find(|p| has_language(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_configured_executable_wins() {
        let dir = tempdir().unwrap();
        let exe = dir.path().join(EXECUTABLE_NAME);
        std::fs::write(&exe, "").unwrap();
        let config = OcrConfig {
            tesseract_path: Some(exe.to_string_lossy().to_string()),
            ..OcrConfig::default()
        };

        assert_eq!(find_tesseract_executable(&config).unwrap(), exe);
    }

    #[test]
    fn test_configured_tessdata_requires_language_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("deu.traineddata"), "").unwrap();
        let config = OcrConfig {
            tessdata_dir: Some(dir.path().to_string_lossy().to_string()),
            language: "deu".to_string(),
            ..OcrConfig::default()
        };

        assert_eq!(find_tessdata_dir(&config), Some(dir.path().to_path_buf()));
    }
}
