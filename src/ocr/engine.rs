use image::GrayImage;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::{find_tessdata_dir, find_tesseract_executable};
use crate::config::OcrConfig;
use crate::error::{PipelineError, Result};
use crate::model::RawRecognition;

/// A text recognition backend.
///
/// Implementations return best-effort text and a confidence in [0, 100].
/// Low confidence is not an error; only a failure to run the engine is.
pub trait Recognizer: Send + Sync {
    fn name(&self) -> &str;
    fn recognize(&self, img: &GrayImage) -> Result<RawRecognition>;
}

/// Runs the tesseract executable as a subprocess.
pub struct TesseractRecognizer {
    executable: PathBuf,
    tessdata: Option<PathBuf>,
    language: String,
    page_segmentation_mode: u8,
}

impl TesseractRecognizer {
    /// Locates tesseract and its language data according to `config`.
    pub fn from_config(config: &OcrConfig) -> Result<Self> {
        let executable = find_tesseract_executable(config)?;
        let tessdata = find_tessdata_dir(config);
        log::debug!(
            "Using tesseract at {} (tessdata: {})",
            executable.display(),
            tessdata
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "default".to_string())
        );
        Ok(Self {
            executable,
            tessdata,
            language: config.language.clone(),
            page_segmentation_mode: config.page_segmentation_mode,
        })
    }
}

impl Recognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, img: &GrayImage) -> Result<RawRecognition> {
        let session = OcrSession::open(img)?;
        session.run(self)
    }
}

/// Per-call engine state: the temporary input image and output files.
///
/// Everything the session creates is removed when it is dropped, on both
/// the success and the error path.
struct OcrSession {
    input: NamedTempFile,
    output_base: NamedTempFile,
}

impl OcrSession {
    fn open(img: &GrayImage) -> Result<Self> {
        let input = NamedTempFile::with_suffix(".png")?;
        img.save(input.path()).map_err(|e| {
            PipelineError::Recognition(format!("failed to write engine input: {}", e))
        })?;
        let output_base = NamedTempFile::new()?;
        Ok(Self { input, output_base })
    }

    fn output_path(&self, extension: &str) -> PathBuf {
        let mut path = self.output_base.path().as_os_str().to_owned();
        path.push(".");
        path.push(extension);
        PathBuf::from(path)
    }

    fn run(&self, engine: &TesseractRecognizer) -> Result<RawRecognition> {
        let mut command = Command::new(&engine.executable);
        command
            .arg(self.input.path())
            .arg(self.output_base.path())
            .arg("-l")
            .arg(&engine.language)
            .arg("--psm")
            .arg(engine.page_segmentation_mode.to_string())
            // Column alignment separates "Bar 1 Time" from "Bar 2 Time"
            .arg("-c")
            .arg("preserve_interword_spaces=1");
        if let Some(tessdata) = &engine.tessdata {
            command.arg("--tessdata-dir").arg(tessdata);
        }
        // Plain text keeps spacing; TSV carries per-word confidence
        command.arg("txt").arg("tsv");

        let output = command.output().map_err(|e| {
            PipelineError::Recognition(format!(
                "failed to start {}: {}",
                engine.executable.display(),
                e
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::Recognition(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let tsv = read_output(&self.output_path("tsv"))?;
        let words = parse_tsv_words(&tsv);
        let plain = std::fs::read_to_string(self.output_path("txt")).ok();
        let text = recognized_text(plain, &words);

        Ok(RawRecognition {
            text,
            confidence: mean_confidence(&words),
        })
    }
}

impl Drop for OcrSession {
    fn drop(&mut self) {
        for extension in ["txt", "tsv"] {
            let _ = std::fs::remove_file(self.output_path(extension));
        }
    }
}

fn read_output(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        PipelineError::Recognition(format!("failed to read {}: {}", path.display(), e))
    })
}

/// A single recognized word from tesseract's TSV output.
#[derive(Debug, Clone, PartialEq)]
struct TsvWord {
    line_key: (i32, i32, i32),
    text: String,
    confidence: f32,
}

/// Extracts word rows (level 5) with a valid confidence from TSV output.
fn parse_tsv_words(tsv: &str) -> Vec<TsvWord> {
    let mut words = Vec::new();

    for line in tsv.lines().skip(1) {
        // TSV fields: level, page_num, block_num, par_num, line_num, word_num,
        //             left, top, width, height, conf, text
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        let level: i32 = fields[0].parse().unwrap_or(-1);
        if level != 5 {
            continue;
        }

        let text = fields[11].trim();
        let confidence: f32 = fields[10].trim().parse().unwrap_or(-1.0);
        if text.is_empty() || confidence < 0.0 {
            continue;
        }

        let key = |i: usize| fields[i].parse::<i32>().unwrap_or(-1);
        words.push(TsvWord {
            line_key: (key(2), key(3), key(4)),
            text: text.to_string(),
            confidence,
        });
    }

    words
}

/// Mean word confidence, clamped to [0, 100]. Zero when nothing was recognized.
fn mean_confidence(words: &[TsvWord]) -> f32 {
    if words.is_empty() {
        return 0.0;
    }
    let sum: f32 = words.iter().map(|w| w.confidence).sum();
    (sum / words.len() as f32).clamp(0.0, 100.0)
}

/// Prefers the plain-text output, whose column spacing the extractors rely on.
/// Falls back to the TSV words when it is missing or blank.
fn recognized_text(plain: Option<String>, words: &[TsvWord]) -> String {
    match plain {
        Some(text) if !text.trim().is_empty() => text,
        _ => join_words_by_line(words),
    }
}

/// Rebuilds text from TSV words, one output line per tesseract line.
fn join_words_by_line(words: &[TsvWord]) -> String {
    let mut text = String::new();
    let mut current_line = None;

    for word in words {
        if current_line != Some(word.line_key) {
            if current_line.is_some() {
                text.push('\n');
            }
            current_line = Some(word.line_key);
        } else {
            text.push(' ');
        }
        text.push_str(&word.text);
    }

    text
}
