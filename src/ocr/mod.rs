pub mod engine;
pub mod extract;
pub mod fields;
pub mod preprocess;
pub mod setup;

pub use engine::{Recognizer, TesseractRecognizer};
pub use extract::{extract_abilities, extract_info, extract_parse};
pub use preprocess::normalize_for_ocr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::OcrConfig;
use crate::error::{PipelineError, Result};
use crate::model::{ParseMetrics, RawRecognition};

/// Which meter panel a screenshot shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenType {
    /// Character sheet / stat summary.
    Info,
    /// Per-ability damage breakdown.
    Parse,
    /// Unknown: run both extractors and merge.
    #[default]
    Auto,
}

impl FromStr for ScreenType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(ScreenType::Info),
            "parse" => Ok(ScreenType::Parse),
            "auto" => Ok(ScreenType::Auto),
            other => Err(format!(
                "unknown screen type '{}' (expected info, parse or auto)",
                other
            )),
        }
    }
}

impl fmt::Display for ScreenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScreenType::Info => "info",
            ScreenType::Parse => "parse",
            ScreenType::Auto => "auto",
        };
        f.write_str(name)
    }
}

/// Where the screenshot bytes come from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl ImageSource {
    fn read(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            ImageSource::Path(path) => Ok(Cow::Owned(std::fs::read(path)?)),
            ImageSource::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
        }
    }

    fn describe(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScreenshotRequest {
    pub source: ImageSource,
    pub screen_type: ScreenType,
}

/// Result of processing one screenshot. Failures are reported, never raised.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ParseMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of processing a batch of screenshots into one merged record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ParseMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs the extractor(s) for `screen_type` over recognized text.
///
/// `Auto` runs both layouts and overlays the Parse result onto the Info result.
pub fn extract_for(screen_type: ScreenType, text: &str) -> ParseMetrics {
    match screen_type {
        ScreenType::Info => extract_info(text),
        ScreenType::Parse => extract_parse(text),
        ScreenType::Auto => {
            let mut metrics = extract_info(text);
            metrics.merge_from(&extract_parse(text));
            metrics
        }
    }
}

/// Normalize, recognize, extract. Errors propagate to the caller.
fn recognize_and_extract(
    source: &ImageSource,
    screen_type: ScreenType,
    recognizer: &dyn Recognizer,
    config: &OcrConfig,
) -> Result<(ParseMetrics, RawRecognition)> {
    let bytes = source.read()?;
    let preprocessed = normalize_for_ocr(&bytes, config)?;
    let recognition = recognizer.recognize(&preprocessed)?;

    if recognition.confidence < config.low_confidence_threshold {
        log::warn!(
            "{}: low OCR confidence {:.0}% from {}",
            source.describe(),
            recognition.confidence,
            recognizer.name()
        );
    }

    let metrics = extract_for(screen_type, &recognition.text);
    if metrics.is_empty() {
        log::warn!(
            "{}: no fields recognized as {} screen",
            source.describe(),
            screen_type
        );
    }

    Ok((metrics, recognition))
}

/// High-level function: one screenshot → metrics.
pub fn process_screenshot(
    source: &ImageSource,
    screen_type: ScreenType,
    recognizer: &dyn Recognizer,
    config: &OcrConfig,
) -> ScreenshotOutcome {
    log::info!("Processing {} as {} screen", source.describe(), screen_type);

    match recognize_and_extract(source, screen_type, recognizer, config) {
        Ok((metrics, recognition)) => ScreenshotOutcome {
            success: true,
            data: Some(metrics),
            raw_text: Some(recognition.text),
            confidence: Some(recognition.confidence),
            error: None,
        },
        Err(e) => {
            log::error!("{}: {}", source.describe(), e);
            ScreenshotOutcome {
                success: false,
                error: Some(e.to_string()),
                ..Default::default()
            }
        }
    }
}

/// Processes several screenshots concurrently and merges them in input order.
///
/// If any screenshot fails the whole batch fails and the error lists every
/// failure; a record merged from a partial batch is not safe to analyze.
/// Merge is last-write-wins per field; confidence is the mean over inputs.
pub fn process_screenshots(
    requests: &[ScreenshotRequest],
    recognizer: &dyn Recognizer,
    config: &OcrConfig,
) -> BatchOutcome {
    if requests.is_empty() {
        return BatchOutcome {
            success: false,
            error: Some("no screenshots provided".to_string()),
            ..Default::default()
        };
    }

    log::info!("Processing batch of {} screenshots", requests.len());

    // `collect` keeps input order regardless of completion order
    let results: Vec<Result<(ParseMetrics, RawRecognition)>> = requests
        .par_iter()
        .map(|req| recognize_and_extract(&req.source, req.screen_type, recognizer, config))
        .collect();

    let failures: Vec<String> = requests
        .iter()
        .zip(&results)
        .filter_map(|(req, result)| {
            result
                .as_ref()
                .err()
                .map(|e| format!("{}: {}", req.source.describe(), e))
        })
        .collect();

    if !failures.is_empty() {
        let error = PipelineError::Batch(failures);
        log::error!("{}", error);
        return BatchOutcome {
            success: false,
            error: Some(error.to_string()),
            ..Default::default()
        };
    }

    let mut merged = ParseMetrics::default();
    let mut confidence_sum = 0.0f32;
    for (metrics, recognition) in results.into_iter().flatten() {
        merged.merge_from(&metrics);
        confidence_sum += recognition.confidence;
    }

    BatchOutcome {
        success: true,
        data: Some(merged),
        confidence: Some(confidence_sum / requests.len() as f32),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, ImageFormat, Rgba};
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns canned text keyed by image width, so each test image maps to one reading.
    struct FakeRecognizer {
        by_width: HashMap<u32, RawRecognition>,
        calls: AtomicUsize,
    }

    impl FakeRecognizer {
        fn new(entries: &[(u32, &str, f32)]) -> Self {
            let by_width = entries
                .iter()
                .map(|&(w, text, confidence)| {
                    (
                        w,
                        RawRecognition {
                            text: text.to_string(),
                            confidence,
                        },
                    )
                })
                .collect();
            Self {
                by_width,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Recognizer for FakeRecognizer {
        fn name(&self) -> &str {
            "fake"
        }

        fn recognize(&self, img: &GrayImage) -> Result<RawRecognition> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.by_width
                .get(&img.width())
                .cloned()
                .ok_or_else(|| PipelineError::Recognition("no canned text".to_string()))
        }
    }

    /// Config that never upscales, so image width identifies the input.
    fn config() -> OcrConfig {
        OcrConfig {
            target_width: 1,
            ..OcrConfig::default()
        }
    }

    fn png(width: u32) -> ImageSource {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(width, 10, Rgba([30, 30, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        ImageSource::Bytes(bytes)
    }

    #[test]
    fn test_screen_type_from_str() {
        assert_eq!("info".parse::<ScreenType>(), Ok(ScreenType::Info));
        assert_eq!("PARSE".parse::<ScreenType>(), Ok(ScreenType::Parse));
        assert_eq!(" auto ".parse::<ScreenType>(), Ok(ScreenType::Auto));
        assert!("both".parse::<ScreenType>().is_err());
    }

    #[test]
    fn test_single_screenshot_success() {
        let recognizer = FakeRecognizer::new(&[(40, "DPS 150,000\nActive Time 1:40", 87.0)]);

        let outcome = process_screenshot(&png(40), ScreenType::Info, &recognizer, &config());

        assert!(outcome.success);
        let data = outcome.data.unwrap();
        assert_eq!(data.dps, Some(150_000.0));
        assert_eq!(data.active_time_seconds, Some(100.0));
        assert_eq!(outcome.confidence, Some(87.0));
        assert!(outcome.raw_text.unwrap().contains("DPS"));
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_single_screenshot_decode_failure_is_reported() {
        let recognizer = FakeRecognizer::new(&[]);
        let source = ImageSource::Bytes(b"not a png".to_vec());

        let outcome = process_screenshot(&source, ScreenType::Auto, &recognizer, &config());

        assert!(!outcome.success);
        assert!(outcome.data.is_none());
        assert!(outcome.error.unwrap().contains("preprocessing"));
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_single_screenshot_missing_file_is_reported() {
        let recognizer = FakeRecognizer::new(&[]);
        let source = ImageSource::Path(PathBuf::from("/nonexistent/screenshot.png"));

        let outcome = process_screenshot(&source, ScreenType::Info, &recognizer, &config());

        assert!(!outcome.success);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn test_low_confidence_is_not_a_failure() {
        let recognizer = FakeRecognizer::new(&[(40, "DPS 90000", 12.0)]);

        let outcome = process_screenshot(&png(40), ScreenType::Info, &recognizer, &config());

        assert!(outcome.success);
        assert_eq!(outcome.confidence, Some(12.0));
    }

    #[test]
    fn test_auto_merges_both_layouts() {
        let text = "DPS 150,000\nPenetration 19000\n(1) Big Skill  30.0%  9  300,000\n";
        let info_only = extract_for(ScreenType::Info, text);
        let auto = extract_for(ScreenType::Auto, text);

        assert!(info_only.abilities.is_none());
        assert_eq!(auto.dps, Some(150_000.0));
        assert_eq!(auto.penetration.unwrap().effective, 19_000.0);
        assert_eq!(auto.abilities.unwrap().len(), 1);
    }

    #[test]
    fn test_batch_merges_in_input_order() {
        let recognizer = FakeRecognizer::new(&[
            (40, "DPS 120,000\nActive Time 2:00\nCrit Chance 55%", 80.0),
            (50, "DPS 125,000\n(1) Big Skill  30.0%  9  300,000", 60.0),
        ]);
        let requests = vec![
            ScreenshotRequest {
                source: png(40),
                screen_type: ScreenType::Info,
            },
            ScreenshotRequest {
                source: png(50),
                screen_type: ScreenType::Parse,
            },
        ];

        let outcome = process_screenshots(&requests, &recognizer, &config());

        assert!(outcome.success);
        let data = outcome.data.unwrap();
        assert_eq!(data.dps, Some(125_000.0));
        assert_eq!(data.active_time_seconds, Some(120.0));
        assert_eq!(data.critical_chance_percent, Some(55.0));
        assert_eq!(data.abilities.unwrap()[0].name, "Big Skill");
        assert_eq!(outcome.confidence, Some(70.0));
    }

    #[test]
    fn test_batch_fails_if_any_image_fails() {
        let recognizer = FakeRecognizer::new(&[(40, "DPS 120,000", 80.0)]);
        let requests = vec![
            ScreenshotRequest {
                source: png(40),
                screen_type: ScreenType::Info,
            },
            ScreenshotRequest {
                source: ImageSource::Bytes(b"broken".to_vec()),
                screen_type: ScreenType::Info,
            },
        ];

        let outcome = process_screenshots(&requests, &recognizer, &config());

        assert!(!outcome.success);
        assert!(outcome.data.is_none());
        let error = outcome.error.unwrap();
        assert!(error.starts_with("1 screenshot(s) failed"));
        assert!(error.contains("<6 bytes>"));
    }

    #[test]
    fn test_batch_lists_every_failure() {
        let recognizer = FakeRecognizer::new(&[]);
        let requests = vec![
            ScreenshotRequest {
                source: png(40),
                screen_type: ScreenType::Info,
            },
            ScreenshotRequest {
                source: png(50),
                screen_type: ScreenType::Parse,
            },
        ];

        let outcome = process_screenshots(&requests, &recognizer, &config());

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().starts_with("2 screenshot(s) failed"));
    }

    #[test]
    fn test_empty_batch_fails() {
        let recognizer = FakeRecognizer::new(&[]);
        let outcome = process_screenshots(&[], &recognizer, &config());
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("no screenshots provided"));
    }
}
