//! Combat-meter telemetry extraction and parse diagnostics.
//!
//! Screenshots of a meter overlay, or timestamped cast logs, are normalized
//! into a [`ParseMetrics`] record which the diagnostic engine turns into
//! severity-tagged issues and an overall rating.

pub mod analysis;
pub mod combat_log;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod ocr;
pub mod paths;
pub mod validate;

pub use analysis::analyze_parse;
pub use combat_log::{classify_weaving, metrics_from_log, parse_log};
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use model::{AnalysisResult, Issue, ParseMetrics, Rating, Severity};
pub use ocr::{process_screenshot, process_screenshots, ImageSource, ScreenType, ScreenshotRequest};
pub use validate::{validate_completeness, CompletenessReport};
