//! Parse Analyzer
//!
//! Command-line front end for the telemetry pipeline: reads meter screenshots
//! or cast logs, extracts metrics, and prints diagnostics as JSON.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::any::Any;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use parse_analyzer::analysis::export_to_json;
use parse_analyzer::combat_log::{LogParseResult, WeaveReport};
use parse_analyzer::ocr::{BatchOutcome, ScreenshotOutcome, TesseractRecognizer};
use parse_analyzer::{
    analyze_parse, classify_weaving, logging, metrics_from_log, parse_log, paths,
    process_screenshot, process_screenshots, validate_completeness, AnalysisResult,
    CompletenessReport, ImageSource, ParseMetrics, PipelineConfig, ScreenType, ScreenshotRequest,
};

#[derive(Debug, Parser)]
#[command(name = "parse-analyzer")]
#[command(about = "Extract combat parse metrics from meter screenshots and logs, then diagnose them", version)]
struct Cli {
    /// Config file (defaults to config.json next to the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write the JSON result to this file
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract metrics from one screenshot
    Screenshot {
        path: PathBuf,
        #[arg(long = "type", default_value = "auto")]
        screen_type: ScreenType,
    },
    /// Extract and merge metrics from several screenshots (PATH or PATH:TYPE)
    Batch {
        #[arg(required = true)]
        images: Vec<String>,
    },
    /// Parse a timestamped cast log and classify weaving
    Log { path: PathBuf },
    /// Check a metrics JSON file for missing critical fields
    Validate { metrics: PathBuf },
    /// Diagnose a parse from a metrics file, screenshots and/or a cast log
    Analyze {
        #[arg(long)]
        metrics: Option<PathBuf>,
        /// Screenshot as PATH or PATH:TYPE; may be repeated
        #[arg(long = "screenshot")]
        screenshots: Vec<String>,
        #[arg(long)]
        log: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct LogReport {
    #[serde(flatten)]
    log: LogParseResult,
    weaving: WeaveReport,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeReport {
    metrics: ParseMetrics,
    completeness: CompletenessReport,
    analysis: AnalysisResult,
}

fn main() -> Result<ExitCode> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = panic_message(panic_info.payload());
        let location = panic_info
            .location()
            .map(|loc| format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_default();
        log::error!("[PANIC]{} {}", location, msg);
        eprintln!("[PANIC]{} {}", location, msg);
    }));

    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(paths::get_config_path);
    let (config, config_warning) = PipelineConfig::load(&config_path);

    if config.logging.log_to_file {
        paths::ensure_directories().context("Failed to create logs directory")?;
    }
    logging::init_logging(&config.logging).map_err(|e| anyhow!("Logger setup failed: {}", e))?;

    match config_warning {
        Some(warning) => log::warn!("{}", warning),
        None => log::info!("Config loaded from {}", config_path.display()),
    }

    run(cli, &config)
}

/// The payload of a panic as text; the location is reported separately.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn run(cli: Cli, config: &PipelineConfig) -> Result<ExitCode> {
    let output = cli.output.as_deref();

    match cli.command {
        Commands::Screenshot { path, screen_type } => {
            let outcome = match TesseractRecognizer::from_config(&config.ocr) {
                Ok(recognizer) => process_screenshot(
                    &ImageSource::Path(path),
                    screen_type,
                    &recognizer,
                    &config.ocr,
                ),
                Err(e) => ScreenshotOutcome {
                    success: false,
                    error: Some(e.to_string()),
                    ..Default::default()
                },
            };
            let success = outcome.success;
            emit(&outcome, output)?;
            Ok(exit_code(success))
        }
        Commands::Batch { images } => {
            let outcome = run_batch(&images, config)?;
            let success = outcome.success;
            emit(&outcome, output)?;
            Ok(exit_code(success))
        }
        Commands::Log { path } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read log {}", path.display()))?;
            let log = parse_log(&text);
            let weaving = classify_weaving(&log.events);
            emit(&LogReport { log, weaving }, output)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { metrics } => {
            let metrics = read_metrics(&metrics)?;
            let report = validate_completeness(&metrics);
            let complete = report.is_complete;
            emit(&report, output)?;
            Ok(exit_code(complete))
        }
        Commands::Analyze {
            metrics,
            screenshots,
            log,
        } => {
            // Later sources overwrite earlier ones: log, then metrics file, then screenshots
            let mut merged = ParseMetrics::default();

            if let Some(path) = log {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read log {}", path.display()))?;
                let log = parse_log(&text);
                let weaving = classify_weaving(&log.events);
                merged.merge_from(&metrics_from_log(&log, &weaving));
            }
            if let Some(path) = metrics {
                merged.merge_from(&read_metrics(&path)?);
            }
            if !screenshots.is_empty() {
                let outcome = run_batch(&screenshots, config)?;
                match outcome.data {
                    Some(data) if outcome.success => merged.merge_from(&data),
                    _ => {
                        return Err(anyhow!(
                            "Screenshot batch failed: {}",
                            outcome.error.unwrap_or_default()
                        ));
                    }
                }
            }

            let completeness = validate_completeness(&merged);
            if !completeness.is_complete {
                log::warn!("Incomplete metrics: missing {:?}", completeness.missing_fields);
            }
            let analysis = analyze_parse(&merged).context("Cannot analyze parse")?;

            emit(
                &AnalyzeReport {
                    metrics: merged,
                    completeness,
                    analysis,
                },
                output,
            )?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_batch(images: &[String], config: &PipelineConfig) -> Result<BatchOutcome> {
    let requests = images
        .iter()
        .map(|arg| parse_image_arg(arg))
        .collect::<Result<Vec<_>>>()?;

    Ok(match TesseractRecognizer::from_config(&config.ocr) {
        Ok(recognizer) => process_screenshots(&requests, &recognizer, &config.ocr),
        Err(e) => BatchOutcome {
            success: false,
            error: Some(e.to_string()),
            ..Default::default()
        },
    })
}

/// Splits `PATH[:TYPE]`. A suffix that is not a screen type stays part of the path.
fn parse_image_arg(arg: &str) -> Result<ScreenshotRequest> {
    if arg.trim().is_empty() {
        return Err(anyhow!("Empty screenshot argument"));
    }

    let (path, screen_type) = match arg.rsplit_once(':') {
        Some((path, suffix)) if !path.is_empty() => match suffix.parse::<ScreenType>() {
            Ok(screen_type) => (path, screen_type),
            Err(_) => (arg, ScreenType::Auto),
        },
        _ => (arg, ScreenType::Auto),
    };

    Ok(ScreenshotRequest {
        source: ImageSource::Path(PathBuf::from(path)),
        screen_type,
    })
}

fn read_metrics(path: &Path) -> Result<ParseMetrics> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read metrics {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse metrics {}", path.display()))
}

fn emit<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", json);
    if let Some(path) = output {
        export_to_json(value, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
