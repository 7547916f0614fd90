//! Console and file logger behind the `log` facade.
//!
//! Every record is written as `[HH:MM:SS.mmm] LEVEL message` to stderr and,
//! when a log file is configured, appended to it.

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::LoggingConfig;

pub const LOG_FILE_NAME: &str = "parse_analyzer.log";

struct PipelineLogger {
    level: LevelFilter,
    file: Option<PathBuf>,
}

/// Formats one log line with a local wall-clock timestamp.
fn format_line(level: log::Level, msg: &std::fmt::Arguments) -> String {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    format!("[{}] {:<5} {}\n", timestamp, level, msg)
}

impl Log for PipelineLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record.level(), record.args());
        eprint!("{}", line);
        if let Some(path) = &self.file {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
                let _ = file.write_all(line.as_bytes());
            }
        }
    }

    fn flush(&self) {}
}

/// Installs the global logger. Unknown level names fall back to `info`.
///
/// Returns an error only if a logger was already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), log::SetLoggerError> {
    let level = LevelFilter::from_str(&config.level).unwrap_or(LevelFilter::Info);
    let file = config
        .log_to_file
        .then(|| crate::paths::get_logs_dir().join(LOG_FILE_NAME));

    log::set_boxed_logger(Box::new(PipelineLogger { level, file }))?;
    log::set_max_level(level);
    Ok(())
}
