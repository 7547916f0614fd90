use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::model::{Gap, LogEvent};

/// Pauses between consecutive casts longer than this are reported as gaps.
pub const GAP_THRESHOLD_SECONDS: f64 = 1.0;

/// `[H:MM:SS(.frac)] ability`
static CLOCK_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(\d+):(\d{2}):(\d{2}(?:\.\d+)?)\]\s*(.+?)\s*$")
        .expect("clock line pattern must compile")
});

/// `[seconds(.frac)] ability`
static SECONDS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(\d+(?:\.\d+)?)\]\s*(.+?)\s*$").expect("seconds line pattern must compile")
});

static LA_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bla\b").expect("la token pattern must compile"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapAnalysis {
    pub total_gaps: usize,
    pub largest_gap: f64,
    pub average_gap_size: f64,
    /// Events whose timestamp is earlier than the one before them.
    pub out_of_order_events: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogParseResult {
    pub events: Vec<LogEvent>,
    pub gaps: Vec<Gap>,
    pub analysis: GapAnalysis,
}

/// Parses one log line into `(timestamp_seconds, ability_name)`.
///
/// Returns `None` for headers, blank lines and anything without a bracketed
/// timestamp prefix.
pub fn parse_line(line: &str) -> Option<(f64, String)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(caps) = CLOCK_LINE.captures(line) {
        let hours: f64 = caps[1].parse().ok()?;
        let minutes: f64 = caps[2].parse().ok()?;
        let seconds: f64 = caps[3].parse().ok()?;
        return Some((hours * 3600.0 + minutes * 60.0 + seconds, caps[4].to_string()));
    }

    if let Some(caps) = SECONDS_LINE.captures(line) {
        let seconds: f64 = caps[1].parse().ok()?;
        return Some((seconds, caps[2].to_string()));
    }

    None
}

/// True when the ability name denotes a light attack.
///
/// Matches "light attack" anywhere, case-insensitively, or the standalone
/// abbreviation "LA". The abbreviation must be its own word so names like
/// "Blade Cloak" or "Flame Lash" are not flagged.
pub fn is_light_attack(name: &str) -> bool {
    name.to_lowercase().contains("light attack") || LA_TOKEN.is_match(name)
}

/// Parses a freeform log into ordered cast events and the gaps between them.
///
/// Lines matching neither timestamp format are skipped. Timestamps are
/// expected to be non-decreasing; an event earlier than its predecessor is
/// kept, counted in `out_of_order_events`, and never produces a gap.
pub fn parse_log(text: &str) -> LogParseResult {
    let mut events = Vec::new();
    let mut gaps = Vec::new();
    let mut out_of_order_events = 0;
    let mut previous: Option<f64> = None;

    for (line_no, line) in text.lines().enumerate() {
        let Some((timestamp, ability_name)) = parse_line(line) else {
            continue;
        };

        if let Some(prev) = previous {
            let delta = timestamp - prev;
            if delta < 0.0 {
                out_of_order_events += 1;
                log::warn!(
                    "Log line {}: timestamp {:.3}s is earlier than previous {:.3}s",
                    line_no + 1,
                    timestamp,
                    prev
                );
            } else if delta > GAP_THRESHOLD_SECONDS {
                gaps.push(Gap {
                    start_seconds: prev,
                    end_seconds: timestamp,
                    duration_seconds: delta,
                });
            }
        }
        previous = Some(timestamp);

        events.push(LogEvent {
            timestamp_seconds: timestamp,
            is_light_attack: is_light_attack(&ability_name),
            ability_name,
        });
    }

    let analysis = analyze_gaps(&gaps, out_of_order_events);
    log::debug!(
        "Parsed {} events, {} gaps (largest {:.2}s)",
        events.len(),
        analysis.total_gaps,
        analysis.largest_gap
    );

    LogParseResult {
        events,
        gaps,
        analysis,
    }
}

fn analyze_gaps(gaps: &[Gap], out_of_order_events: usize) -> GapAnalysis {
    if gaps.is_empty() {
        return GapAnalysis {
            out_of_order_events,
            ..Default::default()
        };
    }

    let total: f64 = gaps.iter().map(|g| g.duration_seconds).sum();
    let largest = gaps
        .iter()
        .map(|g| g.duration_seconds)
        .fold(0.0f64, f64::max);

    GapAnalysis {
        total_gaps: gaps.len(),
        largest_gap: largest,
        average_gap_size: total / gaps.len() as f64,
        out_of_order_events,
    }
}
