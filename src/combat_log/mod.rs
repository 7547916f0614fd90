//! Timestamped combat log parsing.
//!
//! This module provides:
//! - Line parsing into ordered cast events with gap detection
//! - Light attack weaving classification
//! - Conversion of the log analysis into a partial metrics record

pub mod parser;
pub mod weaving;

pub use parser::{parse_log, GapAnalysis, LogParseResult, GAP_THRESHOLD_SECONDS};
pub use weaving::{classify_weaving, WeaveReport};

use crate::model::{LightAttackStats, ParseMetrics};

/// Builds the part of a metrics record a cast log can provide.
///
/// Only active time and light-attack statistics are filled; a log carries no
/// damage numbers, so everything else stays absent for a screenshot-derived
/// record to supply through [`ParseMetrics::merge_from`].
pub fn metrics_from_log(log: &LogParseResult, weaving: &WeaveReport) -> ParseMetrics {
    let mut metrics = ParseMetrics::default();

    if let (Some(first), Some(last)) = (log.events.first(), log.events.last()) {
        if log.events.len() >= 2 {
            metrics.active_time_seconds =
                Some((last.timestamp_seconds - first.timestamp_seconds).max(0.0));
        }

        let count = log.events.iter().filter(|e| e.is_light_attack).count() as u32;
        metrics.light_attacks = Some(LightAttackStats {
            count,
            total_damage: None,
            average_weave_time_seconds: weaving.average_weave_time_seconds,
            miss_count: weaving.missed_weaves,
            ratio: weaving.weave_efficiency,
        });
    }

    metrics
}
