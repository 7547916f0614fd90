//! Diagnostic rule engine.
//!
//! This module provides:
//! - Per-category threshold rules producing severity-tagged issues
//! - The overall rating derived from DPS and issue counts
//! - A human-readable summary
//! - JSON export of results

pub mod export;
pub mod rating;
pub mod rules;
pub mod summary;

pub use export::export_to_json;
pub use rating::{rate, IssueCounts};

use crate::error::{PipelineError, Result};
use crate::model::{AnalysisResult, ParseMetrics};

/// Runs every rule group over `metrics` and rates the parse.
///
/// `dps` and `active_time_seconds` are required; every other field is
/// optional and its absence skips the corresponding rules. Issues are
/// returned in category order: dps, rotation, weaving, buffs, penetration, crit.
pub fn analyze_parse(metrics: &ParseMetrics) -> Result<AnalysisResult> {
    let dps = metrics.dps.ok_or(PipelineError::MissingField("dps"))?;
    let active_time = metrics
        .active_time_seconds
        .ok_or(PipelineError::MissingField("activeTimeSeconds"))?;

    let mut issues = rules::dps_issues(dps);
    issues.extend(rules::rotation_issues(metrics));
    if let Some(light_attacks) = &metrics.light_attacks {
        issues.extend(rules::weaving_issues(light_attacks));
    }
    if let Some(buffs) = &metrics.buffs {
        issues.extend(rules::buff_issues(buffs));
    }
    if let Some(penetration) = &metrics.penetration {
        issues.extend(rules::penetration_issues(penetration));
    }
    issues.extend(rules::crit_issues(metrics));

    let counts = IssueCounts::from_issues(&issues);
    let rating = rate(dps, &counts);
    log::info!(
        "Analysis: {} ({} critical, {} major, {} minor)",
        rating.label(),
        counts.critical,
        counts.major,
        counts.minor
    );

    let summary = summary::build_summary(rating, dps, active_time, &issues);
    Ok(AnalysisResult {
        rating,
        issues,
        summary,
    })
}
