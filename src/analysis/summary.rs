//! Human-readable summary block.

use std::fmt::Write;

use super::rating::IssueCounts;
use crate::model::{Issue, Rating};

/// Issues listed in the summary, most severe first.
pub const MAX_LISTED_ISSUES: usize = 5;

/// Formats seconds as `m:ss`.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

pub fn build_summary(rating: Rating, dps: f64, active_time_seconds: f64, issues: &[Issue]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Parse Rating: {}", rating.label());
    let _ = writeln!(
        out,
        "DPS: {:.0} | Active Time: {}",
        dps,
        format_duration(active_time_seconds)
    );
    out.push('\n');

    if issues.is_empty() {
        out.push_str("No issues found. Great parse, keep it up!\n");
        return out;
    }

    let counts = IssueCounts::from_issues(issues);
    let _ = writeln!(
        out,
        "Issues: {} critical, {} major, {} minor",
        counts.critical, counts.major, counts.minor
    );

    // Stable sort keeps rule order within a severity
    let mut sorted: Vec<&Issue> = issues.iter().collect();
    sorted.sort_by_key(|issue| issue.severity.rank());

    for (i, issue) in sorted.iter().take(MAX_LISTED_ISSUES).enumerate() {
        let _ = writeln!(
            out,
            "{}. [{}] {}\n   -> {}",
            i + 1,
            issue.severity.label(),
            issue.message,
            issue.recommendation
        );
    }

    out
}
