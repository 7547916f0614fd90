//! Overall rating bands.

use super::rules::{DPS_EXCELLENT, DPS_FLOOR, DPS_GOOD};
use crate::model::{Issue, Rating, Severity};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueCounts {
    pub critical: usize,
    pub major: usize,
    pub minor: usize,
}

impl IssueCounts {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut counts = Self::default();
        for issue in issues {
            match issue.severity {
                Severity::Critical => counts.critical += 1,
                Severity::Major => counts.major += 1,
                Severity::Minor => counts.minor += 1,
            }
        }
        counts
    }
}

struct RatingBand {
    rating: Rating,
    qualifies: fn(f64, &IssueCounts) -> bool,
}

/// Evaluated top-down; the first band that qualifies wins.
///
/// The needs-improvement band is a disjunction: reaching the DPS floor is
/// enough on its own, and so is having at most one critical issue.
const RATING_BANDS: [RatingBand; 4] = [
    RatingBand {
        rating: Rating::Excellent,
        qualifies: |dps, c| dps >= DPS_EXCELLENT && c.critical == 0 && c.major == 0,
    },
    RatingBand {
        rating: Rating::Good,
        qualifies: |dps, c| dps >= DPS_GOOD && c.critical == 0 && c.major <= 2,
    },
    RatingBand {
        rating: Rating::NeedsImprovement,
        qualifies: |dps, c| dps >= DPS_FLOOR || c.critical <= 1,
    },
    RatingBand {
        rating: Rating::Poor,
        qualifies: |_, _| true,
    },
];

pub fn rate(dps: f64, counts: &IssueCounts) -> Rating {
    RATING_BANDS
        .iter()
        .find(|band| (band.qualifies)(dps, counts))
        .map(|band| band.rating)
        .unwrap_or(Rating::Poor)
}
