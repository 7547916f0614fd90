use serde::{Deserialize, Serialize};

use crate::model::LogEvent;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaveReport {
    /// Skill followed by skill: a light attack was skipped.
    pub missed_weaves: u32,
    /// Light attack followed by light attack.
    pub double_weaves: u32,
    /// Light attack followed by skill.
    pub good_weaves: u32,
    /// Good weaves as a percentage of all transitions.
    pub weave_efficiency: f64,
    /// Mean delay of the good weaves, in seconds.
    pub average_weave_time_seconds: f64,
}

/// Classifies each adjacent pair of events.
///
/// A skill followed by a light attack is not counted in any bucket: it is
/// the setup half of the next pair, not an outcome of its own.
pub fn classify_weaving(events: &[LogEvent]) -> WeaveReport {
    let mut report = WeaveReport::default();
    let mut weave_time_sum = 0.0;

    for pair in events.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        match (current.is_light_attack, next.is_light_attack) {
            (false, false) => report.missed_weaves += 1,
            (true, true) => report.double_weaves += 1,
            (true, false) => {
                report.good_weaves += 1;
                weave_time_sum += next.timestamp_seconds - current.timestamp_seconds;
            }
            (false, true) => {}
        }
    }

    if events.len() >= 2 {
        let transitions = (events.len() - 1) as f64;
        report.weave_efficiency = report.good_weaves as f64 / transitions * 100.0;
    }
    if report.good_weaves > 0 {
        report.average_weave_time_seconds = weave_time_sum / report.good_weaves as f64;
    }

    report
}
