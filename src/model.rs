//! Normalized records exchanged between pipeline stages.
//!
//! Every field of [`ParseMetrics`] is optional: a field the source could not
//! provide stays `None`, which is distinct from a recognized zero.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Text recognized from one image, with the engine's mean confidence (0-100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecognition {
    pub text: String,
    pub confidence: f32,
}

/// One row of the per-ability damage breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityStat {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    pub total_damage: f64,
    pub percent_of_total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_time_between_casts: Option<f64>,
}

/// Time share between the two ability bars. The halves need not sum to 100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarBalance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_bar_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_bar_percent: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightAttackStats {
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_damage: Option<f64>,
    pub average_weave_time_seconds: f64,
    pub miss_count: u32,
    /// Weave ratio in percent.
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuffUptime {
    pub name: String,
    pub uptime_percent: f64,
    /// Declared by the caller for raid-wide major/minor buffs; never inferred.
    #[serde(default)]
    pub is_permanent: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Penetration {
    pub effective: f64,
    pub average: f64,
}

/// The canonical metrics record for one parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_time_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_damage: Option<f64>,
    /// Recognition order. Callers ranking by damage must sort explicitly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abilities: Option<Vec<AbilityStat>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dot_uptimes: Option<BTreeMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_balance: Option<BarBalance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light_attacks: Option<LightAttackStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffs: Option<Vec<BuffUptime>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penetration: Option<Penetration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_chance_percent: Option<f64>,
    /// Total multiplier in percent: 180 means 1.80x.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_damage_percent: Option<f64>,
}

impl ParseMetrics {
    /// Overlays every field present in `other` onto `self` (last write wins).
    ///
    /// Bar halves are merged independently so a later image that only
    /// recognized one bar does not erase the other.
    pub fn merge_from(&mut self, other: &ParseMetrics) {
        fn overlay<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if src.is_some() {
                dst.clone_from(src);
            }
        }

        overlay(&mut self.dps, &other.dps);
        overlay(&mut self.active_time_seconds, &other.active_time_seconds);
        overlay(&mut self.total_damage, &other.total_damage);
        overlay(&mut self.abilities, &other.abilities);
        overlay(&mut self.dot_uptimes, &other.dot_uptimes);
        overlay(&mut self.light_attacks, &other.light_attacks);
        overlay(&mut self.buffs, &other.buffs);
        overlay(&mut self.penetration, &other.penetration);
        overlay(&mut self.critical_chance_percent, &other.critical_chance_percent);
        overlay(&mut self.critical_damage_percent, &other.critical_damage_percent);

        if let Some(src) = &other.bar_balance {
            let dst = self.bar_balance.get_or_insert_with(BarBalance::default);
            overlay(&mut dst.front_bar_percent, &src.front_bar_percent);
            overlay(&mut dst.back_bar_percent, &src.back_bar_percent);
        }
    }

    /// True when no field at all was recognized.
    pub fn is_empty(&self) -> bool {
        *self == ParseMetrics::default()
    }
}

/// One recognized line of a timestamped combat log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub timestamp_seconds: f64,
    pub ability_name: String,
    pub is_light_attack: bool,
}

/// A pause between two consecutive log events longer than the gap threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gap {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Dps,
    Rotation,
    Weaving,
    Buffs,
    Penetration,
    Crit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Major,
    Minor,
}

impl Severity {
    /// Sort key: critical issues first.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Major => 1,
            Severity::Minor => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Major => "MAJOR",
            Severity::Minor => "MINOR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub category: Category,
    pub severity: Severity,
    pub message: String,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rating {
    Poor,
    NeedsImprovement,
    Good,
    Excellent,
}

impl Rating {
    pub fn label(self) -> &'static str {
        match self {
            Rating::Excellent => "Excellent",
            Rating::Good => "Good",
            Rating::NeedsImprovement => "Needs Improvement",
            Rating::Poor => "Poor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub rating: Rating,
    pub issues: Vec<Issue>,
    pub summary: String,
}
