//! Per-category diagnostic rules.
//!
//! Each metric is classified against an ordered band table: bands are tried
//! top-down and the first one whose predicate holds decides the severity
//! (`None` = no issue). Categories are independent of each other.

use crate::model::{
    BarBalance, BuffUptime, Category, Issue, LightAttackStats, ParseMetrics, Penetration,
    Severity,
};

pub struct Band {
    pub matches: fn(f64) -> bool,
    pub severity: Option<Severity>,
    pub target: &'static str,
}

/// Returns the first band `value` falls into.
pub fn classify(bands: &[Band], value: f64) -> Option<&Band> {
    bands.iter().find(|band| (band.matches)(value))
}

fn severity_of(bands: &[Band], value: f64) -> Option<(Severity, &'static str)> {
    classify(bands, value).and_then(|band| band.severity.map(|s| (s, band.target)))
}

pub const DPS_EXCELLENT: f64 = 160_000.0;
pub const DPS_GOOD: f64 = 140_000.0;
pub const DPS_FLOOR: f64 = 130_000.0;

pub const DPS_BANDS: [Band; 4] = [
    Band {
        matches: |v| v >= DPS_EXCELLENT,
        severity: None,
        target: "160k+",
    },
    Band {
        matches: |v| v >= DPS_GOOD,
        severity: Some(Severity::Minor),
        target: "160k+",
    },
    Band {
        matches: |v| v >= DPS_FLOOR,
        severity: Some(Severity::Major),
        target: "140k+",
    },
    Band {
        matches: |_| true,
        severity: Some(Severity::Critical),
        target: "140k+",
    },
];

pub const TOP_ABILITY_BANDS: [Band; 2] = [
    Band {
        matches: |v| v < 15.0,
        severity: Some(Severity::Major),
        target: "15%+",
    },
    Band {
        matches: |_| true,
        severity: None,
        target: "15%+",
    },
];

pub const DOT_UPTIME_BANDS: [Band; 3] = [
    Band {
        matches: |v| v < 70.0,
        severity: Some(Severity::Critical),
        target: "85%+",
    },
    Band {
        matches: |v| v < 85.0,
        severity: Some(Severity::Major),
        target: "85%+",
    },
    Band {
        matches: |_| true,
        severity: None,
        target: "85%+",
    },
];

/// Applied to |front - back|.
pub const BAR_IMBALANCE_BANDS: [Band; 2] = [
    Band {
        matches: |v| v > 30.0,
        severity: Some(Severity::Minor),
        target: "within 30%",
    },
    Band {
        matches: |_| true,
        severity: None,
        target: "within 30%",
    },
];

pub const WEAVE_TIME_BANDS: [Band; 3] = [
    Band {
        matches: |v| v > 0.25,
        severity: Some(Severity::Critical),
        target: "<0.15s",
    },
    Band {
        matches: |v| v > 0.15,
        severity: Some(Severity::Major),
        target: "<0.15s",
    },
    Band {
        matches: |_| true,
        severity: None,
        target: "<0.15s",
    },
];

pub const MISSED_LIGHT_ATTACK_BANDS: [Band; 3] = [
    Band {
        matches: |v| v > 20.0,
        severity: Some(Severity::Critical),
        target: "5 or fewer",
    },
    Band {
        matches: |v| v > 5.0,
        severity: Some(Severity::Major),
        target: "5 or fewer",
    },
    Band {
        matches: |_| true,
        severity: None,
        target: "5 or fewer",
    },
];

pub const PERMANENT_BUFF_BANDS: [Band; 3] = [
    Band {
        matches: |v| v < 70.0,
        severity: Some(Severity::Critical),
        target: "90%+",
    },
    Band {
        matches: |v| v < 90.0,
        severity: Some(Severity::Major),
        target: "90%+",
    },
    Band {
        matches: |_| true,
        severity: None,
        target: "90%+",
    },
];

pub const PENETRATION_TARGET: f64 = 18_200.0;
pub const PENETRATION_CAP: f64 = 20_200.0;
const PENETRATION_CRITICAL_DEFICIT: f64 = 3_000.0;

pub const PENETRATION_BANDS: [Band; 4] = [
    Band {
        matches: |v| PENETRATION_TARGET - v > PENETRATION_CRITICAL_DEFICIT,
        severity: Some(Severity::Critical),
        target: "18200",
    },
    Band {
        matches: |v| v < PENETRATION_TARGET,
        severity: Some(Severity::Major),
        target: "18200",
    },
    Band {
        matches: |v| v > PENETRATION_CAP,
        severity: Some(Severity::Minor),
        target: "18200-20200",
    },
    Band {
        matches: |_| true,
        severity: None,
        target: "18200-20200",
    },
];

pub const CRIT_CHANCE_BANDS: [Band; 2] = [
    Band {
        matches: |v| v < 60.0,
        severity: Some(Severity::Major),
        target: "60%+",
    },
    Band {
        matches: |_| true,
        severity: None,
        target: "60%+",
    },
];

pub const CRIT_DAMAGE_BANDS: [Band; 3] = [
    Band {
        matches: |v| v < 115.0,
        severity: Some(Severity::Major),
        target: "115-125%",
    },
    Band {
        matches: |v| v > 125.0,
        severity: Some(Severity::Minor),
        target: "115-125%",
    },
    Band {
        matches: |_| true,
        severity: None,
        target: "115-125%",
    },
];

fn issue(
    category: Category,
    severity: Severity,
    message: String,
    recommendation: String,
    current: String,
    target: &str,
) -> Issue {
    Issue {
        category,
        severity,
        message,
        recommendation,
        current_value: Some(current),
        target_value: Some(target.to_string()),
    }
}

pub fn dps_issues(dps: f64) -> Vec<Issue> {
    let Some((severity, target)) = severity_of(&DPS_BANDS, dps) else {
        return vec![];
    };

    let recommendation = match severity {
        Severity::Critical => {
            "Focus on fundamentals first: rotation order, buff uptime and weaving a light attack before every skill"
        }
        Severity::Major => "Tighten the rotation and check DoT and buff uptimes for lost damage",
        Severity::Minor => "Fine-tune weaving speed and uptimes to close the last gap",
    };

    vec![issue(
        Category::Dps,
        severity,
        format!("DPS of {:.0} is below the {} target", dps, target),
        recommendation.to_string(),
        format!("{:.0}", dps),
        target,
    )]
}

/// Uses the first ability exactly as given; the list is not re-sorted here.
pub fn rotation_issues(metrics: &ParseMetrics) -> Vec<Issue> {
    let mut issues = Vec::new();

    if let Some(top) = metrics.abilities.as_ref().and_then(|a| a.first()) {
        if let Some((severity, target)) = severity_of(&TOP_ABILITY_BANDS, top.percent_of_total) {
            issues.push(issue(
                Category::Rotation,
                severity,
                format!(
                    "Top ability {} only accounts for {:.1}% of total damage",
                    top.name, top.percent_of_total
                ),
                "Prioritize your strongest damage abilities so your top ability carries more of the parse".to_string(),
                format!("{:.1}%", top.percent_of_total),
                target,
            ));
        }
    }

    for (name, &uptime) in metrics.dot_uptimes.iter().flatten() {
        if let Some((severity, target)) = severity_of(&DOT_UPTIME_BANDS, uptime) {
            issues.push(issue(
                Category::Rotation,
                severity,
                format!("{} uptime is only {:.1}%", name, uptime),
                format!("Refresh {} just before it expires to keep it running", name),
                format!("{:.1}%", uptime),
                target,
            ));
        }
    }

    if let Some(bars) = &metrics.bar_balance {
        issues.extend(bar_balance_issue(bars));
    }

    issues
}

/// Only evaluated when both bars were recognized with non-zero time.
fn bar_balance_issue(bars: &BarBalance) -> Option<Issue> {
    let (front, back) = (bars.front_bar_percent?, bars.back_bar_percent?);
    if front == 0.0 || back == 0.0 {
        return None;
    }

    let difference = (front - back).abs();
    let (severity, target) = severity_of(&BAR_IMBALANCE_BANDS, difference)?;
    Some(issue(
        Category::Rotation,
        severity,
        format!(
            "Bar time is unbalanced: {:.1}% front bar vs {:.1}% back bar",
            front, back
        ),
        "Swap bars more evenly so effects slotted on both bars stay active".to_string(),
        format!("{:.1}% difference", difference),
        target,
    ))
}

pub fn weaving_issues(light_attacks: &LightAttackStats) -> Vec<Issue> {
    let mut issues = Vec::new();
    let weave_time = light_attacks.average_weave_time_seconds;

    if let Some((severity, target)) = severity_of(&WEAVE_TIME_BANDS, weave_time) {
        issues.push(issue(
            Category::Weaving,
            severity,
            format!("Average weave time is {:.2}s", weave_time),
            "Cast the skill immediately after the light attack fires instead of waiting for its animation".to_string(),
            format!("{:.2}s", weave_time),
            target,
        ));
    }

    let misses = light_attacks.miss_count;
    if let Some((severity, target)) = severity_of(&MISSED_LIGHT_ATTACK_BANDS, misses as f64) {
        issues.push(issue(
            Category::Weaving,
            severity,
            format!("{} light attacks were missed", misses),
            "Weave a light attack before every skill cast".to_string(),
            misses.to_string(),
            target,
        ));
    }

    issues
}

/// Only buffs declared permanent are held to an uptime standard.
pub fn buff_issues(buffs: &[BuffUptime]) -> Vec<Issue> {
    buffs
        .iter()
        .filter(|buff| buff.is_permanent)
        .filter_map(|buff| {
            let (severity, target) = severity_of(&PERMANENT_BUFF_BANDS, buff.uptime_percent)?;
            Some(issue(
                Category::Buffs,
                severity,
                format!("{} uptime is only {:.1}%", buff.name, buff.uptime_percent),
                format!("Keep {} active for the whole fight", buff.name),
                format!("{:.1}%", buff.uptime_percent),
                target,
            ))
        })
        .collect()
}

pub fn penetration_issues(penetration: &Penetration) -> Vec<Issue> {
    let effective = penetration.effective;
    let Some((severity, target)) = severity_of(&PENETRATION_BANDS, effective) else {
        return vec![];
    };

    let (message, recommendation) = if effective < PENETRATION_TARGET {
        (
            format!(
                "Penetration is {:.0} below the {:.0} target ({:.0})",
                PENETRATION_TARGET - effective,
                PENETRATION_TARGET,
                effective
            ),
            "Add penetration from gear sets, passives or group debuffs",
        )
    } else {
        (
            format!(
                "Penetration is overcapped: {:.0} ({:.0} wasted above {:.0})",
                effective,
                effective - PENETRATION_TARGET,
                PENETRATION_TARGET
            ),
            "Trade the excess penetration for weapon damage or critical stats",
        )
    };

    vec![issue(
        Category::Penetration,
        severity,
        message,
        recommendation.to_string(),
        format!("{:.0}", effective),
        target,
    )]
}

pub fn crit_issues(metrics: &ParseMetrics) -> Vec<Issue> {
    let mut issues = Vec::new();

    if let Some(chance) = metrics.critical_chance_percent {
        if let Some((severity, target)) = severity_of(&CRIT_CHANCE_BANDS, chance) {
            issues.push(issue(
                Category::Crit,
                severity,
                format!("Critical chance is only {:.1}%", chance),
                "Raise critical chance through gear, buffs or passives".to_string(),
                format!("{:.1}%", chance),
                target,
            ));
        }
    }

    if let Some(damage) = metrics.critical_damage_percent {
        if let Some((severity, target)) = severity_of(&CRIT_DAMAGE_BANDS, damage) {
            let (message, recommendation) = match severity {
                Severity::Minor => (
                    format!(
                        "Critical damage of {:.0}% is past the point of diminishing returns",
                        damage
                    ),
                    "Move excess critical damage into other offensive stats",
                ),
                _ => (
                    format!("Critical damage is only {:.0}%", damage),
                    "Add critical damage from sets, passives or buffs",
                ),
            };
            issues.push(issue(
                Category::Crit,
                severity,
                message,
                recommendation.to_string(),
                format!("{:.0}%", damage),
                target,
            ));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AbilityStat;
    use std::collections::BTreeMap;

    fn ability(name: &str, percent: f64) -> AbilityStat {
        AbilityStat {
            name: name.to_string(),
            count: None,
            total_damage: 1_000_000.0,
            percent_of_total: percent,
            average_time_between_casts: None,
        }
    }

    fn severities(issues: &[Issue]) -> Vec<Severity> {
        issues.iter().map(|i| i.severity).collect()
    }

    #[test]
    fn test_dps_tiers() {
        assert!(dps_issues(160_000.0).is_empty());
        assert!(dps_issues(250_000.0).is_empty());

        let minor = dps_issues(159_999.0);
        assert_eq!(severities(&minor), vec![Severity::Minor]);
        assert!(minor[0].message.contains("160k+"));

        let major = dps_issues(130_000.0);
        assert_eq!(severities(&major), vec![Severity::Major]);
        assert_eq!(major[0].target_value.as_deref(), Some("140k+"));

        let critical = dps_issues(129_999.0);
        assert_eq!(severities(&critical), vec![Severity::Critical]);
        assert!(critical[0].message.contains("140k+"));
    }

    #[test]
    fn test_top_ability_uses_first_entry_as_given() {
        let metrics = ParseMetrics {
            abilities: Some(vec![ability("Weak Opener", 10.0), ability("Big Hitter", 40.0)]),
            ..Default::default()
        };

        let issues = rotation_issues(&metrics);

        assert_eq!(severities(&issues), vec![Severity::Major]);
        assert!(issues[0].message.contains("Top ability Weak Opener"));
    }

    #[test]
    fn test_top_ability_at_threshold_is_fine() {
        let metrics = ParseMetrics {
            abilities: Some(vec![ability("Solid", 15.0)]),
            ..Default::default()
        };
        assert!(rotation_issues(&metrics).is_empty());
    }

    #[test]
    fn test_dot_uptime_bands() {
        let mut dots = BTreeMap::new();
        dots.insert("Barbed Trap".to_string(), 69.9);
        dots.insert("Caltrops".to_string(), 70.0);
        dots.insert("Deadly Cloak".to_string(), 85.0);
        let metrics = ParseMetrics {
            dot_uptimes: Some(dots),
            ..Default::default()
        };

        let issues = rotation_issues(&metrics);

        assert_eq!(severities(&issues), vec![Severity::Critical, Severity::Major]);
        assert!(issues[0].message.starts_with("Barbed Trap"));
        assert!(issues[1].message.starts_with("Caltrops"));
    }

    #[test]
    fn test_dot_issues_follow_name_order() {
        let metrics: ParseMetrics = serde_json::from_str(
            r#"{"dotUptimes": {"Venom Arrow": 50.0, "Acid Spray": 60.0, "Lotus Fan": 75.0}}"#,
        )
        .unwrap();

        let issues = rotation_issues(&metrics);
        let messages: Vec<&str> = issues.iter().map(|i| i.message.as_str()).collect();

        assert_eq!(
            messages,
            vec![
                "Acid Spray uptime is only 60.0%",
                "Lotus Fan uptime is only 75.0%",
                "Venom Arrow uptime is only 50.0%",
            ]
        );
    }

    #[test]
    fn test_bar_balance() {
        let unbalanced = BarBalance {
            front_bar_percent: Some(70.0),
            back_bar_percent: Some(30.0),
        };
        assert_eq!(bar_balance_issue(&unbalanced).unwrap().severity, Severity::Minor);

        let edge = BarBalance {
            front_bar_percent: Some(65.0),
            back_bar_percent: Some(35.0),
        };
        assert!(bar_balance_issue(&edge).is_none());

        let one_bar = BarBalance {
            front_bar_percent: Some(95.0),
            back_bar_percent: None,
        };
        assert!(bar_balance_issue(&one_bar).is_none());

        let zero_bar = BarBalance {
            front_bar_percent: Some(100.0),
            back_bar_percent: Some(0.0),
        };
        assert!(bar_balance_issue(&zero_bar).is_none());
    }

    #[test]
    fn test_weaving_checks_are_independent() {
        let la = |time: f64, misses: u32| LightAttackStats {
            count: 100,
            average_weave_time_seconds: time,
            miss_count: misses,
            ..Default::default()
        };

        assert!(weaving_issues(&la(0.15, 5)).is_empty());
        assert_eq!(severities(&weaving_issues(&la(0.2, 0))), vec![Severity::Major]);
        assert_eq!(severities(&weaving_issues(&la(0.25, 0))), vec![Severity::Major]);
        assert_eq!(severities(&weaving_issues(&la(0.26, 0))), vec![Severity::Critical]);
        assert_eq!(severities(&weaving_issues(&la(0.1, 6))), vec![Severity::Major]);
        assert_eq!(severities(&weaving_issues(&la(0.1, 20))), vec![Severity::Major]);
        assert_eq!(
            severities(&weaving_issues(&la(0.3, 21))),
            vec![Severity::Critical, Severity::Critical]
        );
    }

    #[test]
    fn test_only_permanent_buffs_are_flagged() {
        let buffs = vec![
            BuffUptime {
                name: "Major Brutality".to_string(),
                uptime_percent: 60.0,
                is_permanent: true,
            },
            BuffUptime {
                name: "Minor Force".to_string(),
                uptime_percent: 89.9,
                is_permanent: true,
            },
            BuffUptime {
                name: "Major Courage".to_string(),
                uptime_percent: 90.0,
                is_permanent: true,
            },
            BuffUptime {
                name: "Empower".to_string(),
                uptime_percent: 10.0,
                is_permanent: false,
            },
        ];

        let issues = buff_issues(&buffs);

        assert_eq!(severities(&issues), vec![Severity::Critical, Severity::Major]);
        assert!(issues.iter().all(|i| !i.message.contains("Empower")));
    }

    #[test]
    fn test_penetration_boundaries() {
        let pen = |v: f64| Penetration {
            effective: v,
            average: v,
        };

        assert!(penetration_issues(&pen(18_200.0)).is_empty());
        assert!(penetration_issues(&pen(20_200.0)).is_empty());

        let short = penetration_issues(&pen(18_199.0));
        assert_eq!(severities(&short), vec![Severity::Major]);
        assert!(short[0].message.contains("is 1 below"));

        let over = penetration_issues(&pen(20_201.0));
        assert_eq!(severities(&over), vec![Severity::Minor]);
        assert!(over[0].message.contains("overcapped"));
        assert!(over[0].message.contains("2001 wasted"));

        assert_eq!(severities(&penetration_issues(&pen(15_200.0))), vec![Severity::Major]);
        let far = penetration_issues(&pen(15_199.0));
        assert_eq!(severities(&far), vec![Severity::Critical]);
        assert!(far[0].message.contains("is 3001 below"));
    }

    #[test]
    fn test_crit_rules() {
        let crit = |chance: Option<f64>, damage: Option<f64>| ParseMetrics {
            critical_chance_percent: chance,
            critical_damage_percent: damage,
            ..Default::default()
        };

        assert!(crit_issues(&crit(Some(60.0), Some(115.0))).is_empty());
        assert!(crit_issues(&crit(Some(70.0), Some(125.0))).is_empty());
        assert_eq!(severities(&crit_issues(&crit(Some(59.9), None))), vec![Severity::Major]);
        assert_eq!(severities(&crit_issues(&crit(None, Some(114.0)))), vec![Severity::Major]);

        let high = crit_issues(&crit(None, Some(126.0)));
        assert_eq!(severities(&high), vec![Severity::Minor]);
        assert!(high[0].message.contains("diminishing returns"));
    }
}
