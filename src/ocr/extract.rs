use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::fields::{
    apply_rules, compile, group, parse_clock, parse_decimal, parse_integer, CompiledRule,
    FieldRule,
};
use crate::model::{AbilityStat, BarBalance, LightAttackStats, ParseMetrics, Penetration};

/// Ability rows below this damage are OCR line-merge artifacts, not abilities.
pub const ABILITY_DAMAGE_NOISE_FLOOR: f64 = 1_000.0;

/// `(id) name  pct%  <unused column>  damage`
const ABILITY_ROW_PATTERN: &str =
    r"^\s*\(\s*(\d+)\s*\)\s*(.+?)\s+(\d+(?:[.,]\d+)?)\s*%\s+(\d[\d,.]*)\s+(\d[\d,.]*)\s*$";

const DPS: FieldRule = FieldRule {
    label: "dps",
    pattern: r"(?i)\bDPS\b[^\d\n]{0,12}(\d[\d,.]*)",
    convert: convert_dps,
};

const ACTIVE_TIME: FieldRule = FieldRule {
    label: "activeTime",
    pattern: r"(?i)Active\s*Time[^\d\n]{0,12}(\d{1,3})\s*:\s*(\d{1,2}(?:[.,]\d+)?)",
    convert: convert_active_time,
};

const INFO_FIELDS: [FieldRule; 8] = [
    DPS,
    ACTIVE_TIME,
    FieldRule {
        label: "frontBar",
        pattern: r"(?i)Bar\s*1\b[^\n%]*?(\d+(?:[.,]\d+)?)\s*%",
        convert: convert_front_bar,
    },
    FieldRule {
        label: "backBar",
        pattern: r"(?i)Bar\s*2\b[^\n%]*?(\d+(?:[.,]\d+)?)\s*%",
        convert: convert_back_bar,
    },
    FieldRule {
        label: "penetration",
        pattern: r"(?i)Penetration[^\d\n]{0,12}(\d[\d,.]*)",
        convert: convert_penetration,
    },
    FieldRule {
        label: "critChance",
        pattern: r"(?i)\bCrit(?:ical)?(?:\s*(?:Chance|Rate))?[\s:=]*(\d+(?:[.,]\d+)?)\s*%",
        convert: convert_crit_chance,
    },
    FieldRule {
        label: "critDamage",
        pattern: r"(?i)\bCrit(?:ical)?\s*(?:Damage|Dmg)[\s:=]*(\d+(?:[.,]\d+)?)\s*%",
        convert: convert_crit_damage,
    },
    FieldRule {
        label: "lightAttacks",
        pattern: r"(?i)Light\s*Attacks?[^\d\n]{0,12}(\d[\d,.]*)[\s|/]+(\d[\d,.]*)[\s|/]+(\d[\d,.]*)[\s|/]+(\d+(?:[.,]\d+)?)",
        convert: convert_light_attacks,
    },
];

const PARSE_FIELDS: [FieldRule; 3] = [
    DPS,
    ACTIVE_TIME,
    FieldRule {
        label: "totalDamage",
        pattern: r"(?i)Total\s*Damage[^\d\n]{0,12}(\d[\d,.]*)",
        convert: convert_total_damage,
    },
];

static INFO_RULES: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| compile(&INFO_FIELDS));
static PARSE_RULES: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| compile(&PARSE_FIELDS));
static ABILITY_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ABILITY_ROW_PATTERN).expect("ability row pattern must compile"));

fn convert_dps(caps: &Captures, m: &mut ParseMetrics) -> Option<()> {
    m.dps = Some(parse_integer(group(caps, 1)?)?);
    Some(())
}

fn convert_active_time(caps: &Captures, m: &mut ParseMetrics) -> Option<()> {
    m.active_time_seconds = Some(parse_clock(group(caps, 1)?, group(caps, 2)?)?);
    Some(())
}

fn convert_front_bar(caps: &Captures, m: &mut ParseMetrics) -> Option<()> {
    let value = parse_decimal(group(caps, 1)?)?;
    m.bar_balance
        .get_or_insert_with(BarBalance::default)
        .front_bar_percent = Some(value);
    Some(())
}

fn convert_back_bar(caps: &Captures, m: &mut ParseMetrics) -> Option<()> {
    let value = parse_decimal(group(caps, 1)?)?;
    m.bar_balance
        .get_or_insert_with(BarBalance::default)
        .back_bar_percent = Some(value);
    Some(())
}

/// The meter shows one penetration figure; it stands in for both values.
fn convert_penetration(caps: &Captures, m: &mut ParseMetrics) -> Option<()> {
    let value = parse_integer(group(caps, 1)?)?;
    m.penetration = Some(Penetration {
        effective: value,
        average: value,
    });
    Some(())
}

fn convert_crit_chance(caps: &Captures, m: &mut ParseMetrics) -> Option<()> {
    m.critical_chance_percent = Some(parse_decimal(group(caps, 1)?)?);
    Some(())
}

fn convert_crit_damage(caps: &Captures, m: &mut ParseMetrics) -> Option<()> {
    m.critical_damage_percent = Some(parse_decimal(group(caps, 1)?)?);
    Some(())
}

/// Columns are positional: count, weave-related count, misses, weave time (ms).
fn convert_light_attacks(caps: &Captures, m: &mut ParseMetrics) -> Option<()> {
    let count = parse_integer(group(caps, 1)?)?;
    let weave_related = parse_integer(group(caps, 2)?)?;
    let misses = parse_integer(group(caps, 3)?)?;
    let time_ms = parse_decimal(group(caps, 4)?)?;

    let ratio = if count > 0.0 {
        weave_related / count * 100.0
    } else {
        0.0
    };

    m.light_attacks = Some(LightAttackStats {
        count: count as u32,
        total_damage: None,
        average_weave_time_seconds: time_ms / 1000.0,
        miss_count: misses as u32,
        ratio,
    });
    Some(())
}

fn convert_total_damage(caps: &Captures, m: &mut ParseMetrics) -> Option<()> {
    m.total_damage = Some(parse_integer(group(caps, 1)?)?);
    Some(())
}

/// Extracts fields from a character-sheet / stat-summary screenshot.
///
/// Never fails: unmatched fields are simply absent from the result.
pub fn extract_info(text: &str) -> ParseMetrics {
    let mut metrics = ParseMetrics::default();
    let matched = apply_rules(&INFO_RULES, text, &mut metrics);
    log::debug!("Info extractor matched: {:?}", matched);
    metrics
}

/// Extracts fields from a per-ability damage breakdown screenshot.
pub fn extract_parse(text: &str) -> ParseMetrics {
    let mut metrics = ParseMetrics::default();
    let matched = apply_rules(&PARSE_RULES, text, &mut metrics);

    let abilities = extract_abilities(text);
    log::debug!(
        "Parse extractor matched: {:?}, {} ability rows",
        matched,
        abilities.len()
    );
    if !abilities.is_empty() {
        metrics.abilities = Some(abilities);
    }
    metrics
}

/// Scans ability rows line by line, keeping recognition order.
///
/// Rows with a percentage outside (0, 100] or damage under the noise floor
/// are dropped.
pub fn extract_abilities(text: &str) -> Vec<AbilityStat> {
    text.lines().filter_map(parse_ability_row).collect()
}

fn parse_ability_row(line: &str) -> Option<AbilityStat> {
    let caps = ABILITY_ROW.captures(line)?;

    let name = group(&caps, 2)?.split_whitespace().collect::<Vec<_>>().join(" ");
    let percent = parse_decimal(group(&caps, 3)?)?;
    let damage = parse_integer(group(&caps, 5)?)?;

    if percent <= 0.0 || percent > 100.0 {
        log::debug!("Rejected ability row (percent {}): {}", percent, line.trim());
        return None;
    }
    if damage < ABILITY_DAMAGE_NOISE_FLOOR {
        log::debug!("Rejected ability row (damage {}): {}", damage, line.trim());
        return None;
    }

    Some(AbilityStat {
        name,
        count: None,
        total_damage: damage,
        percent_of_total: percent,
        average_time_between_casts: None,
    })
}
