//! Label-anchored field rules shared by the extractors.
//!
//! Each rule is a `(label, pattern, converter)` triple. Rules are tried
//! independently against the whole recognized text; a rule that does not
//! match, or whose converter rejects the captures, leaves its field absent.

use regex::{Captures, Regex};

use crate::model::ParseMetrics;

/// Writes the captured value(s) into the record. Returns `None` to reject the match.
pub type Converter = fn(&Captures, &mut ParseMetrics) -> Option<()>;

#[derive(Clone, Copy)]
pub struct FieldRule {
    pub label: &'static str,
    pub pattern: &'static str,
    pub convert: Converter,
}

pub struct CompiledRule {
    pub label: &'static str,
    regex: Regex,
    convert: Converter,
}

/// Compiles a static rule table.
///
/// Patterns are compile-time constants covered by tests, so a bad pattern is
/// a programming error rather than an input error.
pub fn compile(rules: &[FieldRule]) -> Vec<CompiledRule> {
    rules
        .iter()
        .map(|rule| CompiledRule {
            label: rule.label,
            regex: Regex::new(rule.pattern).expect("field rule pattern must compile"),
            convert: rule.convert,
        })
        .collect()
}

/// Applies every rule to `text`, returning the labels of the rules that matched.
pub fn apply_rules(
    rules: &[CompiledRule],
    text: &str,
    metrics: &mut ParseMetrics,
) -> Vec<&'static str> {
    let mut matched = Vec::new();
    for rule in rules {
        let Some(caps) = rule.regex.captures(text) else {
            continue;
        };
        if (rule.convert)(&caps, metrics).is_some() {
            matched.push(rule.label);
        }
    }
    matched
}

/// Returns capture group `i` as a string slice.
pub fn group<'t>(caps: &Captures<'t>, i: usize) -> Option<&'t str> {
    caps.get(i).map(|m| m.as_str())
}

/// Parses an OCR'd integer, dropping thousands separators.
///
/// "152,340", "152.340" and "152 340" all read as 152340. A string with no
/// digits is not a number.
pub fn parse_integer(text: &str) -> Option<f64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u64>().ok().map(|v| v as f64)
}

/// Parses a decimal number, accepting a comma as the decimal mark.
pub fn parse_decimal(text: &str) -> Option<f64> {
    text.trim().replace(',', ".").parse::<f64>().ok()
}

/// Converts a `minutes:seconds[.fraction]` clock reading to seconds.
pub fn parse_clock(minutes: &str, seconds: &str) -> Option<f64> {
    let minutes: f64 = minutes.trim().parse().ok()?;
    let seconds = parse_decimal(seconds)?;
    if seconds >= 60.0 {
        return None;
    }
    Some(minutes * 60.0 + seconds)
}
