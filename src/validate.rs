//! Completeness check for screenshot-derived metrics.
//!
//! Presence only: values are not range-checked, so a negative DPS passes.

use serde::{Deserialize, Serialize};

use crate::model::ParseMetrics;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletenessReport {
    pub is_complete: bool,
    pub missing_fields: Vec<String>,
    pub suggestions: Vec<String>,
}

struct RequiredField {
    token: &'static str,
    suggestion: &'static str,
    present: fn(&ParseMetrics) -> bool,
}

const REQUIRED_FIELDS: [RequiredField; 4] = [
    RequiredField {
        token: "dps",
        suggestion: "Include a screenshot of the info panel with the DPS value visible",
        present: |m| m.dps.is_some(),
    },
    RequiredField {
        token: "activeTime",
        suggestion: "Make sure the Active Time (m:ss) line is visible on the info panel",
        present: |m| m.active_time_seconds.is_some(),
    },
    RequiredField {
        token: "lightAttacks",
        suggestion: "Include the Light Attack row so weaving can be evaluated",
        present: |m| m.light_attacks.is_some(),
    },
    RequiredField {
        token: "abilities",
        suggestion: "Include a screenshot of the ability breakdown (parse) panel",
        present: |m| m.abilities.as_ref().is_some_and(|a| !a.is_empty()),
    },
];

/// Reports which critical fields are missing, in a fixed order, with a hint for each.
pub fn validate_completeness(metrics: &ParseMetrics) -> CompletenessReport {
    let (missing_fields, suggestions): (Vec<String>, Vec<String>) = REQUIRED_FIELDS
        .iter()
        .filter(|field| !(field.present)(metrics))
        .map(|field| (field.token.to_string(), field.suggestion.to_string()))
        .unzip();

    CompletenessReport {
        is_complete: missing_fields.is_empty(),
        missing_fields,
        suggestions,
    }
}
