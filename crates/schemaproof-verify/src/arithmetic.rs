//! Arithmetic cross-check.
//!
//! Re-derives the weighted completion with a deliberately simpler method:
//! weights come from UID substrings only (no overrides, no directives), and
//! an element counts only with both SQL and test evidence. A large gap from
//! the reported value points at a bug on one side.

use schemaproof_kernel::{SchemaIr, WeightConfig};
use schemaproof_ledger::{ArtifactKind, EvidenceLedger};
use serde::{Deserialize, Serialize};

/// Differences below this are rounding noise.
pub const ACCEPTABLE_DIFFERENCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discrepancy {
    Acceptable,
    Significant,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArithmeticCheck {
    pub reported: f64,
    pub approximate: f64,
    pub difference: f64,
    pub discrepancy: Discrepancy,
}

fn substring_weight(uid: &str, weights: &WeightConfig) -> u32 {
    let haystack = uid.to_ascii_lowercase();
    weights
        .substrings
        .iter()
        .filter(|(needle, _)| haystack.contains(needle.to_ascii_lowercase().as_str()))
        .map(|(_, weight)| *weight)
        .max()
        .unwrap_or(weights.default)
}

pub fn approximate_completion(
    schema: &SchemaIr,
    ledger: &EvidenceLedger,
    weights: &WeightConfig,
) -> f64 {
    let mut earned: u64 = 0;
    let mut total: u64 = 0;
    for table in &schema.tables {
        for field in table.fields.iter().filter(|f| !f.is_virtual && !f.is_skipped()) {
            let uid = schemaproof_kernel::field_uid(&table.name, &field.name);
            let weight = u64::from(substring_weight(&uid, weights));
            total += weight;
            if ledger.has_kind(&uid, &ArtifactKind::Sql) && ledger.has_kind(&uid, &ArtifactKind::Test)
            {
                earned += weight;
            }
        }
    }
    if total == 0 {
        0.0
    } else {
        earned as f64 / total as f64
    }
}

pub fn cross_check(
    reported: f64,
    schema: &SchemaIr,
    ledger: &EvidenceLedger,
    weights: &WeightConfig,
) -> ArithmeticCheck {
    let approximate = approximate_completion(schema, ledger, weights);
    let difference = (approximate - reported).abs();
    ArithmeticCheck {
        reported,
        approximate,
        difference,
        discrepancy: if difference < ACCEPTABLE_DIFFERENCE {
            Discrepancy::Acceptable
        } else {
            Discrepancy::Significant
        },
    }
}
