//! Heuristic consistency flags over the reported scores.

use schemaproof_kernel::{SchemaIr, is_sensitive_uid};
use schemaproof_ledger::{ArtifactKind, EvidenceLedger};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlagCode {
    CoverageWithoutTests,
    LowRiskLowCoverage,
    SensitiveUntested,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyFlag {
    pub code: FlagCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

pub fn consistency_flags(
    scs: f64,
    tci: f64,
    mri: f64,
    schema: &SchemaIr,
    ledger: &EvidenceLedger,
) -> Vec<ConsistencyFlag> {
    let mut flags = Vec::new();
    if scs > 0.8 && tci < 0.5 {
        flags.push(ConsistencyFlag {
            code: FlagCode::CoverageWithoutTests,
            message: format!("SCS {scs:.2} is high while TCI {tci:.2} is below 0.50"),
            uid: None,
        });
    }
    if mri < 0.2 && scs < 0.5 {
        flags.push(ConsistencyFlag {
            code: FlagCode::LowRiskLowCoverage,
            message: format!(
                "MRI {mri:.2} looks safe but SCS {scs:.2} leaves most of the schema unevidenced"
            ),
            uid: None,
        });
    }
    for element in schema.scored_fields() {
        if is_sensitive_uid(&element.uid) && !ledger.has_kind(&element.uid, &ArtifactKind::Test) {
            flags.push(ConsistencyFlag {
                code: FlagCode::SensitiveUntested,
                message: format!("sensitive element {} has no test evidence", element.uid),
                uid: Some(element.uid),
            });
        }
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn score_pattern_flags() {
        let schema = SchemaIr::default();
        let ledger = EvidenceLedger::new("abc", Utc::now());

        let flags = consistency_flags(0.9, 0.3, 0.5, &schema, &ledger);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].code, FlagCode::CoverageWithoutTests);

        let flags = consistency_flags(0.3, 0.9, 0.1, &schema, &ledger);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].code, FlagCode::LowRiskLowCoverage);

        assert!(consistency_flags(0.85, 0.75, 0.1, &schema, &ledger).is_empty());
    }
}
