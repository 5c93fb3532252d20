//! The three fixed investigation gates.

use schemaproof_kernel::{WeightedElement, is_sensitive_uid};
use schemaproof_ledger::{ArtifactKind, EvidenceLedger};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const GATE_MIGRATION_RISK: &str = "migration-risk";
pub const GATE_TEST_COVERAGE: &str = "test-coverage";
pub const GATE_SENSITIVE_FIELDS: &str = "sensitive-fields";

/// MRI must stay strictly below this.
pub const MIGRATION_RISK_LIMIT: f64 = 0.4;
/// TCI must exceed this to pass without a warning.
pub const TEST_COVERAGE_FLOOR: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateStatus {
    Pass,
    Warn,
    Fail,
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pass => "PASS",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    pub name: String,
    pub status: GateStatus,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub offenders: Vec<String>,
}

pub fn migration_risk_gate(mri: f64) -> Gate {
    let (status, op) = if mri < MIGRATION_RISK_LIMIT {
        (GateStatus::Pass, "<")
    } else {
        (GateStatus::Fail, ">=")
    };
    Gate {
        name: GATE_MIGRATION_RISK.to_string(),
        status,
        detail: format!("MRI {mri:.2} {op} {MIGRATION_RISK_LIMIT:.2}"),
        offenders: Vec::new(),
    }
}

pub fn test_coverage_gate(tci: f64) -> Gate {
    let (status, op) = if tci > TEST_COVERAGE_FLOOR {
        (GateStatus::Pass, ">")
    } else {
        (GateStatus::Warn, "<=")
    };
    Gate {
        name: GATE_TEST_COVERAGE.to_string(),
        status,
        detail: format!("TCI {tci:.2} {op} {TEST_COVERAGE_FLOOR:.2}"),
        offenders: Vec::new(),
    }
}

/// Every privacy-sensitive element needs both SQL and test evidence.
pub fn sensitive_fields_gate(elements: &[WeightedElement<'_>], ledger: &EvidenceLedger) -> Gate {
    let required = [ArtifactKind::Sql, ArtifactKind::Test];
    let sensitive: Vec<&str> = elements
        .iter()
        .map(|item| item.element.uid.as_str())
        .filter(|uid| is_sensitive_uid(uid))
        .collect();
    let mut offenders: Vec<String> = sensitive
        .iter()
        .filter(|uid| !ledger.has_complete_artifacts(uid, &required))
        .map(|uid| uid.to_string())
        .collect();
    offenders.sort();

    let (status, detail) = if offenders.is_empty() {
        (
            GateStatus::Pass,
            format!("{} sensitive element(s) fully evidenced", sensitive.len()),
        )
    } else {
        (
            GateStatus::Fail,
            format!(
                "{} of {} sensitive element(s) lack SQL or test evidence",
                offenders.len(),
                sensitive.len()
            ),
        )
    };
    Gate {
        name: GATE_SENSITIVE_FIELDS.to_string(),
        status,
        detail,
        offenders,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_risk_boundary_fails() {
        assert_eq!(migration_risk_gate(0.39).status, GateStatus::Pass);
        assert_eq!(migration_risk_gate(0.4).status, GateStatus::Fail);
        assert_eq!(migration_risk_gate(0.1).detail, "MRI 0.10 < 0.40");
    }

    #[test]
    fn test_coverage_boundary_warns() {
        assert_eq!(test_coverage_gate(0.71).status, GateStatus::Pass);
        assert_eq!(test_coverage_gate(0.7).status, GateStatus::Warn);
        assert_eq!(test_coverage_gate(0.7).detail, "TCI 0.70 <= 0.70");
    }
}
