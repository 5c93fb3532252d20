//! Per-element evidence rows.

use schemaproof_kernel::WeightedElement;
use schemaproof_ledger::{ArtifactKind, EvidenceLedger};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Citations listed per row before collapsing into `+N more`.
pub const MAX_LISTED_CITATIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementStatus {
    #[serde(rename = "complete")]
    Complete,
    #[serde(rename = "SQL only")]
    SqlOnly,
    #[serde(rename = "tests only")]
    TestsOnly,
    #[serde(rename = "missing")]
    Missing,
}

impl ElementStatus {
    pub fn from_evidence(has_sql: bool, has_test: bool) -> Self {
        match (has_sql, has_test) {
            (true, true) => Self::Complete,
            (true, false) => Self::SqlOnly,
            (false, true) => Self::TestsOnly,
            (false, false) => Self::Missing,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::SqlOnly => "SQL only",
            Self::TestsOnly => "tests only",
            Self::Missing => "missing",
        }
    }

    /// Short reason the element loses its weight, `ok` when it does not.
    pub fn deduction(self, weight: u32) -> String {
        match self {
            Self::Complete => "ok".to_string(),
            Self::SqlOnly => format!("-{weight} untested"),
            Self::TestsOnly => format!("-{weight} no SQL"),
            Self::Missing => format!("-{weight} no evidence"),
        }
    }
}

impl fmt::Display for ElementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRow {
    pub uid: String,
    pub weight: u32,
    /// Which weight rule fired, e.g. `directive:pk`.
    pub source: String,
    pub status: ElementStatus,
    pub citations: String,
    pub deduction: String,
}

pub fn format_citations(ledger: &EvidenceLedger, uid: &str) -> String {
    let refs: Vec<String> = ledger
        .evidence(uid)
        .values()
        .flatten()
        .map(|citation| citation.short_ref())
        .collect();
    if refs.is_empty() {
        return "-".to_string();
    }
    let mut listed = refs
        .iter()
        .take(MAX_LISTED_CITATIONS)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if refs.len() > MAX_LISTED_CITATIONS {
        listed.push_str(&format!(" +{} more", refs.len() - MAX_LISTED_CITATIONS));
    }
    listed
}

pub fn element_row(item: &WeightedElement<'_>, ledger: &EvidenceLedger) -> ElementRow {
    let uid = &item.element.uid;
    let status = ElementStatus::from_evidence(
        ledger.has_kind(uid, &ArtifactKind::Sql),
        ledger.has_kind(uid, &ArtifactKind::Test),
    );
    ElementRow {
        uid: uid.clone(),
        weight: item.weight,
        source: item.source.to_string(),
        status,
        citations: format_citations(ledger, uid),
        deduction: status.deduction(item.weight),
    }
}
