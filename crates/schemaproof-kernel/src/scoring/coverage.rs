//! Schema Coverage Score.

use schemaproof_ledger::{ArtifactKind, EvidenceLedger};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{CategoryScore, WeightedElement};

/// Fixed blend weights; only categories with a nonzero total take part.
pub const SCS_BLEND_SQL: f64 = 0.4;
pub const SCS_BLEND_TYPES: f64 = 0.2;
pub const SCS_BLEND_VALIDATION: f64 = 0.2;
pub const SCS_BLEND_TESTS: f64 = 0.2;

/// Artifact kinds scored by SCS, in blend order.
pub fn coverage_kinds() -> [ArtifactKind; 4] {
    [
        ArtifactKind::Sql,
        ArtifactKind::Types,
        ArtifactKind::Validation,
        ArtifactKind::Test,
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScsBreakdown {
    pub score: f64,
    pub sql: CategoryScore,
    pub types: CategoryScore,
    pub validation: CategoryScore,
    pub tests: CategoryScore,
    /// Weighted completion: weight whose element has every required kind.
    pub rollup: CategoryScore,
    pub enabled: Vec<ArtifactKind>,
    pub required_kinds: Vec<ArtifactKind>,
}

fn category(
    elements: &[WeightedElement<'_>],
    ledger: &EvidenceLedger,
    kind: &ArtifactKind,
    enabled: &BTreeSet<ArtifactKind>,
) -> CategoryScore {
    if !enabled.contains(kind) {
        return CategoryScore::empty();
    }
    let (earned, total) = elements.iter().fold((0u64, 0u64), |(earned, total), item| {
        let weight = u64::from(item.weight);
        if ledger.has_kind(&item.element.uid, kind) {
            (earned + weight, total + weight)
        } else {
            (earned, total + weight)
        }
    });
    CategoryScore::new(earned, total)
}

pub fn rollup(
    elements: &[WeightedElement<'_>],
    ledger: &EvidenceLedger,
    required: &[ArtifactKind],
) -> CategoryScore {
    let (earned, total) = elements.iter().fold((0u64, 0u64), |(earned, total), item| {
        let weight = u64::from(item.weight);
        if ledger.has_complete_artifacts(&item.element.uid, required) {
            (earned + weight, total + weight)
        } else {
            (earned, total + weight)
        }
    });
    CategoryScore::new(earned, total)
}

pub fn schema_coverage(
    elements: &[WeightedElement<'_>],
    ledger: &EvidenceLedger,
    enabled: &BTreeSet<ArtifactKind>,
    required: &[ArtifactKind],
) -> ScsBreakdown {
    let [sql_kind, types_kind, validation_kind, tests_kind] = coverage_kinds();
    let sql = category(elements, ledger, &sql_kind, enabled);
    let types = category(elements, ledger, &types_kind, enabled);
    let validation = category(elements, ledger, &validation_kind, enabled);
    let tests = category(elements, ledger, &tests_kind, enabled);

    let blend = [
        (&sql, SCS_BLEND_SQL),
        (&types, SCS_BLEND_TYPES),
        (&validation, SCS_BLEND_VALIDATION),
        (&tests, SCS_BLEND_TESTS),
    ];
    let (weighted, active_weight) = blend
        .iter()
        .filter(|(category, _)| category.total > 0)
        .fold((0.0, 0.0), |(weighted, active), (category, blend_weight)| {
            (weighted + category.score * blend_weight, active + blend_weight)
        });
    let score = if active_weight > 0.0 {
        weighted / active_weight
    } else {
        0.0
    };

    ScsBreakdown {
        score,
        rollup: rollup(elements, ledger, required),
        sql,
        types,
        validation,
        tests,
        enabled: coverage_kinds()
            .into_iter()
            .filter(|kind| enabled.contains(kind))
            .collect(),
        required_kinds: required.to_vec(),
    }
}
