//! Test Confidence Index.
//!
//! Fixed blend of four sub-scores. A sub-score with nothing to cover is 0
//! and still carries its blend weight.

use schemaproof_ledger::{ArtifactKind, EvidenceLedger};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CategoryScore, WeightedElement};
use crate::migration::MigrationStep;
use crate::schema::Field;

pub const TCI_BLEND_UNIT: f64 = 0.4;
pub const TCI_BLEND_RLS: f64 = 0.2;
pub const TCI_BLEND_INTEGRATION: f64 = 0.2;
pub const TCI_BLEND_E2E: f64 = 0.2;

/// Table directives that mark a table as row-level-security scoped.
pub const RLS_TAGS: [&str; 2] = ["rls", "tenant"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    Unique,
    Check,
    Default,
    Index,
}

impl ConstraintKind {
    pub const ALL: [ConstraintKind; 6] = [
        Self::PrimaryKey,
        Self::ForeignKey,
        Self::Unique,
        Self::Check,
        Self::Default,
        Self::Index,
    ];

    pub fn applies_to(self, field: &Field) -> bool {
        match self {
            Self::PrimaryKey => field.primary_key,
            Self::ForeignKey => field.has_foreign_key(),
            Self::Unique => field.unique,
            Self::Check => field.check.is_some(),
            Self::Default => field.has_default(),
            Self::Index => field.indexed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TciBreakdown {
    pub score: f64,
    pub unit: CategoryScore,
    pub rls: CategoryScore,
    pub integration: CategoryScore,
    pub e2e: CategoryScore,
    pub constraints: BTreeMap<ConstraintKind, CategoryScore>,
}

#[derive(Default)]
struct Tally {
    earned: u64,
    total: u64,
}

impl Tally {
    fn add(&mut self, weight: u64, covered: bool) {
        self.total += weight;
        if covered {
            self.earned += weight;
        }
    }

    fn finish(&self) -> CategoryScore {
        CategoryScore::new(self.earned, self.total)
    }
}

pub fn test_confidence(
    fields: &[WeightedElement<'_>],
    tables: &[WeightedElement<'_>],
    steps: &[MigrationStep],
    ledger: &EvidenceLedger,
) -> TciBreakdown {
    let mut unit = Tally::default();
    let mut integration = Tally::default();
    let mut per_constraint: BTreeMap<ConstraintKind, Tally> = ConstraintKind::ALL
        .into_iter()
        .map(|kind| (kind, Tally::default()))
        .collect();

    for item in fields {
        let Some(field) = item.element.field else {
            continue;
        };
        let weight = u64::from(item.weight);
        let unit_tested = ledger.has_kind(&item.element.uid, &ArtifactKind::Test);
        for kind in ConstraintKind::ALL {
            if kind.applies_to(field) {
                unit.add(weight, unit_tested);
                if let Some(tally) = per_constraint.get_mut(&kind) {
                    tally.add(weight, unit_tested);
                }
            }
        }
        if field.has_foreign_key() {
            integration.add(
                weight,
                ledger.has_kind(&item.element.uid, &ArtifactKind::IntegrationTest),
            );
        }
    }

    let mut rls = Tally::default();
    for item in tables {
        if RLS_TAGS.iter().any(|tag| item.element.table.has_tag(tag)) {
            rls.add(
                u64::from(item.weight),
                ledger.has_kind(&item.element.uid, &ArtifactKind::RlsTest),
            );
        }
    }

    let mut e2e = Tally::default();
    for step in steps {
        e2e.add(
            1,
            ledger.has_kind(&step.target_uid(), &ArtifactKind::MigrationTest),
        );
    }

    let unit = unit.finish();
    let rls = rls.finish();
    let integration = integration.finish();
    let e2e = e2e.finish();
    let score = unit.score * TCI_BLEND_UNIT
        + rls.score * TCI_BLEND_RLS
        + integration.score * TCI_BLEND_INTEGRATION
        + e2e.score * TCI_BLEND_E2E;

    TciBreakdown {
        score,
        unit,
        rls,
        integration,
        e2e,
        constraints: per_constraint
            .iter()
            .map(|(kind, tally)| (*kind, tally.finish()))
            .collect(),
    }
}
