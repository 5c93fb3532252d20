//! Scoring engine: SCS, MRI, TCI and the readiness gate.
//!
//! [`score`] is a pure function of its inputs. The report timestamp comes
//! from the caller (or the ledger), never from the clock.

pub mod confidence;
pub mod coverage;
pub mod readiness;
pub mod risk;

use chrono::{DateTime, Utc};
use schemaproof_ledger::{ArtifactKind, EvidenceLedger};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::digest::report_digest;
use crate::error::KernelError;
use crate::migration::MigrationStep;
use crate::schema::{SchemaElement, SchemaIr};
use crate::weights::{WeightConfig, WeightResolver, WeightSource};

pub use confidence::{ConstraintKind, TciBreakdown, test_confidence};
pub use coverage::{ScsBreakdown, rollup, schema_coverage};
pub use readiness::{Readiness, ReadinessGates, ReadinessThresholds, Verdict, evaluate_readiness};
pub use risk::{MriBreakdown, RiskCategory, StepRisk, assess_step, is_safe_cast, migration_risk};

pub const SCORE_REPORT_VERSION: u32 = 1;

/// Weighted ratio. A zero total scores 0 rather than dividing by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub score: f64,
    pub earned: u64,
    pub total: u64,
}

impl CategoryScore {
    pub fn new(earned: u64, total: u64) -> Self {
        let score = if total == 0 {
            0.0
        } else {
            earned as f64 / total as f64
        };
        Self {
            score,
            earned,
            total,
        }
    }

    pub fn empty() -> Self {
        Self::new(0, 0)
    }
}

/// A schema element with its resolved weight.
#[derive(Debug, Clone)]
pub struct WeightedElement<'a> {
    pub element: SchemaElement<'a>,
    pub weight: u32,
    pub source: WeightSource,
}

pub fn weigh<'a>(
    elements: impl IntoIterator<Item = SchemaElement<'a>>,
    resolver: &WeightResolver,
) -> Vec<WeightedElement<'a>> {
    elements
        .into_iter()
        .map(|element| {
            let resolved = resolver.resolve(&element.subject());
            WeightedElement {
                element,
                weight: resolved.weight,
                source: resolved.source,
            }
        })
        .collect()
}

pub fn default_required_kinds() -> Vec<ArtifactKind> {
    vec![ArtifactKind::Sql, ArtifactKind::Test]
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringOptions {
    /// Report timestamp; defaults to the ledger timestamp.
    pub timestamp: Option<DateTime<Utc>>,
    /// Artifact kinds the pipeline was asked to generate. `None` infers
    /// them from the ledger.
    pub targets: Option<BTreeSet<ArtifactKind>>,
    pub required_kinds: Vec<ArtifactKind>,
    pub thresholds: ReadinessThresholds,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        Self {
            timestamp: None,
            targets: None,
            required_kinds: default_required_kinds(),
            thresholds: ReadinessThresholds::default(),
        }
    }
}

impl ScoringOptions {
    /// Enabled SCS categories: explicit targets, else ledger kinds plus SQL.
    pub fn enabled_kinds(&self, ledger: &EvidenceLedger) -> BTreeSet<ArtifactKind> {
        match &self.targets {
            Some(targets) => targets.clone(),
            None => {
                let mut kinds = ledger.kinds_present();
                kinds.insert(ArtifactKind::Sql);
                kinds
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub scs: f64,
    pub mri: f64,
    pub tci: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub scs: ScsBreakdown,
    pub mri: MriBreakdown,
    pub tci: TciBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreMetadata {
    pub table_count: usize,
    pub element_count: usize,
    pub step_count: usize,
    pub citation_count: usize,
    pub total_weight: u64,
    pub weight_rules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub commit: String,
    pub scores: Scores,
    pub breakdown: ScoreBreakdown,
    pub readiness: Readiness,
    pub metadata: ScoreMetadata,
    pub digest: String,
}

pub fn score(
    schema: &SchemaIr,
    ledger: &EvidenceLedger,
    steps: &[MigrationStep],
    weights: &WeightConfig,
    options: &ScoringOptions,
) -> Result<ScoreReport, KernelError> {
    if schema.tables.is_empty() {
        return Err(KernelError::EmptySchema);
    }

    let resolver = WeightResolver::new(weights);
    let fields = weigh(schema.scored_fields(), &resolver);
    let tables = weigh(schema.tables.iter().map(SchemaElement::table), &resolver);

    let enabled = options.enabled_kinds(ledger);
    let scs = schema_coverage(&fields, ledger, &enabled, &options.required_kinds);
    let mri = migration_risk(steps);
    let tci = test_confidence(&fields, &tables, steps, ledger);
    let readiness = evaluate_readiness(scs.score, tci.score, mri.score, &options.thresholds);

    tracing::debug!(
        elements = fields.len(),
        steps = steps.len(),
        scs = scs.score,
        mri = mri.score,
        tci = tci.score,
        verdict = %readiness.verdict,
        "scored schema"
    );

    let mut report = ScoreReport {
        version: SCORE_REPORT_VERSION,
        timestamp: options.timestamp.unwrap_or_else(|| ledger.timestamp()),
        commit: ledger.commit().to_string(),
        scores: Scores {
            scs: scs.score,
            mri: mri.score,
            tci: tci.score,
        },
        metadata: ScoreMetadata {
            table_count: schema.tables.len(),
            element_count: fields.len(),
            step_count: steps.len(),
            citation_count: ledger.citation_count(),
            total_weight: fields.iter().map(|item| u64::from(item.weight)).sum(),
            weight_rules: resolver
                .rule_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        },
        breakdown: ScoreBreakdown { scs, mri, tci },
        readiness,
        digest: String::new(),
    };
    report.digest = report_digest(&report)?;
    Ok(report)
}
